use soil_telemetry::{
    MetricsSnapshot, TelemetryMetrics, init_tracing, metrics, record_acquisition,
    record_connect_attempt, record_reading_published,
};

#[test]
fn fresh_metrics_start_at_zero() {
    let metrics = TelemetryMetrics::new();
    assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
}

#[test]
fn record_functions_advance_global_counters() {
    let before = metrics().snapshot();
    record_connect_attempt();
    record_acquisition();
    record_reading_published();
    let after = metrics().snapshot();

    // 其他测试可能并发写入，只断言单调增长
    assert!(after.connect_attempts > before.connect_attempts);
    assert!(after.acquisitions > before.acquisitions);
    assert!(after.readings_published > before.readings_published);
}

#[test]
fn init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}
