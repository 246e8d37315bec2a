//! 追踪初始化与进程级计数指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 计数指标快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connect_attempts: u64,
    pub connect_failures: u64,
    pub discovery_published: u64,
    pub connection_lost: u64,
    pub acquisitions: u64,
    pub acquisition_failures: u64,
    pub readings_published: u64,
    pub publish_failures: u64,
}

/// 诊断计数（只写，不参与控制流）。
pub struct TelemetryMetrics {
    connect_attempts: AtomicU64,
    connect_failures: AtomicU64,
    discovery_published: AtomicU64,
    connection_lost: AtomicU64,
    acquisitions: AtomicU64,
    acquisition_failures: AtomicU64,
    readings_published: AtomicU64,
    publish_failures: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            connect_attempts: AtomicU64::new(0),
            connect_failures: AtomicU64::new(0),
            discovery_published: AtomicU64::new(0),
            connection_lost: AtomicU64::new(0),
            acquisitions: AtomicU64::new(0),
            acquisition_failures: AtomicU64::new(0),
            readings_published: AtomicU64::new(0),
            publish_failures: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            discovery_published: self.discovery_published.load(Ordering::Relaxed),
            connection_lost: self.connection_lost.load(Ordering::Relaxed),
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            acquisition_failures: self.acquisition_failures.load(Ordering::Relaxed),
            readings_published: self.readings_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info，可通过 `RUST_LOG` 覆盖）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 记录 broker 连接尝试次数。
pub fn record_connect_attempt() {
    metrics().connect_attempts.fetch_add(1, Ordering::Relaxed);
}

/// 记录连接失败次数（含上线公告失败）。
pub fn record_connect_failure() {
    metrics().connect_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录发现报文发布次数。
pub fn record_discovery_published() {
    metrics()
        .discovery_published
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录已建立连接被动断开的次数。
pub fn record_connection_lost() {
    metrics().connection_lost.fetch_add(1, Ordering::Relaxed);
}

/// 记录采集周期次数。
pub fn record_acquisition() {
    metrics().acquisitions.fetch_add(1, Ordering::Relaxed);
}

/// 记录采集失败次数（总线错误或响应无效）。
pub fn record_acquisition_failure() {
    metrics()
        .acquisition_failures
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录状态报文发布成功次数。
pub fn record_reading_published() {
    metrics()
        .readings_published
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录状态报文发布失败次数。
pub fn record_publish_failure() {
    metrics().publish_failures.fetch_add(1, Ordering::Relaxed);
}
