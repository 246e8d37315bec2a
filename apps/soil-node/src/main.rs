//! SDI-12 土壤传感器 → MQTT 节点。

mod network;
mod node;

use domain::{Clock, SystemClock};
use soil_config::AppConfig;
use soil_link::{MemoryTransport, RumqttcTransport};
use soil_sdi12::{ScriptedBus, SerialSdi12Bus};
use soil_telemetry::{init_tracing, metrics};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();
    info!(
        target: "soil.node",
        device_id = %config.device_id,
        mqtt_host = %config.mqtt_host,
        mqtt_port = config.mqtt_port,
        serial_port = %config.serial_port,
        dry_run = config.dry_run,
        "node_starting"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    // Ctrl-C 只置位标记，控制循环在两轮之间检查
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!(target: "soil.node", "shutdown_requested");
                flag.store(true, Ordering::SeqCst);
            }
            Err(err) => warn!(target: "soil.node", error = %err, "signal_listener_failed"),
        }
    });

    if config.dry_run {
        // 无硬件、无 broker：脚本化总线 + 内存传输
        node::run(
            &config,
            ScriptedBus::demo(),
            MemoryTransport::new(),
            clock,
            &shutdown,
        )
        .await?;
    } else {
        network::wait_for_network(
            &config.mqtt_host,
            config.mqtt_port,
            Duration::from_millis(config.network_retry_ms),
            clock.as_ref(),
        )
        .await;
        let bus = SerialSdi12Bus::open(&node::serial_config(&config))?;
        node::run(&config, bus, RumqttcTransport::new(), clock, &shutdown).await?;
    }

    let snapshot = metrics().snapshot();
    info!(
        target: "soil.node",
        connect_attempts = snapshot.connect_attempts,
        connect_failures = snapshot.connect_failures,
        acquisitions = snapshot.acquisitions,
        acquisition_failures = snapshot.acquisition_failures,
        readings_published = snapshot.readings_published,
        publish_failures = snapshot.publish_failures,
        "node_exited"
    );
    Ok(())
}
