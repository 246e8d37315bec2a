//! 节点装配模块
//!
//! 把配置映射为各能力模块的参数，组装 采集器 → 连接管理器 → 发布驱动，
//! 运行到退出标记置位后发布离线标记并断开。

use domain::Clock;
use mqtt_contract::{DeviceInfo, TopicLayout};
use soil_config::AppConfig;
use soil_link::{LinkManager, LinkTiming, MqttTransport, SessionOptions};
use soil_publisher::{PublishTiming, Publisher};
use soil_sdi12::{Acquirer, AcquisitionTiming, SerialConfig, Sdi12Bus};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tracing::info;

pub fn topic_layout(config: &AppConfig) -> TopicLayout {
    TopicLayout::new(
        config.mqtt_topic_prefix.clone(),
        config.discovery_prefix.clone(),
        config.device_id.clone(),
    )
}

/// 客户端标识即设备标识。
pub fn session_options(config: &AppConfig) -> SessionOptions {
    SessionOptions::new(config.device_id.clone(), config.mqtt_host.clone(), config.mqtt_port)
        .with_keep_alive(Duration::from_secs(config.mqtt_keep_alive_seconds))
        .with_credentials(config.mqtt_username.clone(), config.mqtt_password.clone())
}

pub fn link_timing(config: &AppConfig) -> LinkTiming {
    LinkTiming {
        reconnect_backoff: Duration::from_millis(config.reconnect_backoff_ms),
        discovery_pause: Duration::from_millis(config.discovery_pause_ms),
    }
}

pub fn acquisition_timing(config: &AppConfig) -> AcquisitionTiming {
    AcquisitionTiming {
        measure_settle: Duration::from_millis(config.measure_delay_ms),
        data_settle: Duration::from_millis(config.data_delay_ms),
        ..AcquisitionTiming::default()
    }
}

pub fn publish_timing(config: &AppConfig) -> PublishTiming {
    PublishTiming {
        interval: Duration::from_millis(config.publish_interval_ms),
        loop_pause: Duration::from_millis(config.loop_pause_ms),
    }
}

pub fn serial_config(config: &AppConfig) -> SerialConfig {
    SerialConfig {
        baud_rate: config.serial_baud,
        ..SerialConfig::new(config.serial_port.clone())
    }
}

/// 组装并运行发布驱动，直到 `shutdown` 置位。
pub async fn run<B: Sdi12Bus, T: MqttTransport>(
    config: &AppConfig,
    bus: B,
    transport: T,
    clock: Arc<dyn Clock>,
    shutdown: &AtomicBool,
) -> Result<Publisher<B, T>, Box<dyn std::error::Error>> {
    let device = DeviceInfo::new(&config.device_id, config.device_name.clone());
    let link = LinkManager::new(
        transport,
        clock.clone(),
        topic_layout(config),
        &device,
        session_options(config),
        link_timing(config),
    )?;
    let acquirer = Acquirer::new(bus, clock.clone(), acquisition_timing(config));
    let mut publisher = Publisher::new(acquirer, link, clock, publish_timing(config));

    publisher.run(shutdown).await;
    publisher.shutdown().await?;
    info!(
        target: "soil.node",
        device_id = %config.device_id,
        readings_published = publisher.readings_published(),
        "node_stopped"
    );
    Ok(publisher)
}
