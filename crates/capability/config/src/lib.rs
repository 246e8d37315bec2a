//! 节点运行配置加载（`SOIL_*` 环境变量）。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 节点运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub device_id: String,
    pub device_name: String,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_keep_alive_seconds: u64,
    pub mqtt_topic_prefix: String,
    pub discovery_prefix: String,
    pub serial_port: String,
    pub serial_baud: u32,
    pub publish_interval_ms: u64,
    pub reconnect_backoff_ms: u64,
    pub measure_delay_ms: u64,
    pub data_delay_ms: u64,
    pub discovery_pause_ms: u64,
    pub loop_pause_ms: u64,
    pub network_retry_ms: u64,
    /// 使用脚本化总线与内存传输，不访问硬件与 broker。
    pub dry_run: bool,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let device_id = read_string_with_default("SOIL_DEVICE_ID", "soilnode-01")?;
        let device_name = read_string_with_default("SOIL_DEVICE_NAME", "Soil Sensor")?;
        let mqtt_host = read_string_with_default("SOIL_MQTT_HOST", "127.0.0.1")?;
        let mqtt_port = read_u16_with_default("SOIL_MQTT_PORT", 1883)?;
        let mqtt_username = read_optional("SOIL_MQTT_USERNAME");
        let mqtt_password = read_optional("SOIL_MQTT_PASSWORD");
        if mqtt_username.is_some() && mqtt_password.is_none() {
            return Err(ConfigError::Missing("SOIL_MQTT_PASSWORD".to_string()));
        }
        let mqtt_keep_alive_seconds = read_nonzero_u64_with_default("SOIL_MQTT_KEEP_ALIVE_SECONDS", 30)?;
        let mqtt_topic_prefix = read_string_with_default("SOIL_MQTT_TOPIC_PREFIX", "soilnode")?;
        let discovery_prefix = read_string_with_default("SOIL_DISCOVERY_PREFIX", "homeassistant")?;
        let serial_port = read_string_with_default("SOIL_SERIAL_PORT", "/dev/ttyUSB0")?;
        let serial_baud = read_u32_with_default("SOIL_SERIAL_BAUD", 1200)?;
        let publish_interval_ms = read_nonzero_u64_with_default("SOIL_PUBLISH_INTERVAL_MS", 10_000)?;
        let reconnect_backoff_ms = read_nonzero_u64_with_default("SOIL_RECONNECT_BACKOFF_MS", 5_000)?;
        let measure_delay_ms = read_u64_with_default("SOIL_MEASURE_DELAY_MS", 1_000)?;
        let data_delay_ms = read_u64_with_default("SOIL_DATA_DELAY_MS", 1_000)?;
        let discovery_pause_ms = read_u64_with_default("SOIL_DISCOVERY_PAUSE_MS", 100)?;
        let loop_pause_ms = read_nonzero_u64_with_default("SOIL_LOOP_PAUSE_MS", 100)?;
        let network_retry_ms = read_nonzero_u64_with_default("SOIL_NETWORK_RETRY_MS", 500)?;
        let dry_run = read_bool_with_default("SOIL_DRY_RUN", false);

        Ok(Self {
            device_id,
            device_name,
            mqtt_host,
            mqtt_port,
            mqtt_username,
            mqtt_password,
            mqtt_keep_alive_seconds,
            mqtt_topic_prefix,
            discovery_prefix,
            serial_port,
            serial_baud,
            publish_interval_ms,
            reconnect_backoff_ms,
            measure_delay_ms,
            data_delay_ms,
            discovery_pause_ms,
            loop_pause_ms,
            network_retry_ms,
            dry_run,
        })
    }
}

/// 读取字符串；设置为空串视为非法。
fn read_string_with_default(key: &str, default: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::Invalid(key.to_string(), value)),
        Ok(value) => Ok(value),
        Err(_) => Ok(default.to_string()),
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u32_with_default(key: &str, default: u32) -> Result<u32, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u32>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

/// 间隔类配置：0 会让循环空转，视为非法。
fn read_nonzero_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = read_u64_with_default(key, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid(key.to_string(), value.to_string()));
    }
    Ok(value)
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
