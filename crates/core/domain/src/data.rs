use std::time::Duration;

/// SDI-12 数据响应中解析出的三个原始字段。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFields {
    pub vwc_raw: f64,
    pub temperature: f64,
    pub ec_raw: f64,
}

/// 一次采集 + 标定的结果，发布后即丢弃。
///
/// `valid == false` 的记录所有字段均为 0，不得发布。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub vwc_raw: f64,
    pub vwc_calibrated: f64,
    pub temperature: f64,
    pub ec_raw: f64,
    pub ec_simple: f64,
    pub ec_epsilon: f64,
    pub valid: bool,
    /// 采集开始时刻（相对进程启动）。
    pub timestamp: Duration,
}

impl Reading {
    /// 采集失败时的占位记录。
    pub fn invalid(timestamp: Duration) -> Self {
        Self {
            vwc_raw: 0.0,
            vwc_calibrated: 0.0,
            temperature: 0.0,
            ec_raw: 0.0,
            ec_simple: 0.0,
            ec_epsilon: 0.0,
            valid: false,
            timestamp,
        }
    }
}

/// 待发布的 MQTT 报文（可用性标记、发现配置等）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retain: bool,
}

impl OutboundMessage {
    pub fn retained(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retain: true,
        }
    }
}
