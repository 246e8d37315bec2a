//! 稳定的 MQTT 报文契约：topic 布局、发现报文与状态报文。

pub mod discovery;
pub mod state;
pub mod topics;

pub use discovery::{
    DESCRIPTORS, DeviceInfo, DiscoveryDescriptor, discovery_messages, discovery_payload,
    value_template,
};
pub use state::{STATE_KEYS, encode_state};
pub use topics::TopicLayout;

/// 可用性 topic 上线标记。
pub const PAYLOAD_AVAILABLE: &str = "online";
/// 可用性 topic 离线标记（遗嘱消息与正常退出共用）。
pub const PAYLOAD_NOT_AVAILABLE: &str = "offline";

/// 报文编码错误。
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("reading is not valid")]
    InvalidReading,
    #[error("non-finite value for {0}")]
    NonFinite(&'static str),
    #[error("encode error: {0}")]
    Encode(String),
}
