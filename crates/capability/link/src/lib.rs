//! # 连接生命周期能力模块
//!
//! - [`MqttTransport`]：传输接缝（rumqttc 实现与内存实现）
//! - [`LinkManager`]：连接状态机、固定退避重连、上线公告与发现报文

mod manager;
mod memory;
mod mqtt;
mod transport;

pub use manager::{LinkError, LinkManager, LinkTiming};
pub use memory::MemoryTransport;
pub use mqtt::RumqttcTransport;
pub use transport::{MqttTransport, SessionOptions, TransportError};
