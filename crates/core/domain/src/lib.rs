pub mod clock;
pub mod data;

pub use clock::{Clock, ManualClock, SystemClock};
pub use data::{OutboundMessage, RawFields, Reading};

/// 连接生命周期状态：由连接管理器独占写入，发布驱动只读。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

impl LinkState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
        }
    }
}

impl Default for LinkState {
    fn default() -> Self {
        LinkState::Disconnected
    }
}
