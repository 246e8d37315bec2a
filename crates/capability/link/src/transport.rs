use async_trait::async_trait;
use domain::OutboundMessage;
use std::time::Duration;

/// 传输层错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connect error: {0}")]
    Connect(String),
    #[error("publish error: {0}")]
    Publish(String),
    #[error("disconnect error: {0}")]
    Disconnect(String),
    #[error("not connected")]
    NotConnected,
}

/// 单次连接会话参数。
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub client_id: String,
    pub host: String,
    pub port: u16,
    pub keep_alive: Duration,
    pub credentials: Option<(String, String)>,
    /// 遗嘱消息（broker 在连接异常断开时代为发布）。
    pub last_will: Option<OutboundMessage>,
    /// 等待 ConnAck 的上限。
    pub connect_timeout: Duration,
}

impl SessionOptions {
    pub fn new(client_id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            client_id: client_id.into(),
            host: host.into(),
            port,
            keep_alive: Duration::from_secs(30),
            credentials: None,
            last_will: None,
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// 用户名与密码同时存在时才启用认证。
    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.credentials = match (username, password) {
            (Some(username), Some(password)) => Some((username, password)),
            _ => None,
        };
        self
    }
}

/// MQTT 传输抽象。
///
/// 实现方只负责单个会话；重连节奏、上线公告由 [`crate::LinkManager`] 驱动。
#[async_trait]
pub trait MqttTransport: Send {
    /// 建立新会话，成功表示 broker 已确认连接。
    async fn connect(&mut self, options: &SessionOptions) -> Result<(), TransportError>;

    /// 发布一条报文（QoS 1）。
    async fn publish(&mut self, message: &OutboundMessage) -> Result<(), TransportError>;

    /// 后台维护：心跳、确认包；检测到断线后 `is_connected` 返回 false。
    async fn service(&mut self);

    fn is_connected(&self) -> bool;

    /// 主动断开。
    async fn disconnect(&mut self) -> Result<(), TransportError>;
}
