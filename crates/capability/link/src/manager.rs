use crate::transport::{MqttTransport, SessionOptions, TransportError};
use domain::{Clock, LinkState, OutboundMessage, Reading};
use mqtt_contract::{
    ContractError, DeviceInfo, PAYLOAD_AVAILABLE, PAYLOAD_NOT_AVAILABLE, TopicLayout,
    discovery_messages, encode_state,
};
use soil_telemetry::{
    record_connect_attempt, record_connect_failure, record_connection_lost,
    record_discovery_published,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 连接链路错误。
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Contract(#[from] ContractError),
}

/// 重连与发现报文节奏。
#[derive(Debug, Clone)]
pub struct LinkTiming {
    /// 连接失败后的固定退避（不递增、不设上限）。
    pub reconnect_backoff: Duration,
    /// 发现报文之间的停顿。
    pub discovery_pause: Duration,
}

impl Default for LinkTiming {
    fn default() -> Self {
        Self {
            reconnect_backoff: Duration::from_millis(5000),
            discovery_pause: Duration::from_millis(100),
        }
    }
}

/// 连接生命周期管理器。
///
/// 状态流转：`Disconnected → Connecting → Connected`，连接或上线公告失败回到
/// `Disconnected`；传输层报告断线时 `Connected → Disconnected`。
/// 每次进入 `Connected` 之前都会完整发布一遍可用性标记与发现报文。
pub struct LinkManager<T> {
    transport: T,
    clock: Arc<dyn Clock>,
    layout: TopicLayout,
    session: SessionOptions,
    timing: LinkTiming,
    discovery: Vec<OutboundMessage>,
    state: LinkState,
    last_attempt: Option<Duration>,
}

impl<T: MqttTransport> LinkManager<T> {
    /// 发现报文在构造时一次性编码，之后每次重连原样重发。
    pub fn new(
        transport: T,
        clock: Arc<dyn Clock>,
        layout: TopicLayout,
        device: &DeviceInfo,
        mut session: SessionOptions,
        timing: LinkTiming,
    ) -> Result<Self, ContractError> {
        let discovery = discovery_messages(&layout, device)?;
        session.last_will = Some(OutboundMessage::retained(
            layout.availability_topic(),
            PAYLOAD_NOT_AVAILABLE,
        ));
        Ok(Self {
            transport,
            clock,
            layout,
            session,
            timing,
            discovery,
            state: LinkState::Disconnected,
            last_attempt: None,
        })
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// 最近一次连接尝试的时刻。
    pub fn last_attempt(&self) -> Option<Duration> {
        self.last_attempt
    }

    /// 阻塞直到进入 `Connected`，返回本次调用发起的连接尝试次数。
    pub async fn ensure_connected(&mut self) -> u64 {
        self.check_liveness();
        let mut attempts = 0;
        while self.state != LinkState::Connected {
            attempts += 1;
            if self.try_connect().await.is_err() {
                self.clock.sleep(self.timing.reconnect_backoff).await;
            }
        }
        attempts
    }

    /// 单次连接尝试（不含退避）。
    pub async fn try_connect(&mut self) -> Result<(), LinkError> {
        self.state = LinkState::Connecting;
        self.last_attempt = Some(self.clock.elapsed());
        record_connect_attempt();
        info!(
            target: "soil.link",
            host = %self.session.host,
            port = self.session.port,
            client_id = %self.session.client_id,
            "connect_attempt"
        );

        if let Err(err) = self.transport.connect(&self.session).await {
            self.state = LinkState::Disconnected;
            record_connect_failure();
            warn!(
                target: "soil.link",
                error = %err,
                backoff_ms = self.timing.reconnect_backoff.as_millis() as u64,
                "connect_failed"
            );
            return Err(err.into());
        }

        if let Err(err) = self.announce().await {
            self.state = LinkState::Disconnected;
            record_connect_failure();
            warn!(target: "soil.link", error = %err, "announce_failed");
            if let Err(err) = self.transport.disconnect().await {
                warn!(target: "soil.link", error = %err, "disconnect_failed");
            }
            return Err(err.into());
        }

        self.state = LinkState::Connected;
        info!(
            target: "soil.link",
            availability_topic = %self.layout.availability_topic(),
            discovery_count = self.discovery.len(),
            "connected"
        );
        Ok(())
    }

    /// 上线公告：可用性标记，随后逐条发布发现报文。
    async fn announce(&mut self) -> Result<(), TransportError> {
        let online = OutboundMessage::retained(self.layout.availability_topic(), PAYLOAD_AVAILABLE);
        self.transport.publish(&online).await?;
        for message in &self.discovery {
            self.clock.sleep(self.timing.discovery_pause).await;
            self.transport.publish(message).await?;
            record_discovery_published();
        }
        Ok(())
    }

    /// 驱动传输层后台维护并同步断线状态。
    pub async fn service(&mut self) {
        if self.state != LinkState::Connected {
            return;
        }
        self.transport.service().await;
        self.check_liveness();
    }

    /// 以保留消息发布一条状态报文。
    pub async fn publish_state(&mut self, reading: &Reading) -> Result<(), LinkError> {
        let payload = encode_state(reading)?;
        if self.state != LinkState::Connected {
            return Err(TransportError::NotConnected.into());
        }
        let message = OutboundMessage::retained(self.layout.state_topic(), payload);
        let result = self.transport.publish(&message).await;
        if result.is_err() {
            self.check_liveness();
        }
        Ok(result?)
    }

    /// 正常退出：发布保留的离线标记并断开。
    pub async fn shutdown(&mut self) -> Result<(), LinkError> {
        if self.state == LinkState::Connected && self.transport.is_connected() {
            let offline =
                OutboundMessage::retained(self.layout.availability_topic(), PAYLOAD_NOT_AVAILABLE);
            if let Err(err) = self.transport.publish(&offline).await {
                warn!(target: "soil.link", error = %err, "offline_publish_failed");
            }
        }
        self.state = LinkState::Disconnected;
        self.transport.disconnect().await?;
        info!(target: "soil.link", "link_shutdown");
        Ok(())
    }

    fn check_liveness(&mut self) {
        if self.state == LinkState::Connected && !self.transport.is_connected() {
            self.state = LinkState::Disconnected;
            record_connection_lost();
            warn!(target: "soil.link", "connection_lost");
        }
    }
}
