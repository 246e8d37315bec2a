//! 内存传输：记录所有发布，可编排连接/发布失败与断线。

use crate::transport::{MqttTransport, SessionOptions, TransportError};
use async_trait::async_trait;
use domain::OutboundMessage;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct MemoryState {
    connected: bool,
    connect_attempts: u64,
    disconnects: u64,
    failing_connects: u32,
    failing_publishes: u32,
    drop_on_service: bool,
    last_will: Option<OutboundMessage>,
    published: Vec<OutboundMessage>,
}

/// 内存传输。克隆共享同一份状态，便于移交给连接管理器后继续观察。
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// 接下来 `count` 次连接失败。
    pub fn fail_next_connects(&self, count: u32) {
        self.with_state(|state| state.failing_connects = count);
    }

    /// 接下来 `count` 次发布失败（连接保持）。
    pub fn fail_next_publishes(&self, count: u32) {
        self.with_state(|state| state.failing_publishes = count);
    }

    /// 下一次 `service` 时模拟断线。
    pub fn drop_connection(&self) {
        self.with_state(|state| state.drop_on_service = true);
    }

    pub fn connect_attempts(&self) -> u64 {
        self.with_state(|state| state.connect_attempts)
    }

    pub fn disconnects(&self) -> u64 {
        self.with_state(|state| state.disconnects)
    }

    pub fn last_will(&self) -> Option<OutboundMessage> {
        self.with_state(|state| state.last_will.clone())
    }

    /// 已成功发布的报文（按顺序）。
    pub fn published(&self) -> Vec<OutboundMessage> {
        self.with_state(|state| state.published.clone())
    }

    /// 发往指定 topic 的报文。
    pub fn published_to(&self, topic: &str) -> Vec<OutboundMessage> {
        self.with_state(|state| {
            state
                .published
                .iter()
                .filter(|message| message.topic == topic)
                .cloned()
                .collect()
        })
    }

    pub fn clear_published(&self) {
        self.with_state(|state| state.published.clear());
    }
}

#[async_trait]
impl MqttTransport for MemoryTransport {
    async fn connect(&mut self, options: &SessionOptions) -> Result<(), TransportError> {
        self.with_state(|state| {
            state.connect_attempts += 1;
            state.connected = false;
            if state.failing_connects > 0 {
                state.failing_connects -= 1;
                return Err(TransportError::Connect("connection refused".to_string()));
            }
            state.connected = true;
            state.last_will = options.last_will.clone();
            Ok(())
        })
    }

    async fn publish(&mut self, message: &OutboundMessage) -> Result<(), TransportError> {
        self.with_state(|state| {
            if !state.connected {
                return Err(TransportError::NotConnected);
            }
            if state.failing_publishes > 0 {
                state.failing_publishes -= 1;
                return Err(TransportError::Publish("publish rejected".to_string()));
            }
            state.published.push(message.clone());
            Ok(())
        })
    }

    async fn service(&mut self) {
        self.with_state(|state| {
            if state.drop_on_service {
                state.drop_on_service = false;
                state.connected = false;
            }
        });
    }

    fn is_connected(&self) -> bool {
        self.with_state(|state| state.connected)
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.with_state(|state| {
            if state.connected {
                state.connected = false;
                state.disconnects += 1;
            }
        });
        Ok(())
    }
}
