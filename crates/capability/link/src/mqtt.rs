//! 基于 rumqttc 的 MQTT 传输。
//!
//! 每次连接新建 `AsyncClient`/`EventLoop`；事件循环不单独起任务，
//! 由 `connect`、`publish`、`service` 在控制循环内按需驱动。

use crate::transport::{MqttTransport, SessionOptions, TransportError};
use async_trait::async_trait;
use domain::OutboundMessage;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, LastWill, MqttOptions, Outgoing, Packet,
    QoS,
};
use std::time::Duration;
use tracing::{debug, warn};

/// 请求通道容量。
const REQUEST_CAPACITY: usize = 10;
/// 单次 `service` 的空闲轮询窗口。
const SERVICE_POLL: Duration = Duration::from_millis(10);
/// 单次 `service` 最多处理的事件数。
const SERVICE_MAX_EVENTS: usize = 32;
/// 发布确认与断开的等待上限。
const OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

struct Session {
    client: AsyncClient,
    eventloop: EventLoop,
}

/// rumqttc 传输实现。
#[derive(Default)]
pub struct RumqttcTransport {
    session: Option<Session>,
}

impl RumqttcTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

fn mqtt_options(options: &SessionOptions) -> MqttOptions {
    let mut mqtt = MqttOptions::new(options.client_id.clone(), options.host.clone(), options.port);
    mqtt.set_keep_alive(options.keep_alive);
    mqtt.set_clean_session(true);
    if let Some((username, password)) = &options.credentials {
        mqtt.set_credentials(username.clone(), password.clone());
    }
    if let Some(will) = &options.last_will {
        mqtt.set_last_will(LastWill::new(
            will.topic.clone(),
            will.payload.clone(),
            QoS::AtLeastOnce,
            will.retain,
        ));
    }
    mqtt
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<(), TransportError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                return if ack.code == ConnectReturnCode::Success {
                    Ok(())
                } else {
                    Err(TransportError::Connect(format!("connection refused: {:?}", ack.code)))
                };
            }
            Ok(_) => {}
            Err(err) => return Err(TransportError::Connect(err.to_string())),
        }
    }
}

async fn wait_for_outgoing_publish(eventloop: &mut EventLoop) -> Result<(), TransportError> {
    loop {
        match eventloop.poll().await {
            Ok(Event::Outgoing(Outgoing::Publish(_))) => return Ok(()),
            Ok(_) => {}
            Err(err) => return Err(TransportError::Publish(err.to_string())),
        }
    }
}

#[async_trait]
impl MqttTransport for RumqttcTransport {
    async fn connect(&mut self, options: &SessionOptions) -> Result<(), TransportError> {
        self.session = None;
        let (client, mut eventloop) = AsyncClient::new(mqtt_options(options), REQUEST_CAPACITY);
        match tokio::time::timeout(options.connect_timeout, wait_for_connack(&mut eventloop)).await
        {
            Ok(Ok(())) => {
                debug!(
                    target: "soil.link",
                    host = %options.host,
                    port = options.port,
                    client_id = %options.client_id,
                    "mqtt_connack_received"
                );
                self.session = Some(Session { client, eventloop });
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(TransportError::Connect(format!(
                "no connack within {}ms",
                options.connect_timeout.as_millis()
            ))),
        }
    }

    async fn publish(&mut self, message: &OutboundMessage) -> Result<(), TransportError> {
        let session = self.session.as_mut().ok_or(TransportError::NotConnected)?;
        let queued = session
            .client
            .publish(
                message.topic.clone(),
                QoS::AtLeastOnce,
                message.retain,
                message.payload.clone(),
            )
            .await
            .map_err(|err| TransportError::Publish(err.to_string()));
        let result = match queued {
            Ok(()) => tokio::time::timeout(
                OPERATION_TIMEOUT,
                wait_for_outgoing_publish(&mut session.eventloop),
            )
            .await
            .unwrap_or_else(|_| Err(TransportError::Publish("publish not flushed".to_string()))),
            Err(err) => Err(err),
        };
        if result.is_err() {
            self.session = None;
        }
        result
    }

    async fn service(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let mut lost = false;
        for _ in 0..SERVICE_MAX_EVENTS {
            match tokio::time::timeout(SERVICE_POLL, session.eventloop.poll()).await {
                Err(_) => break,
                Ok(Ok(_)) => {}
                Ok(Err(err)) => {
                    warn!(target: "soil.link", error = %err, "mqtt_eventloop_error");
                    lost = true;
                    break;
                }
            }
        }
        if lost {
            self.session = None;
        }
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        session
            .client
            .disconnect()
            .await
            .map_err(|err| TransportError::Disconnect(err.to_string()))?;
        let flushed = tokio::time::timeout(OPERATION_TIMEOUT, async {
            loop {
                match session.eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        })
        .await;
        if flushed.is_err() {
            return Err(TransportError::Disconnect("disconnect not flushed".to_string()));
        }
        Ok(())
    }
}
