use domain::{LinkState, ManualClock, OutboundMessage, Reading};
use mqtt_contract::{DeviceInfo, TopicLayout};
use soil_link::{LinkError, LinkManager, LinkTiming, MemoryTransport, SessionOptions, TransportError};
use std::sync::Arc;
use std::time::Duration;

const AVAILABILITY: &str = "soilnode/bed-3/availability";

fn manager() -> (LinkManager<MemoryTransport>, MemoryTransport, Arc<ManualClock>) {
    let transport = MemoryTransport::new();
    let clock = Arc::new(ManualClock::new());
    let layout = TopicLayout::new("soilnode", "homeassistant", "bed-3");
    let device = DeviceInfo::new("bed-3", "Greenhouse Bed 3");
    let session = SessionOptions::new("bed-3", "broker.local", 1883);
    let manager = LinkManager::new(
        transport.clone(),
        clock.clone(),
        layout,
        &device,
        session,
        LinkTiming::default(),
    )
    .expect("link manager");
    (manager, transport, clock)
}

fn sample_reading() -> Reading {
    Reading {
        vwc_raw: 1975.3,
        vwc_calibrated: 17.2,
        temperature: 22.4,
        ec_raw: 412.0,
        ec_simple: 0.824,
        ec_epsilon: 3.5,
        valid: true,
        timestamp: Duration::from_secs(10),
    }
}

fn discovery_topics(messages: &[OutboundMessage]) -> Vec<&str> {
    messages
        .iter()
        .filter(|message| message.topic.ends_with("/config"))
        .map(|message| message.topic.as_str())
        .collect()
}

#[tokio::test]
async fn starts_disconnected() {
    let (manager, transport, _clock) = manager();
    assert_eq!(manager.state(), LinkState::Disconnected);
    assert_eq!(transport.connect_attempts(), 0);
}

#[tokio::test]
async fn announces_online_then_discovery() {
    let (mut manager, transport, clock) = manager();

    let attempts = manager.ensure_connected().await;

    assert_eq!(attempts, 1);
    assert_eq!(manager.state(), LinkState::Connected);
    let published = transport.published();
    assert_eq!(published.len(), 7);
    assert_eq!(published[0].topic, AVAILABILITY);
    assert_eq!(published[0].payload, b"online");
    assert!(published[0].retain);
    assert_eq!(discovery_topics(&published).len(), 6);
    assert!(published[1..].iter().all(|message| message.retain));
    assert_eq!(
        published[1].topic,
        "homeassistant/sensor/bed-3/vwc_raw/config"
    );
    // 每条发现报文前停顿 100ms
    assert_eq!(clock.total_slept(), Duration::from_millis(600));
}

#[tokio::test]
async fn last_will_marks_device_offline() {
    let (mut manager, transport, _clock) = manager();
    manager.ensure_connected().await;

    let will = transport.last_will().expect("last will");
    assert_eq!(will.topic, AVAILABILITY);
    assert_eq!(will.payload, b"offline");
    assert!(will.retain);
}

#[tokio::test]
async fn connect_failures_retry_with_fixed_backoff() {
    let (mut manager, transport, clock) = manager();
    transport.fail_next_connects(3);

    let attempts = manager.ensure_connected().await;

    assert_eq!(attempts, 4);
    assert_eq!(transport.connect_attempts(), 4);
    assert_eq!(manager.state(), LinkState::Connected);
    // 3 次退避 + 6 次发现停顿
    assert_eq!(clock.total_slept(), Duration::from_millis(3 * 5000 + 600));
    assert_eq!(manager.last_attempt(), Some(Duration::from_millis(15_000)));
}

#[tokio::test]
async fn single_failed_attempt_returns_to_disconnected() {
    let (mut manager, transport, _clock) = manager();
    transport.fail_next_connects(1);

    let result = manager.try_connect().await;

    assert!(matches!(
        result,
        Err(LinkError::Transport(TransportError::Connect(_)))
    ));
    assert_eq!(manager.state(), LinkState::Disconnected);
    assert!(transport.published().is_empty());
}

#[tokio::test]
async fn rediscovery_is_byte_identical() {
    let (mut manager, transport, _clock) = manager();
    manager.ensure_connected().await;
    let first = transport.published();

    transport.drop_connection();
    manager.service().await;
    assert_eq!(manager.state(), LinkState::Disconnected);

    transport.clear_published();
    manager.ensure_connected().await;
    let second = transport.published();

    assert_eq!(first, second);
    assert_eq!(transport.connect_attempts(), 2);
}

#[tokio::test]
async fn announcement_failure_forces_reconnect() {
    let (mut manager, transport, _clock) = manager();
    // 第一次会话中 online 发布失败
    transport.fail_next_publishes(1);

    let attempts = manager.ensure_connected().await;

    assert_eq!(attempts, 2);
    assert_eq!(transport.disconnects(), 1);
    let published = transport.published();
    assert_eq!(published.len(), 7);
    assert_eq!(published[0].payload, b"online");
}

#[tokio::test]
async fn state_publish_uses_retained_state_topic() {
    let (mut manager, transport, _clock) = manager();
    manager.ensure_connected().await;
    transport.clear_published();

    manager
        .publish_state(&sample_reading())
        .await
        .expect("state published");

    let published = transport.published_to("soilnode/bed-3/state");
    assert_eq!(published.len(), 1);
    assert!(published[0].retain);
    let value: serde_json::Value =
        serde_json::from_slice(&published[0].payload).expect("json payload");
    assert_eq!(value["temperature"], 22.4);
}

#[tokio::test]
async fn invalid_reading_is_never_published() {
    let (mut manager, transport, _clock) = manager();
    manager.ensure_connected().await;
    transport.clear_published();

    let result = manager.publish_state(&Reading::invalid(Duration::ZERO)).await;

    assert!(matches!(result, Err(LinkError::Contract(_))));
    assert!(transport.published().is_empty());
}

#[tokio::test]
async fn publish_while_disconnected_is_rejected() {
    let (mut manager, _transport, _clock) = manager();

    let result = manager.publish_state(&sample_reading()).await;

    assert!(matches!(
        result,
        Err(LinkError::Transport(TransportError::NotConnected))
    ));
}

#[tokio::test]
async fn shutdown_publishes_offline_and_disconnects() {
    let (mut manager, transport, _clock) = manager();
    manager.ensure_connected().await;
    transport.clear_published();

    manager.shutdown().await.expect("shutdown");

    let published = transport.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].topic, AVAILABILITY);
    assert_eq!(published[0].payload, b"offline");
    assert!(published[0].retain);
    assert_eq!(transport.disconnects(), 1);
    assert_eq!(manager.state(), LinkState::Disconnected);
}
