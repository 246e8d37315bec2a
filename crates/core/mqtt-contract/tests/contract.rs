use domain::Reading;
use mqtt_contract::{
    ContractError, DESCRIPTORS, DeviceInfo, STATE_KEYS, TopicLayout, discovery_messages,
    encode_state,
};
use serde_json::Value;
use std::time::Duration;

fn layout() -> TopicLayout {
    TopicLayout::new("soilnode", "homeassistant", "bed-3")
}

fn sample_reading() -> Reading {
    Reading {
        vwc_raw: 123.4,
        vwc_calibrated: 0.0,
        temperature: 25.6,
        ec_raw: 789.0,
        ec_simple: 1.578,
        ec_epsilon: 1882.6921,
        valid: true,
        timestamp: Duration::from_secs(10),
    }
}

#[test]
fn topics_follow_layout() {
    let layout = layout();
    assert_eq!(layout.state_topic(), "soilnode/bed-3/state");
    assert_eq!(layout.availability_topic(), "soilnode/bed-3/availability");
    assert_eq!(
        layout.discovery_topic("temperature"),
        "homeassistant/sensor/bed-3/temperature/config"
    );
    assert_eq!(layout.unique_id("ec_raw"), "bed_3_ec_raw");
}

#[test]
fn state_payload_uses_two_decimals() {
    let payload = encode_state(&sample_reading()).expect("encode");
    assert_eq!(
        payload,
        r#"{"vwc_raw":123.40,"vwc_calibrated":0.00,"temperature":25.60,"ec_raw":789.00,"ec_simple":1.58,"ec_epsilon":1882.69}"#
    );
    let value: Value = serde_json::from_str(&payload).expect("json");
    let object = value.as_object().expect("object");
    assert_eq!(object.len(), STATE_KEYS.len());
    for key in STATE_KEYS {
        assert!(object.get(key).is_some_and(Value::is_number), "{key}");
    }
}

#[test]
fn invalid_reading_is_never_encoded() {
    let reading = Reading::invalid(Duration::from_secs(1));
    assert!(matches!(
        encode_state(&reading),
        Err(ContractError::InvalidReading)
    ));
}

#[test]
fn non_finite_value_is_rejected() {
    let reading = Reading {
        ec_epsilon: f64::INFINITY,
        ..sample_reading()
    };
    assert!(matches!(
        encode_state(&reading),
        Err(ContractError::NonFinite("ec_epsilon"))
    ));
}

#[test]
fn descriptors_match_state_keys() {
    let keys: Vec<&str> = DESCRIPTORS.iter().map(|d| d.key).collect();
    assert_eq!(keys, STATE_KEYS);
}

#[test]
fn discovery_payload_carries_contract_fields() {
    let layout = layout();
    let device = DeviceInfo::new("bed-3", "Greenhouse Bed 3");
    let messages = discovery_messages(&layout, &device).expect("discovery");
    assert_eq!(messages.len(), 6);

    let moisture = &messages[1];
    assert!(moisture.retain);
    assert_eq!(
        moisture.topic,
        "homeassistant/sensor/bed-3/vwc_calibrated/config"
    );
    let value: Value = serde_json::from_slice(&moisture.payload).expect("json");
    assert_eq!(value["name"], "Volumetric Water Content");
    assert_eq!(value["object_id"], "bed_3_vwc_calibrated");
    assert_eq!(value["unique_id"], "bed_3_vwc_calibrated");
    assert_eq!(value["device_class"], "moisture");
    assert_eq!(value["state_class"], "measurement");
    assert_eq!(value["unit_of_measurement"], "%");
    assert_eq!(value["state_topic"], "soilnode/bed-3/state");
    assert_eq!(value["value_template"], "{{ value_json.vwc_calibrated }}");
    assert_eq!(value["availability_topic"], "soilnode/bed-3/availability");
    assert_eq!(value["payload_available"], "online");
    assert_eq!(value["payload_not_available"], "offline");
    assert_eq!(value["device"]["identifiers"][0], "bed_3");
    assert_eq!(value["device"]["name"], "Greenhouse Bed 3");
    assert_eq!(value["device"]["manufacturer"], "METER Group");
}

#[test]
fn discovery_without_device_class_omits_key() {
    let messages =
        discovery_messages(&layout(), &DeviceInfo::new("bed-3", "Bed")).expect("discovery");
    let raw: Value = serde_json::from_slice(&messages[0].payload).expect("json");
    assert!(raw.get("device_class").is_none());
}

#[test]
fn device_block_is_shared_verbatim() {
    let messages =
        discovery_messages(&layout(), &DeviceInfo::new("bed-3", "Bed")).expect("discovery");
    let devices: Vec<Value> = messages
        .iter()
        .map(|message| {
            let value: Value = serde_json::from_slice(&message.payload).expect("json");
            value["device"].clone()
        })
        .collect();
    assert!(devices.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn discovery_is_byte_identical_across_builds() {
    let device = DeviceInfo::new("bed-3", "Bed");
    let first = discovery_messages(&layout(), &device).expect("first");
    let second = discovery_messages(&layout(), &device).expect("second");
    assert_eq!(first, second);
}
