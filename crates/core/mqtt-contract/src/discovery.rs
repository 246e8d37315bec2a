//! 自动化平台发现报文（Home Assistant MQTT Discovery 格式）。
//!
//! 每个物理量一条保留消息，每次重连全部重发。
//! 字段顺序由结构体声明顺序固定，相同配置下输出逐字节一致。

use crate::topics::TopicLayout;
use crate::{ContractError, PAYLOAD_AVAILABLE, PAYLOAD_NOT_AVAILABLE};
use domain::OutboundMessage;
use serde::Serialize;

const MANUFACTURER: &str = "METER Group";
const MODEL: &str = "TEROS 12";
const STATE_CLASS: &str = "measurement";

/// 单个物理量的静态描述。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryDescriptor {
    /// 状态报文中的字段名
    pub key: &'static str,
    pub name: &'static str,
    pub device_class: Option<&'static str>,
    pub unit: &'static str,
}

/// 设备对外暴露的全部物理量，顺序与状态报文字段一致。
pub const DESCRIPTORS: [DiscoveryDescriptor; 6] = [
    DiscoveryDescriptor {
        key: "vwc_raw",
        name: "VWC Raw",
        device_class: None,
        unit: "counts",
    },
    DiscoveryDescriptor {
        key: "vwc_calibrated",
        name: "Volumetric Water Content",
        device_class: Some("moisture"),
        unit: "%",
    },
    DiscoveryDescriptor {
        key: "temperature",
        name: "Temperature",
        device_class: Some("temperature"),
        unit: "°C",
    },
    DiscoveryDescriptor {
        key: "ec_raw",
        name: "EC Raw",
        device_class: None,
        unit: "µS/cm",
    },
    DiscoveryDescriptor {
        key: "ec_simple",
        name: "EC Simple",
        device_class: None,
        unit: "dS/m",
    },
    DiscoveryDescriptor {
        key: "ec_epsilon",
        name: "EC Epsilon",
        device_class: None,
        unit: "ε",
    },
];

/// 所有发现报文共用的设备描述。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifiers: Vec<String>,
    pub name: String,
    pub model: String,
    pub manufacturer: String,
    pub sw_version: String,
}

impl DeviceInfo {
    pub fn new(device_id: &str, name: impl Into<String>) -> Self {
        Self {
            identifiers: vec![device_id.replace('-', "_")],
            name: name.into(),
            model: MODEL.to_string(),
            manufacturer: MANUFACTURER.to_string(),
            sw_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DiscoveryPayload<'a> {
    name: &'a str,
    object_id: String,
    unique_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_class: Option<&'a str>,
    state_class: &'static str,
    unit_of_measurement: &'a str,
    state_topic: String,
    value_template: String,
    availability_topic: String,
    payload_available: &'static str,
    payload_not_available: &'static str,
    device: &'a DeviceInfo,
}

/// 状态报文单字段提取模板。
pub fn value_template(key: &str) -> String {
    format!("{{{{ value_json.{} }}}}", key)
}

/// 构造单个物理量的发现报文。
pub fn discovery_payload(
    descriptor: &DiscoveryDescriptor,
    layout: &TopicLayout,
    device: &DeviceInfo,
) -> Result<Vec<u8>, ContractError> {
    let unique_id = layout.unique_id(descriptor.key);
    let payload = DiscoveryPayload {
        name: descriptor.name,
        object_id: unique_id.clone(),
        unique_id,
        device_class: descriptor.device_class,
        state_class: STATE_CLASS,
        unit_of_measurement: descriptor.unit,
        state_topic: layout.state_topic(),
        value_template: value_template(descriptor.key),
        availability_topic: layout.availability_topic(),
        payload_available: PAYLOAD_AVAILABLE,
        payload_not_available: PAYLOAD_NOT_AVAILABLE,
        device,
    };
    serde_json::to_vec(&payload).map_err(|err| ContractError::Encode(err.to_string()))
}

/// 构造全部发现报文（保留消息），顺序同 [`DESCRIPTORS`]。
pub fn discovery_messages(
    layout: &TopicLayout,
    device: &DeviceInfo,
) -> Result<Vec<OutboundMessage>, ContractError> {
    DESCRIPTORS
        .iter()
        .map(|descriptor| {
            let payload = discovery_payload(descriptor, layout, device)?;
            Ok(OutboundMessage::retained(
                layout.discovery_topic(descriptor.key),
                payload,
            ))
        })
        .collect()
}
