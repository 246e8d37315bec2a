/// 设备相关的全部 topic。
///
/// - 状态：`{topic_prefix}/{device_id}/state`
/// - 可用性：`{topic_prefix}/{device_id}/availability`
/// - 发现：`{discovery_prefix}/sensor/{device_id}/{key}/config`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicLayout {
    pub topic_prefix: String,
    pub discovery_prefix: String,
    pub device_id: String,
}

impl TopicLayout {
    pub fn new(
        topic_prefix: impl Into<String>,
        discovery_prefix: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            topic_prefix: topic_prefix.into(),
            discovery_prefix: discovery_prefix.into(),
            device_id: device_id.into(),
        }
    }

    pub fn state_topic(&self) -> String {
        format!("{}/{}/state", self.prefix(), self.device_id)
    }

    pub fn availability_topic(&self) -> String {
        format!("{}/{}/availability", self.prefix(), self.device_id)
    }

    pub fn discovery_topic(&self, key: &str) -> String {
        format!(
            "{}/sensor/{}/{}/config",
            self.discovery_prefix.trim_end_matches('/'),
            self.device_id,
            key
        )
    }

    /// 平台侧实体唯一标识：`{device_id}_{key}`，连字符替换为下划线。
    pub fn unique_id(&self, key: &str) -> String {
        format!("{}_{}", self.device_id.replace('-', "_"), key)
    }

    fn prefix(&self) -> &str {
        self.topic_prefix.trim_end_matches('/')
    }
}
