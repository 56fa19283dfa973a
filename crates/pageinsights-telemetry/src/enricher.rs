//! Telemetry item envelope and the cloud-role initializer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::EffectiveConfig;

pub const CLOUD_ROLE_TAG: &str = "ai.cloud.role";
pub const CLOUD_ROLE_INSTANCE_TAG: &str = "ai.cloud.roleInstance";

/// Envelope the SDK builds for every outgoing item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryItem {
    pub name: String,
    pub time: DateTime<Utc>,
    #[serde(rename = "iKey", skip_serializing_if = "Option::is_none")]
    pub ikey: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
}

impl TelemetryItem {
    /// Create an item with an empty tag map
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: Utc::now(),
            ikey: None,
            tags: Some(BTreeMap::new()),
            base_type: None,
            base_data: None,
            data: None,
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.as_ref()?.get(key).map(String::as_str)
    }
}

/// Stamp deployment-role tags onto an outgoing item
///
/// Only the two cloud tags are written, and only for non-empty config
/// values. A missing item or tag map is left alone.
pub fn enrich(item: Option<&mut TelemetryItem>, config: &EffectiveConfig) {
    let Some(tags) = item.and_then(|item| item.tags.as_mut()) else {
        return;
    };

    if !config.cloud_role.is_empty() {
        tags.insert(CLOUD_ROLE_TAG.to_string(), config.cloud_role.clone());
    }
    if !config.cloud_role_instance.is_empty() {
        tags.insert(
            CLOUD_ROLE_INSTANCE_TAG.to_string(),
            config.cloud_role_instance.clone(),
        );
    }
}

/// Pre-send hook registered with the SDK
///
/// Runs once per item on the send path, so implementations must not panic.
/// Returning `false` tells the SDK to drop the item.
pub trait TelemetryInitializer: Send + Sync {
    fn initialize(&self, item: &mut TelemetryItem) -> bool;
}

/// Adds the cloud role and role instance from the session's config
#[derive(Debug, Clone)]
pub struct CloudRoleInitializer {
    config: Arc<EffectiveConfig>,
}

impl CloudRoleInitializer {
    pub fn new(config: Arc<EffectiveConfig>) -> Self {
        Self { config }
    }
}

impl TelemetryInitializer for CloudRoleInitializer {
    fn initialize(&self, item: &mut TelemetryItem) -> bool {
        enrich(Some(item), &self.config);
        true
    }
}
