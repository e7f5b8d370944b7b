//! Scripted host sessions.
//!
//! A scenario names the starting address, the instances mounted before the
//! first event, and the ordered host events to replay. Both YAML and JSON are
//! accepted; the format is picked from the file extension.

use std::path::Path;

use anyhow::{Context, Result};
use querystate_types::{InstanceId, ItemKey, ItemSpec, Location, RegisterOptions};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Scenario {
    /// Starting address; falls back to the session config when absent
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub instances: Vec<InstanceSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One instance mount as written in a scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InstanceSpec {
    pub id: InstanceId,
    /// Falls back to the session config default when absent
    #[serde(default)]
    pub notify_on_change: Option<bool>,
    pub initial_items: Vec<ItemSpec>,
    #[serde(default)]
    pub passthrough: Option<Value>,
}

impl InstanceSpec {
    pub fn into_options(self, default_notify: bool) -> (InstanceId, RegisterOptions) {
        let options = RegisterOptions {
            notify_on_change: self.notify_on_change.unwrap_or(default_notify),
            initial_items: self.initial_items,
            passthrough: self.passthrough,
        };
        (self.id, options)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub enum Step {
    /// User picks an item
    Select { id: InstanceId, key: ItemKey },
    /// Host code commands a selection
    Command { id: InstanceId, key: ItemKey },
    /// External navigation (address bar, back button, link)
    Navigate(Location),
    /// Re-render; omitted fields keep the instance's current values
    Render {
        id: InstanceId,
        #[serde(default)]
        items: Option<Vec<ItemSpec>>,
        #[serde(default)]
        passthrough: Option<Value>,
    },
    Mount(InstanceSpec),
    Unmount { id: InstanceId },
}

impl Scenario {
    /// Steps are written as single-key maps (`- select: {...}`) in both formats.
    pub fn from_str_with_format(content: &str, json: bool) -> Result<Self> {
        if json {
            serde_json::from_str(content).context("failed to parse JSON scenario")
        } else {
            serde_yaml::with::singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(content))
                .context("failed to parse YAML scenario")
        }
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        let json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        Self::from_str_with_format(&content, json)
    }
}
