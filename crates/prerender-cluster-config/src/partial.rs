//! Partial configuration contributed by a single source.
//!
//! Every leaf is optional. A missing leaf contributes nothing when layers are
//! merged, so a document that only sets `options.port` leaves every other
//! field to lower-precedence sources.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{OverrideValue, PluginConfig};

/// One source's contribution before merging.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PartialConfig {
    /// Service options group.
    #[serde(rename = "options")]
    pub service_options: PartialServiceOptions,

    /// Environment overrides group.
    #[serde(rename = "env")]
    pub environment_overrides: IndexMap<String, PartialEnvOverride>,

    /// Plugin toggles group.
    #[serde(rename = "plugins")]
    pub plugin_toggles: IndexMap<String, PartialPluginToggle>,

    /// Unknown top-level groups, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartialConfig {
    /// Whether this source contributes nothing at all.
    pub fn is_empty(&self) -> bool {
        self.service_options.is_empty()
            && self.environment_overrides.values().all(PartialEnvOverride::is_empty)
            && self.plugin_toggles.values().all(PartialPluginToggle::is_empty)
            && self.extra.is_empty()
    }

    /// Set a plugin's enabled flag, creating the entry if needed.
    pub fn set_plugin_enabled(&mut self, name: impl Into<String>, enabled: bool) {
        self.plugin_toggles.entry(name.into()).or_default().enabled = Some(enabled);
    }
}

/// Optional service options.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PartialServiceOptions {
    /// Worker processes; 0 means one per CPU.
    #[serde(rename = "workers")]
    pub worker_count: Option<u32>,

    /// First engine port.
    #[serde(rename = "phantomBasePort")]
    pub base_port: Option<u16>,

    /// Requests before an engine restart.
    #[serde(rename = "iterations")]
    pub restart_after_n_requests: Option<u32>,

    /// Listen port.
    #[serde(rename = "port")]
    pub listen_port: Option<u16>,

    /// Engine arguments; replaces the lower layer's list wholesale.
    #[serde(rename = "phantomArguments")]
    pub engine_arguments: Option<Vec<String>>,

    /// Engine options passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartialServiceOptions {
    /// Whether no option is set.
    pub fn is_empty(&self) -> bool {
        self.worker_count.is_none()
            && self.base_port.is_none()
            && self.restart_after_n_requests.is_none()
            && self.listen_port.is_none()
            && self.engine_arguments.is_none()
            && self.extra.is_empty()
    }
}

/// Optional environment override.
///
/// In documents this is either `{ "set": bool, "value": ... }` or a bare
/// value, which is shorthand for `{ "set": true, "value": ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "EnvOverrideRepr")]
pub struct PartialEnvOverride {
    /// Whether to write the value.
    pub enabled: Option<bool>,
    /// Value to write.
    pub value: Option<OverrideValue>,
}

impl PartialEnvOverride {
    /// Whether neither leaf is set.
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.value.is_none()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EnvOverrideRepr {
    Detailed {
        #[serde(default, alias = "enabled")]
        set: Option<bool>,
        #[serde(default)]
        value: Option<OverrideValue>,
    },
    Bare(OverrideValue),
}

impl From<EnvOverrideRepr> for PartialEnvOverride {
    fn from(repr: EnvOverrideRepr) -> Self {
        match repr {
            EnvOverrideRepr::Detailed { set, value } => Self {
                enabled: set,
                value,
            },
            EnvOverrideRepr::Bare(value) => Self {
                enabled: Some(true),
                value: Some(value),
            },
        }
    }
}

/// Optional plugin toggle.
///
/// In documents this is either `{ "load": bool, "env": {...} }` or a bare
/// boolean, which is shorthand for `{ "load": bool }`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "PluginToggleRepr")]
pub struct PartialPluginToggle {
    /// Whether to mount the plugin.
    pub enabled: Option<bool>,
    /// Plugin settings; merged key by key across layers.
    pub config: PluginConfig,
}

impl PartialPluginToggle {
    /// Whether neither leaf is set.
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.config.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PluginToggleRepr {
    Switch(bool),
    Detailed {
        #[serde(default, alias = "enabled")]
        load: Option<bool>,
        #[serde(default, alias = "pluginConfig")]
        env: PluginConfig,
    },
}

impl From<PluginToggleRepr> for PartialPluginToggle {
    fn from(repr: PluginToggleRepr) -> Self {
        match repr {
            PluginToggleRepr::Switch(enabled) => Self {
                enabled: Some(enabled),
                config: PluginConfig::new(),
            },
            PluginToggleRepr::Detailed { load, env } => Self {
                enabled: load,
                config: env,
            },
        }
    }
}
