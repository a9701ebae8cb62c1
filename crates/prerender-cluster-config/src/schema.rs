//! Configuration schema types.
//!
//! This module defines the resolved configuration handed to the rendering
//! service, plus the fixed sets of known plugins and environment overrides.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ValidationError;

/// Opaque per-plugin settings, passed through to the plugin untouched.
pub type PluginConfig = Map<String, Value>;

/// Fully resolved configuration for one process group.
///
/// Built once by the coordinator and never mutated afterwards. Serializes to
/// the same document shape accepted by `--config`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveConfig {
    /// Options passed to the rendering service.
    #[serde(rename = "options")]
    pub service_options: ServiceOptions,

    /// Process environment overrides, keyed by variable name.
    #[serde(rename = "env")]
    pub environment_overrides: IndexMap<String, EnvOverride>,

    /// Middleware toggles, keyed by plugin name.
    #[serde(rename = "plugins")]
    pub plugin_toggles: IndexMap<String, PluginToggle>,

    /// Unknown top-level groups supplied by a configuration file.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EffectiveConfig {
    /// Look up the toggle for a known plugin.
    pub fn plugin(&self, plugin: Plugin) -> Option<&PluginToggle> {
        self.plugin_toggles.get(plugin.name())
    }

    /// Whether a known plugin is switched on.
    pub fn plugin_enabled(&self, plugin: Plugin) -> bool {
        self.plugin(plugin).is_some_and(|toggle| toggle.enabled)
    }

    /// Look up a known environment override.
    pub fn env_override(&self, name: OverrideName) -> Option<&EnvOverride> {
        self.environment_overrides.get(name.env_var())
    }
}

/// Options handed to the rendering service on construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceOptions {
    /// Worker processes to run; 0 means one per available CPU.
    #[serde(rename = "workers")]
    pub worker_count: u32,

    /// First port of the headless engine cluster.
    #[serde(rename = "phantomBasePort")]
    pub base_port: u16,

    /// Requests served before an engine instance is restarted.
    #[serde(rename = "iterations")]
    pub restart_after_n_requests: u32,

    /// Port the service listens on for render requests.
    #[serde(rename = "port")]
    pub listen_port: u16,

    /// Arguments passed verbatim to the headless engine.
    #[serde(rename = "phantomArguments")]
    pub engine_arguments: Vec<String>,

    /// Engine options this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            worker_count: crate::defaults::DEFAULT_WORKERS,
            base_port: crate::defaults::DEFAULT_BASE_PORT,
            restart_after_n_requests: crate::defaults::DEFAULT_ITERATIONS,
            listen_port: crate::defaults::DEFAULT_PORT,
            engine_arguments: crate::defaults::default_engine_arguments(),
            extra: Map::new(),
        }
    }
}

impl ServiceOptions {
    /// Number of workers to spawn, resolving 0 to the available parallelism.
    pub fn effective_worker_count(&self) -> usize {
        match self.worker_count {
            0 => std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            n => n as usize,
        }
    }
}

/// A single environment override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvOverride {
    /// Whether the coordinator writes this value into the environment.
    #[serde(rename = "set")]
    pub enabled: bool,

    /// Value to write.
    pub value: OverrideValue,
}

/// Value of an environment override.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverrideValue {
    /// Integer value, typically a timeout in milliseconds.
    Integer(i64),
    /// Free-form string value.
    Text(String),
}

impl OverrideValue {
    /// Interpret an environment variable's text, preferring an integer.
    pub fn from_env_text(raw: &str) -> Self {
        raw.trim()
            .parse()
            .map_or_else(|_| Self::Text(raw.to_string()), Self::Integer)
    }
}

impl Default for OverrideValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for OverrideValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A middleware toggle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginToggle {
    /// Whether the plugin should be mounted.
    #[serde(rename = "load")]
    pub enabled: bool,

    /// Settings handed to the plugin when mounted.
    #[serde(rename = "env")]
    pub config: PluginConfig,
}

/// Environment overrides understood by the rendering engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverrideName {
    /// Interval between page-done checks.
    PageDoneCheckTimeout,
    /// Timeout for individual resource downloads.
    ResourceDownloadTimeout,
    /// Quiet period after the last network request.
    WaitAfterLastRequest,
    /// Interval between JavaScript readiness checks.
    JsCheckTimeout,
    /// Overall JavaScript execution timeout.
    JsTimeout,
    /// Interval between evaluate-JavaScript checks.
    EvaluateJavascriptCheckTimeout,
}

impl OverrideName {
    /// Every known override, in document order.
    pub const ALL: [Self; 6] = [
        Self::PageDoneCheckTimeout,
        Self::ResourceDownloadTimeout,
        Self::WaitAfterLastRequest,
        Self::JsCheckTimeout,
        Self::JsTimeout,
        Self::EvaluateJavascriptCheckTimeout,
    ];

    /// Name of the environment variable this override writes.
    pub const fn env_var(self) -> &'static str {
        match self {
            Self::PageDoneCheckTimeout => "PAGE_DONE_CHECK_TIMEOUT",
            Self::ResourceDownloadTimeout => "RESOURCE_DOWNLOAD_TIMEOUT",
            Self::WaitAfterLastRequest => "WAIT_AFTER_LAST_REQUEST",
            Self::JsCheckTimeout => "JS_CHECK_TIMEOUT",
            Self::JsTimeout => "JS_TIMEOUT",
            Self::EvaluateJavascriptCheckTimeout => "EVALUATE_JAVASCRIPT_CHECK_TIMEOUT",
        }
    }

    /// Built-in value, in milliseconds.
    pub const fn default_value(self) -> i64 {
        match self {
            Self::PageDoneCheckTimeout
            | Self::JsCheckTimeout
            | Self::EvaluateJavascriptCheckTimeout => 50,
            Self::ResourceDownloadTimeout | Self::JsTimeout => 10_000,
            Self::WaitAfterLastRequest => 500,
        }
    }

    /// Look up a known override by its environment variable name.
    pub fn from_env_var(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.env_var() == name)
    }
}

impl fmt::Display for OverrideName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_var())
    }
}

/// Middleware capabilities the rendering service may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Plugin {
    /// Strips `<script>` blocks from rendered pages.
    RemoveScriptTags,
    /// Honours `prerender-status-code` and header meta tags.
    HttpHeaders,
    /// Rejects URLs matching a blacklist.
    Blacklist,
    /// Only renders URLs matching a whitelist.
    Whitelist,
    /// Requires HTTP basic authentication.
    BasicAuth,
    /// Logs every render request.
    Logger,
    /// Caches rendered HTML in process memory.
    InMemoryHtmlCache,
    /// Caches rendered HTML in a remote object store.
    S3HtmlCache,
}

impl Plugin {
    /// Every known plugin, in document order.
    pub const ALL: [Self; 8] = [
        Self::RemoveScriptTags,
        Self::HttpHeaders,
        Self::Blacklist,
        Self::Whitelist,
        Self::BasicAuth,
        Self::Logger,
        Self::InMemoryHtmlCache,
        Self::S3HtmlCache,
    ];

    /// Name used in configuration documents and on the command line.
    pub const fn name(self) -> &'static str {
        match self {
            Self::RemoveScriptTags => "removeScriptTags",
            Self::HttpHeaders => "httpHeaders",
            Self::Blacklist => "blacklist",
            Self::Whitelist => "whitelist",
            Self::BasicAuth => "basicAuth",
            Self::Logger => "logger",
            Self::InMemoryHtmlCache => "inMemoryHtmlCache",
            Self::S3HtmlCache => "s3HtmlCache",
        }
    }

    /// Whether the plugin is mounted when no source says otherwise.
    pub const fn enabled_by_default(self) -> bool {
        matches!(self, Self::RemoveScriptTags | Self::HttpHeaders)
    }
}

impl fmt::Display for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Plugin {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| ValidationError::unknown_plugin(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_names_round_trip() {
        for plugin in Plugin::ALL {
            assert_eq!(plugin.name().parse::<Plugin>().unwrap(), plugin);
        }
    }

    #[test]
    fn test_unknown_plugin_name() {
        let err = "unknownPlugin".parse::<Plugin>().unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::UnknownPlugin);
    }

    #[test]
    fn test_plugin_defaults() {
        let enabled: Vec<_> = Plugin::ALL
            .into_iter()
            .filter(|p| p.enabled_by_default())
            .collect();
        assert_eq!(enabled, vec![Plugin::RemoveScriptTags, Plugin::HttpHeaders]);
    }

    #[test]
    fn test_override_defaults() {
        let values: Vec<_> = OverrideName::ALL
            .into_iter()
            .map(OverrideName::default_value)
            .collect();
        assert_eq!(values, vec![50, 10_000, 500, 50, 10_000, 50]);
    }

    #[test]
    fn test_override_from_env_var() {
        assert_eq!(
            OverrideName::from_env_var("JS_TIMEOUT"),
            Some(OverrideName::JsTimeout)
        );
        assert_eq!(OverrideName::from_env_var("PATH"), None);
    }

    #[test]
    fn test_override_value_from_env_text() {
        assert_eq!(OverrideValue::from_env_text("250"), OverrideValue::Integer(250));
        assert_eq!(
            OverrideValue::from_env_text("slow"),
            OverrideValue::Text("slow".to_string())
        );
        assert_eq!(OverrideValue::Integer(10).to_string(), "10");
    }

    #[test]
    fn test_override_value_untagged_json() {
        let int: OverrideValue = serde_json::from_str("2000").unwrap();
        assert_eq!(int, OverrideValue::Integer(2000));
        let text: OverrideValue = serde_json::from_str("\"2000ms\"").unwrap();
        assert_eq!(text, OverrideValue::Text("2000ms".to_string()));
    }

    #[test]
    fn test_effective_worker_count() {
        let mut options = ServiceOptions::default();
        options.worker_count = 4;
        assert_eq!(options.effective_worker_count(), 4);

        options.worker_count = 0;
        assert!(options.effective_worker_count() >= 1);
    }

    #[test]
    fn test_service_options_serialize_document_names() {
        let json = serde_json::to_value(ServiceOptions::default()).unwrap();
        assert_eq!(json["workers"], 1);
        assert_eq!(json["phantomBasePort"], 12400);
        assert_eq!(json["iterations"], 200);
        assert_eq!(json["port"], 3030);
        assert_eq!(json["phantomArguments"][0], "--load-images=false");
    }
}
