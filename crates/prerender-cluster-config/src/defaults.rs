//! Built-in baseline configuration.
//!
//! The baseline is produced by one pure function over an explicit snapshot of
//! the process environment, so it can be tested without touching the real
//! environment.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use tracing::warn;

use crate::{
    OverrideName, OverrideValue, PartialConfig, PartialEnvOverride, PartialPluginToggle,
    PartialServiceOptions, Plugin, PluginConfig,
};

/// Environment variable seeding the worker count.
pub const WORKERS_VAR: &str = "PHANTOM_CLUSTER_NUM_WORKERS";
/// Environment variable seeding the engine base port.
pub const BASE_PORT_VAR: &str = "PHANTOM_CLUSTER_BASE_PORT";
/// Environment variable seeding the restart threshold.
pub const ITERATIONS_VAR: &str = "PHANTOM_WORKER_ITERATIONS";
/// Environment variable seeding the listen port.
pub const PORT_VAR: &str = "PORT";

pub(crate) const DEFAULT_WORKERS: u32 = 1;
pub(crate) const DEFAULT_BASE_PORT: u16 = 12400;
pub(crate) const DEFAULT_ITERATIONS: u32 = 200;
pub(crate) const DEFAULT_PORT: u16 = 3030;

pub(crate) fn default_engine_arguments() -> Vec<String> {
    vec![
        "--load-images=false".to_string(),
        "--ignore-ssl-errors=true".to_string(),
        "--ssl-protocol=tlsv1".to_string(),
    ]
}

/// Immutable copy of process environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }

    /// Look up a variable. Empty values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Whether the variable is present with a non-empty value.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The lowest-precedence configuration source.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSource;

impl DefaultSource {
    /// Build the complete baseline from an environment snapshot.
    ///
    /// Every field is populated: from its environment variable when set and
    /// parseable, otherwise from the built-in constant.
    ///
    /// # Example
    ///
    /// ```
    /// use prerender_cluster_config::{DefaultSource, EnvSnapshot};
    ///
    /// let env: EnvSnapshot = [("PORT", "8000")].into_iter().collect();
    /// let defaults = DefaultSource::load(&env);
    /// assert_eq!(defaults.service_options.listen_port, Some(8000));
    /// assert_eq!(defaults.service_options.base_port, Some(12400));
    /// ```
    pub fn load(env: &EnvSnapshot) -> PartialConfig {
        let service_options = PartialServiceOptions {
            worker_count: Some(env_or(env, WORKERS_VAR, DEFAULT_WORKERS)),
            base_port: Some(env_or(env, BASE_PORT_VAR, DEFAULT_BASE_PORT)),
            restart_after_n_requests: Some(env_or(env, ITERATIONS_VAR, DEFAULT_ITERATIONS)),
            listen_port: Some(env_or(env, PORT_VAR, DEFAULT_PORT)),
            engine_arguments: Some(default_engine_arguments()),
            extra: serde_json::Map::new(),
        };

        let environment_overrides = OverrideName::ALL
            .into_iter()
            .map(|name| {
                let value = env.get(name.env_var()).map_or(
                    OverrideValue::Integer(name.default_value()),
                    OverrideValue::from_env_text,
                );
                let entry = PartialEnvOverride {
                    enabled: Some(false),
                    value: Some(value),
                };
                (name.env_var().to_string(), entry)
            })
            .collect();

        let plugin_toggles = Plugin::ALL
            .into_iter()
            .map(|plugin| {
                let entry = PartialPluginToggle {
                    enabled: Some(plugin.enabled_by_default()),
                    config: PluginConfig::new(),
                };
                (plugin.name().to_string(), entry)
            })
            .collect();

        PartialConfig {
            service_options,
            environment_overrides,
            plugin_toggles,
            extra: serde_json::Map::new(),
        }
    }

    /// The baseline with no environment influence.
    pub fn constants() -> PartialConfig {
        Self::load(&EnvSnapshot::default())
    }
}

fn env_or<T>(env: &EnvSnapshot, var: &str, fallback: T) -> T
where
    T: FromStr + Display,
{
    let Some(raw) = env.get(var) else {
        return fallback;
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(
                variable = var,
                value = raw,
                fallback = %fallback,
                "ignoring unparseable environment variable"
            );
            fallback
        }
    }
}
