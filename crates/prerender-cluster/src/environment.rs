//! Sticky environment overrides.
//!
//! The coordinator writes every enabled override into the process
//! environment before workers are spawned, so the whole group inherits the
//! same values. Workers never write.

use std::collections::BTreeMap;

use prerender_cluster_config::EffectiveConfig;

use crate::ProcessRole;

/// Process-wide key/value environment.
pub trait EnvironmentStore {
    /// Read a variable.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a variable.
    fn set(&mut self, key: &str, value: &str);
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl EnvironmentStore for ProcessEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set(&mut self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }
}

/// An in-memory environment for tests and embedding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryEnvironment {
    vars: BTreeMap<String, String>,
}

impl MemoryEnvironment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no variable is set.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl EnvironmentStore for MemoryEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// One variable written by [`apply_environment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOverride {
    /// Variable name.
    pub name: String,
    /// Value before the write, if the variable was set.
    pub before: Option<String>,
    /// Value written.
    pub after: String,
}

/// Write every enabled override into `store`.
///
/// A no-op for workers. Writes are plain assignments, so applying the same
/// configuration twice leaves the environment unchanged.
///
/// # Example
///
/// ```
/// use prerender_cluster::{apply_environment, MemoryEnvironment, ProcessRole};
/// use prerender_cluster_config::EffectiveConfig;
///
/// let mut config = EffectiveConfig::default();
/// config.environment_overrides["JS_TIMEOUT"].enabled = true;
///
/// let mut env = MemoryEnvironment::new();
/// let applied = apply_environment(&config, ProcessRole::Coordinator, &mut env);
/// assert_eq!(applied.len(), 1);
/// assert_eq!(applied[0].after, "10000");
///
/// let applied = apply_environment(&config, ProcessRole::Worker, &mut MemoryEnvironment::new());
/// assert!(applied.is_empty());
/// ```
pub fn apply_environment<S>(
    config: &EffectiveConfig,
    role: ProcessRole,
    store: &mut S,
) -> Vec<AppliedOverride>
where
    S: EnvironmentStore + ?Sized,
{
    if !role.is_coordinator() {
        return Vec::new();
    }

    config
        .environment_overrides
        .iter()
        .filter(|(_, entry)| entry.enabled)
        .map(|(name, entry)| {
            let before = store.get(name);
            let after = entry.value.to_string();
            store.set(name, &after);

            tracing::info!(
                variable = %name,
                before = before.as_deref().unwrap_or("<unset>"),
                after = %after,
                "environment override applied"
            );

            AppliedOverride {
                name: name.clone(),
                before,
                after,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prerender_cluster_config::{EnvOverride, OverrideValue};

    fn config_with(overrides: &[(&str, bool, OverrideValue)]) -> EffectiveConfig {
        let mut config = EffectiveConfig::default();
        for (name, enabled, value) in overrides {
            config.environment_overrides.insert(
                (*name).to_string(),
                EnvOverride {
                    enabled: *enabled,
                    value: value.clone(),
                },
            );
        }
        config
    }

    #[test]
    fn test_defaults_write_nothing() {
        let mut env = MemoryEnvironment::new();
        let applied = apply_environment(&EffectiveConfig::default(), ProcessRole::Coordinator, &mut env);
        assert!(applied.is_empty());
        assert!(env.is_empty());
    }

    #[test]
    fn test_enabled_overrides_written() {
        let config = config_with(&[
            ("JS_TIMEOUT", true, OverrideValue::Integer(20_000)),
            ("WAIT_AFTER_LAST_REQUEST", false, OverrideValue::Integer(900)),
            ("CUSTOM_FLAG", true, OverrideValue::Text("on".to_string())),
        ]);
        let mut env: MemoryEnvironment = [("JS_TIMEOUT", "10000")].into_iter().collect();

        let applied = apply_environment(&config, ProcessRole::Coordinator, &mut env);
        assert_eq!(applied.len(), 2);
        assert_eq!(
            applied[0],
            AppliedOverride {
                name: "JS_TIMEOUT".to_string(),
                before: Some("10000".to_string()),
                after: "20000".to_string(),
            }
        );
        assert_eq!(env.get("JS_TIMEOUT").as_deref(), Some("20000"));
        assert_eq!(env.get("CUSTOM_FLAG").as_deref(), Some("on"));
        assert!(env.get("WAIT_AFTER_LAST_REQUEST").is_none());
    }

    #[test]
    fn test_worker_is_noop() {
        let config = config_with(&[("JS_TIMEOUT", true, OverrideValue::Integer(1))]);
        let mut env = MemoryEnvironment::new();

        assert!(apply_environment(&config, ProcessRole::Worker, &mut env).is_empty());
        assert!(env.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let config = config_with(&[("PAGE_DONE_CHECK_TIMEOUT", true, OverrideValue::Integer(75))]);
        let mut env = MemoryEnvironment::new();

        apply_environment(&config, ProcessRole::Coordinator, &mut env);
        let once = env.clone();
        let applied = apply_environment(&config, ProcessRole::Coordinator, &mut env);

        assert_eq!(env, once);
        assert_eq!(applied[0].before.as_deref(), Some("75"));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_process_environment_round_trip() {
        let mut env = ProcessEnvironment;
        env.set("PRERENDER_CLUSTER_TEST_ENVIRONMENT_STORE", "42");
        assert_eq!(
            env.get("PRERENDER_CLUSTER_TEST_ENVIRONMENT_STORE").as_deref(),
            Some("42")
        );
    }
}
