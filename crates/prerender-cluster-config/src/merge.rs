//! Precedence resolution across configuration sources.
//!
//! Layers are applied lowest first: defaults, then the file, then the command
//! line. Merging is per leaf, never per group, and a layer that leaves a leaf
//! unset (or sets an empty object) contributes nothing to it.

use serde_json::{Map, Value};

use crate::{
    EffectiveConfig, EnvOverride, OverrideName, OverrideValue, PartialConfig, PartialEnvOverride,
    PartialPluginToggle, PartialServiceOptions, PluginToggle, ServiceOptions,
};

/// Resolve the effective configuration. CLI beats file beats defaults.
///
/// # Example
///
/// ```
/// use prerender_cluster_config::{merge, DefaultSource, PartialConfig};
///
/// let defaults = DefaultSource::constants();
/// let mut cli = PartialConfig::default();
/// cli.service_options.listen_port = Some(8080);
///
/// let config = merge(&defaults, &PartialConfig::default(), &cli);
/// assert_eq!(config.service_options.listen_port, 8080);
/// assert_eq!(config.service_options.base_port, 12400);
/// ```
pub fn merge(
    defaults: &PartialConfig,
    file: &PartialConfig,
    cli: &PartialConfig,
) -> EffectiveConfig {
    let mut layered = defaults.clone();
    overlay(&mut layered, file);
    overlay(&mut layered, cli);
    finalize(layered)
}

/// Apply `top` onto `base`, leaf by leaf.
pub fn overlay(base: &mut PartialConfig, top: &PartialConfig) {
    overlay_options(&mut base.service_options, &top.service_options);

    for (name, entry) in &top.environment_overrides {
        if entry.is_empty() {
            continue;
        }
        overlay_env(base.environment_overrides.entry(name.clone()).or_default(), entry);
    }

    for (name, toggle) in &top.plugin_toggles {
        if toggle.is_empty() {
            continue;
        }
        overlay_plugin(base.plugin_toggles.entry(name.clone()).or_default(), toggle);
    }

    overlay_map(&mut base.extra, &top.extra);
}

fn overlay_options(base: &mut PartialServiceOptions, top: &PartialServiceOptions) {
    overlay_leaf(&mut base.worker_count, &top.worker_count);
    overlay_leaf(&mut base.base_port, &top.base_port);
    overlay_leaf(&mut base.restart_after_n_requests, &top.restart_after_n_requests);
    overlay_leaf(&mut base.listen_port, &top.listen_port);
    overlay_leaf(&mut base.engine_arguments, &top.engine_arguments);
    overlay_map(&mut base.extra, &top.extra);
}

fn overlay_env(base: &mut PartialEnvOverride, top: &PartialEnvOverride) {
    overlay_leaf(&mut base.enabled, &top.enabled);
    overlay_leaf(&mut base.value, &top.value);
}

fn overlay_plugin(base: &mut PartialPluginToggle, top: &PartialPluginToggle) {
    overlay_leaf(&mut base.enabled, &top.enabled);
    overlay_map(&mut base.config, &top.config);
}

fn overlay_leaf<T: Clone>(base: &mut Option<T>, top: &Option<T>) {
    if let Some(value) = top {
        *base = Some(value.clone());
    }
}

fn overlay_map(base: &mut Map<String, Value>, top: &Map<String, Value>) {
    for (key, value) in top {
        if is_blank(value) {
            continue;
        }
        base.insert(key.clone(), value.clone());
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

// Leaves still unset after layering fall back to the built-in constants.
fn finalize(layered: PartialConfig) -> EffectiveConfig {
    let fallback = ServiceOptions::default();
    let options = layered.service_options;

    let service_options = ServiceOptions {
        worker_count: options.worker_count.unwrap_or(fallback.worker_count),
        base_port: options.base_port.unwrap_or(fallback.base_port),
        restart_after_n_requests: options
            .restart_after_n_requests
            .unwrap_or(fallback.restart_after_n_requests),
        listen_port: options.listen_port.unwrap_or(fallback.listen_port),
        engine_arguments: options.engine_arguments.unwrap_or(fallback.engine_arguments),
        extra: options.extra,
    };

    let environment_overrides = layered
        .environment_overrides
        .into_iter()
        .map(|(name, entry)| {
            let value = entry.value.unwrap_or_else(|| {
                OverrideName::from_env_var(&name).map_or_else(OverrideValue::default, |known| {
                    OverrideValue::Integer(known.default_value())
                })
            });
            let resolved = EnvOverride {
                enabled: entry.enabled.unwrap_or(false),
                value,
            };
            (name, resolved)
        })
        .collect();

    let plugin_toggles = layered
        .plugin_toggles
        .into_iter()
        .map(|(name, toggle)| {
            let resolved = PluginToggle {
                enabled: toggle.enabled.unwrap_or(false),
                config: toggle.config,
            };
            (name, resolved)
        })
        .collect();

    EffectiveConfig {
        service_options,
        environment_overrides,
        plugin_toggles,
        extra: layered.extra,
    }
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        let empty = PartialConfig::default();
        merge(&crate::DefaultSource::constants(), &empty, &empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DefaultSource, FileFormat, FileSource, Plugin};
    use serde_json::json;

    fn file(json: &str) -> PartialConfig {
        FileSource::parse(json, FileFormat::Json).unwrap()
    }

    #[test]
    fn test_defaults_only() {
        let config = EffectiveConfig::default();
        assert_eq!(config.service_options, ServiceOptions::default());
        assert_eq!(config.environment_overrides.len(), 6);
        assert_eq!(config.plugin_toggles.len(), 8);
        assert!(config.plugin_enabled(Plugin::RemoveScriptTags));
        assert!(config.plugin_enabled(Plugin::HttpHeaders));
        assert!(!config.plugin_enabled(Plugin::Blacklist));
    }

    #[test]
    fn test_file_overrides_single_leaf() {
        let defaults = DefaultSource::constants();
        let config = merge(&defaults, &file(r#"{"options": {"port": 4000}}"#), &PartialConfig::default());

        assert_eq!(config.service_options.listen_port, 4000);
        assert_eq!(config.service_options.base_port, 12400);
        assert_eq!(config.service_options.worker_count, 1);
        assert_eq!(config.service_options.engine_arguments.len(), 3);
    }

    #[test]
    fn test_cli_beats_file() {
        let defaults = DefaultSource::constants();
        let file = file(r#"{"options": {"port": 4000, "workers": 2}}"#);
        let mut cli = PartialConfig::default();
        cli.service_options.listen_port = Some(5000);

        let config = merge(&defaults, &file, &cli);
        assert_eq!(config.service_options.listen_port, 5000);
        assert_eq!(config.service_options.worker_count, 2);
    }

    #[test]
    fn test_plugin_leaf_merge() {
        let defaults = DefaultSource::constants();
        let file = file(r#"{"plugins": {"basicAuth": {"env": {"BASIC_AUTH_USERNAME": "admin"}}}}"#);
        let mut cli = PartialConfig::default();
        cli.set_plugin_enabled("basicAuth", true);

        let config = merge(&defaults, &file, &cli);
        let toggle = config.plugin(Plugin::BasicAuth).unwrap();
        assert!(toggle.enabled);
        assert_eq!(toggle.config["BASIC_AUTH_USERNAME"], "admin");
    }

    #[test]
    fn test_plugin_config_merges_by_key() {
        let mut base = file(r#"{"plugins": {"logger": {"env": {"a": 1, "b": 2}}}}"#);
        let top = file(r#"{"plugins": {"logger": {"env": {"b": 3}}}}"#);
        overlay(&mut base, &top);

        let config = &base.plugin_toggles["logger"].config;
        assert_eq!(config["a"], 1);
        assert_eq!(config["b"], 3);
    }

    #[test]
    fn test_env_override_enable_keeps_default_value() {
        let defaults = DefaultSource::constants();
        let file = file(r#"{"env": {"JS_TIMEOUT": {"set": true}}}"#);

        let config = merge(&defaults, &file, &PartialConfig::default());
        let js = config.env_override(OverrideName::JsTimeout).unwrap();
        assert!(js.enabled);
        assert_eq!(js.value, OverrideValue::Integer(10_000));
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let defaults = DefaultSource::constants();
        let file = file(
            r#"{
                "options": {"logRequests": true},
                "env": {"CUSTOM_TIMEOUT": 5},
                "plugins": {"unknownPlugin": true},
                "cluster": {"sticky": true}
            }"#,
        );

        let config = merge(&defaults, &file, &PartialConfig::default());
        assert_eq!(config.service_options.extra["logRequests"], json!(true));
        assert_eq!(
            config.environment_overrides["CUSTOM_TIMEOUT"],
            EnvOverride {
                enabled: true,
                value: OverrideValue::Integer(5)
            }
        );
        assert!(config.plugin_toggles["unknownPlugin"].enabled);
        assert_eq!(config.extra["cluster"], json!({"sticky": true}));
    }

    #[test]
    fn test_empty_groups_contribute_nothing() {
        let defaults = DefaultSource::constants();
        let file = file(r#"{"options": {}, "env": {"JS_TIMEOUT": {}}, "plugins": {"foo": {}}, "x": {}}"#);

        let config = merge(&defaults, &file, &PartialConfig::default());
        assert_eq!(config, EffectiveConfig::default());
        assert!(!config.plugin_toggles.contains_key("foo"));
        assert!(!config.extra.contains_key("x"));
    }

    #[test]
    fn test_engine_arguments_replaced_wholesale() {
        let defaults = DefaultSource::constants();
        let file = file(r#"{"options": {"phantomArguments": ["--debug=true"]}}"#);

        let config = merge(&defaults, &file, &PartialConfig::default());
        assert_eq!(config.service_options.engine_arguments, vec!["--debug=true"]);
    }

    #[test]
    fn test_missing_defaults_fall_back_to_constants() {
        let empty = PartialConfig::default();
        let config = merge(&empty, &empty, &empty);
        assert_eq!(config.service_options, ServiceOptions::default());
        assert!(config.environment_overrides.is_empty());
        assert!(config.plugin_toggles.is_empty());
    }
}
