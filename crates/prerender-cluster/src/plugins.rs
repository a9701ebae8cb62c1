//! Plugin activation.
//!
//! Maps the configured plugin toggles onto the capabilities a rendering
//! service actually offers. A plugin that cannot be activated is reported,
//! never fatal.

use std::collections::BTreeSet;

use prerender_cluster_config::{EffectiveConfig, Plugin, PluginConfig, ValidationError};

use crate::ProcessRole;

/// A plugin to mount, with its settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    /// The plugin.
    pub plugin: Plugin,
    /// Settings handed to the plugin when mounted.
    pub config: PluginConfig,
}

/// Outcome of [`resolve_plugins`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginResolution {
    /// Enabled plugins the service offers, in configuration order.
    pub activated: Vec<Activation>,
    /// Names of enabled plugins that could not be activated.
    pub unavailable: BTreeSet<String>,
    /// One diagnostic per unavailable plugin.
    pub diagnostics: Vec<ValidationError>,
}

impl PluginResolution {
    /// Whether the plugin was activated.
    pub fn is_activated(&self, plugin: Plugin) -> bool {
        self.activated.iter().any(|a| a.plugin == plugin)
    }

    /// Activated plugin names, in activation order.
    pub fn activated_names(&self) -> Vec<&'static str> {
        self.activated.iter().map(|a| a.plugin.name()).collect()
    }
}

/// Decide which plugins to mount.
///
/// Enabled and available plugins are activated. Enabled plugins outside the
/// known set, or not offered by the service, land in `unavailable` with one
/// diagnostic each. Disabled plugins are ignored.
pub fn resolve_plugins(
    config: &EffectiveConfig,
    available: &BTreeSet<Plugin>,
    role: ProcessRole,
) -> PluginResolution {
    let mut resolution = PluginResolution::default();

    for (name, toggle) in config.plugin_toggles.iter().filter(|(_, t)| t.enabled) {
        let diagnostic = match name.parse::<Plugin>() {
            Ok(plugin) if available.contains(&plugin) => {
                group_info!(role, plugin = %plugin, "plugin activated");
                resolution.activated.push(Activation {
                    plugin,
                    config: toggle.config.clone(),
                });
                continue;
            }
            Ok(plugin) => ValidationError::unavailable_plugin(plugin.name()),
            Err(unknown) => unknown,
        };

        group_warn!(role, plugin = %name, "plugin requested but {}", diagnostic.reason);
        resolution.unavailable.insert(name.clone());
        resolution.diagnostics.push(diagnostic);
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use prerender_cluster_config::{ErrorKind, PluginToggle};
    use serde_json::json;

    fn all() -> BTreeSet<Plugin> {
        Plugin::ALL.into_iter().collect()
    }

    #[test]
    fn test_defaults_activate_two() {
        let resolution = resolve_plugins(&EffectiveConfig::default(), &all(), ProcessRole::Coordinator);
        assert_eq!(resolution.activated_names(), vec!["removeScriptTags", "httpHeaders"]);
        assert!(resolution.unavailable.is_empty());
        assert!(resolution.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_plugin_reported() {
        let mut config = EffectiveConfig::default();
        config.plugin_toggles.insert(
            "unknownPlugin".to_string(),
            PluginToggle {
                enabled: true,
                config: PluginConfig::new(),
            },
        );

        let resolution = resolve_plugins(&config, &all(), ProcessRole::Coordinator);
        assert!(resolution.unavailable.contains("unknownPlugin"));
        assert_eq!(resolution.activated.len(), 2);
        assert_eq!(resolution.diagnostics.len(), 1);
        assert_eq!(resolution.diagnostics[0].kind, ErrorKind::UnknownPlugin);
        assert_eq!(resolution.diagnostics[0].reason, "not recognized");
        assert!(!resolution.diagnostics[0].is_fatal());
    }

    #[test]
    fn test_known_but_not_offered() {
        let mut config = EffectiveConfig::default();
        config.plugin_toggles["s3HtmlCache"].enabled = true;
        let available: BTreeSet<Plugin> = [Plugin::RemoveScriptTags, Plugin::HttpHeaders].into();

        let resolution = resolve_plugins(&config, &available, ProcessRole::Worker);
        assert!(!resolution.is_activated(Plugin::S3HtmlCache));
        assert!(resolution.unavailable.contains("s3HtmlCache"));
        assert_eq!(resolution.diagnostics[0].reason, "not available");
    }

    #[test]
    fn test_disabled_unknown_plugin_ignored() {
        let mut config = EffectiveConfig::default();
        config.plugin_toggles.insert(
            "legacyPlugin".to_string(),
            PluginToggle {
                enabled: false,
                config: PluginConfig::new(),
            },
        );

        let resolution = resolve_plugins(&config, &all(), ProcessRole::Coordinator);
        assert!(resolution.unavailable.is_empty());
    }

    #[test]
    fn test_activation_carries_config() {
        let mut config = EffectiveConfig::default();
        let toggle = &mut config.plugin_toggles["basicAuth"];
        toggle.enabled = true;
        toggle
            .config
            .insert("BASIC_AUTH_USERNAME".to_string(), json!("admin"));

        let resolution = resolve_plugins(&config, &all(), ProcessRole::Coordinator);
        let activation = resolution
            .activated
            .iter()
            .find(|a| a.plugin == Plugin::BasicAuth)
            .unwrap();
        assert_eq!(activation.config["BASIC_AUTH_USERNAME"], "admin");
    }
}
