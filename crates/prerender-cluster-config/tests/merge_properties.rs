//! Property-based tests for precedence resolution.
//!
//! Coverage:
//! - a leaf set on the command line always wins
//! - a leaf set only in the file beats the defaults
//! - empty file and command-line sources leave the defaults untouched
//! - merging is per leaf: setting one option never disturbs another

use proptest::prelude::*;

use prerender_cluster_config::{
    merge, overlay, DefaultSource, EffectiveConfig, PartialConfig, PartialServiceOptions, Plugin,
};

/// Strategy for a service-options layer with any subset of leaves set.
fn service_options_strategy() -> impl Strategy<Value = PartialServiceOptions> {
    (
        proptest::option::of(0u32..=128),
        proptest::option::of(3001u16..=64000),
        proptest::option::of(1u32..=500),
        proptest::option::of(3000u16..=64000),
        proptest::option::of(proptest::collection::vec("--[a-z-]{3,12}=[a-z0-9]{1,6}", 0..4)),
    )
        .prop_map(
            |(worker_count, base_port, restart_after_n_requests, listen_port, engine_arguments)| {
                PartialServiceOptions {
                    worker_count,
                    base_port,
                    restart_after_n_requests,
                    listen_port,
                    engine_arguments,
                    extra: serde_json::Map::new(),
                }
            },
        )
}

/// Strategy for a layer with random options and random plugin switches.
fn layer_strategy() -> impl Strategy<Value = PartialConfig> {
    (
        service_options_strategy(),
        proptest::collection::vec((0usize..Plugin::ALL.len(), any::<bool>()), 0..5),
    )
        .prop_map(|(service_options, switches)| {
            let mut layer = PartialConfig {
                service_options,
                ..PartialConfig::default()
            };
            for (index, enabled) in switches {
                layer.set_plugin_enabled(Plugin::ALL[index].name(), enabled);
            }
            layer
        })
}

fn expected<T: Clone>(cli: Option<&T>, file: Option<&T>, default: &T) -> T {
    cli.or(file).unwrap_or(default).clone()
}

proptest! {
    #[test]
    fn prop_cli_beats_file_beats_defaults(file in layer_strategy(), cli in layer_strategy()) {
        let defaults = DefaultSource::constants();
        let baseline = EffectiveConfig::default();
        let config = merge(&defaults, &file, &cli);

        let (f, c, d) = (&file.service_options, &cli.service_options, &baseline.service_options);
        let got = &config.service_options;
        prop_assert_eq!(got.worker_count, expected(c.worker_count.as_ref(), f.worker_count.as_ref(), &d.worker_count));
        prop_assert_eq!(got.base_port, expected(c.base_port.as_ref(), f.base_port.as_ref(), &d.base_port));
        prop_assert_eq!(
            got.restart_after_n_requests,
            expected(c.restart_after_n_requests.as_ref(), f.restart_after_n_requests.as_ref(), &d.restart_after_n_requests)
        );
        prop_assert_eq!(got.listen_port, expected(c.listen_port.as_ref(), f.listen_port.as_ref(), &d.listen_port));
        prop_assert_eq!(
            &got.engine_arguments,
            &expected(c.engine_arguments.as_ref(), f.engine_arguments.as_ref(), &d.engine_arguments)
        );

        for plugin in Plugin::ALL {
            let name = plugin.name();
            let want = cli.plugin_toggles.get(name).and_then(|t| t.enabled)
                .or_else(|| file.plugin_toggles.get(name).and_then(|t| t.enabled))
                .unwrap_or(plugin.enabled_by_default());
            prop_assert_eq!(config.plugin_enabled(plugin), want, "plugin {}", name);
        }
    }

    #[test]
    fn prop_empty_sources_are_identity(env_port in proptest::option::of(3000u16..=64000)) {
        let snapshot = env_port
            .map(|port| vec![("PORT".to_string(), port.to_string())])
            .unwrap_or_default()
            .into_iter()
            .collect();
        let defaults = DefaultSource::load(&snapshot);
        let empty = PartialConfig::default();

        let merged = merge(&defaults, &empty, &empty);
        let mut layered = defaults.clone();
        overlay(&mut layered, &empty);
        prop_assert_eq!(layered, defaults);
        prop_assert_eq!(merged.service_options.listen_port, env_port.unwrap_or(3030));
    }

    #[test]
    fn prop_single_leaf_leaves_siblings_alone(port in 3000u16..=64000) {
        let mut cli = PartialConfig::default();
        cli.service_options.listen_port = Some(port);

        let config = merge(&DefaultSource::constants(), &PartialConfig::default(), &cli);
        let mut want = EffectiveConfig::default();
        want.service_options.listen_port = port;
        prop_assert_eq!(config, want);
    }
}
