//! The rendering-service seam.
//!
//! The headless rendering engine is external. Bootstrapping constructs it
//! from [`ServiceOptions`], mounts the activated plugins, and hands it back
//! to the caller to start.

use std::collections::BTreeSet;

use prerender_cluster_config::{Plugin, PluginConfig, ServiceOptions};
use tracing::info;

use crate::BootstrapResult;

/// A rendering service accepting middleware plugins.
pub trait RenderService {
    /// Plugins this service can mount.
    fn capabilities(&self) -> BTreeSet<Plugin>;

    /// Mount one plugin with its settings.
    fn mount(&mut self, plugin: Plugin, config: &PluginConfig) -> BootstrapResult<()>;

    /// Start serving. Blocks for as long as the service runs.
    fn start(self) -> BootstrapResult<()>;
}

/// Builds a rendering service from resolved options.
pub trait RenderServiceFactory {
    /// Service type produced.
    type Service: RenderService;

    /// Construct the service.
    fn create(&self, options: &ServiceOptions) -> BootstrapResult<Self::Service>;
}

/// Builds [`DryRunService`]s.
#[derive(Debug, Clone)]
pub struct DryRunFactory {
    capabilities: BTreeSet<Plugin>,
}

impl DryRunFactory {
    /// A factory whose services offer every known plugin.
    pub fn new() -> Self {
        Self::with_capabilities(Plugin::ALL)
    }

    /// A factory whose services offer only the given plugins.
    pub fn with_capabilities(capabilities: impl IntoIterator<Item = Plugin>) -> Self {
        Self {
            capabilities: capabilities.into_iter().collect(),
        }
    }
}

impl Default for DryRunFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderServiceFactory for DryRunFactory {
    type Service = DryRunService;

    fn create(&self, options: &ServiceOptions) -> BootstrapResult<DryRunService> {
        Ok(DryRunService {
            options: options.clone(),
            capabilities: self.capabilities.clone(),
            mounted: Vec::new(),
        })
    }
}

/// A rendering service that records what it was given and renders nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct DryRunService {
    options: ServiceOptions,
    capabilities: BTreeSet<Plugin>,
    mounted: Vec<(Plugin, PluginConfig)>,
}

impl DryRunService {
    /// Options the service was built with.
    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    /// Plugins mounted so far, in mount order.
    pub fn mounted(&self) -> &[(Plugin, PluginConfig)] {
        &self.mounted
    }
}

impl RenderService for DryRunService {
    fn capabilities(&self) -> BTreeSet<Plugin> {
        self.capabilities.clone()
    }

    fn mount(&mut self, plugin: Plugin, config: &PluginConfig) -> BootstrapResult<()> {
        self.mounted.push((plugin, config.clone()));
        Ok(())
    }

    fn start(self) -> BootstrapResult<()> {
        let plugins: Vec<&str> = self.mounted.iter().map(|(p, _)| p.name()).collect();
        info!(
            workers = self.options.effective_worker_count(),
            port = self.options.listen_port,
            base_port = self.options.base_port,
            iterations = self.options.restart_after_n_requests,
            engine_arguments = ?self.options.engine_arguments,
            plugins = ?plugins,
            "dry run: rendering service resolved, not starting an engine"
        );
        Ok(())
    }
}
