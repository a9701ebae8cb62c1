//! Startup orchestration.
//!
//! Order of operations:
//!
//! 1. load defaults, the configuration file, and the command line
//! 2. merge them into one [`EffectiveConfig`]
//! 3. on the coordinator, apply environment overrides and broadcast
//! 4. construct the rendering service from the service options
//! 5. resolve and mount plugins
//!
//! The returned [`ServiceHandle`] is started by the caller.

use std::sync::Arc;

use prerender_cluster_config::{
    merge, CliSource, DefaultSource, EffectiveConfig, EnvSnapshot, FileSource, PartialConfig,
};
use tracing::info;

use crate::{
    apply_environment, resolve_plugins, AppliedOverride, BootstrapResult, EnvironmentStore,
    PluginResolution, ProcessEnvironment, ProcessRole, ProcessTopology, RenderService,
    RenderServiceFactory,
};

/// Resolve the effective configuration from every source.
///
/// A configuration file that cannot be loaded is logged and skipped; the
/// result is then built from defaults and the command line alone.
pub fn resolve_config(cli: &CliSource, env: &EnvSnapshot, role: ProcessRole) -> EffectiveConfig {
    let defaults = DefaultSource::load(env);

    let file = match FileSource::load(cli.config_path.as_deref()) {
        Ok(file) => {
            if let Some(path) = &cli.config_path {
                group_info!(role, path = %path.display(), "configuration file loaded");
            }
            file
        }
        Err(e) => {
            group_warn!(
                role,
                error = %e,
                remediation = %e.remediation,
                "configuration file ignored, continuing with defaults and command line"
            );
            PartialConfig::default()
        }
    };

    merge(&defaults, &file, &cli.partial)
}

/// Runs the startup sequence against injected collaborators.
#[derive(Debug)]
pub struct Bootstrapper<F, T, E = ProcessEnvironment> {
    factory: F,
    topology: T,
    environment: E,
    snapshot: EnvSnapshot,
}

impl<F, T> Bootstrapper<F, T>
where
    F: RenderServiceFactory,
    T: ProcessTopology,
{
    /// Create a bootstrapper that writes to the real process environment.
    ///
    /// The environment snapshot used for defaults is captured now.
    pub fn new(factory: F, topology: T) -> Self {
        Self {
            factory,
            topology,
            environment: ProcessEnvironment,
            snapshot: EnvSnapshot::capture(),
        }
    }
}

impl<F, T, E> Bootstrapper<F, T, E>
where
    F: RenderServiceFactory,
    T: ProcessTopology,
    E: EnvironmentStore,
{
    /// Use a different environment store for overrides.
    pub fn with_environment<E2: EnvironmentStore>(self, environment: E2) -> Bootstrapper<F, T, E2> {
        Bootstrapper {
            factory: self.factory,
            topology: self.topology,
            environment,
            snapshot: self.snapshot,
        }
    }

    /// Use a different snapshot to seed the defaults.
    pub fn with_snapshot(mut self, snapshot: EnvSnapshot) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// The environment store.
    pub fn environment(&self) -> &E {
        &self.environment
    }

    /// The process topology.
    pub fn topology(&self) -> &T {
        &self.topology
    }

    /// Run the startup sequence and return a handle ready to start.
    pub fn bootstrap(&mut self, cli: &CliSource) -> BootstrapResult<ServiceHandle<F::Service>> {
        let role = self.topology.role();

        let config = match self.topology.received_config() {
            Some(config) => config,
            None => Arc::new(resolve_config(cli, &self.snapshot, role)),
        };

        let applied = if role.is_coordinator() {
            let applied = apply_environment(&config, role, &mut self.environment);
            self.topology.broadcast_config(Arc::clone(&config))?;
            applied
        } else {
            Vec::new()
        };

        let mut service = self.factory.create(&config.service_options)?;
        let plugins = resolve_plugins(&config, &service.capabilities(), role);
        for activation in &plugins.activated {
            service.mount(activation.plugin, &activation.config)?;
        }

        group_info!(
            role,
            role = %role,
            workers = config.service_options.effective_worker_count(),
            port = config.service_options.listen_port,
            plugins = ?plugins.activated_names(),
            "bootstrap complete"
        );

        Ok(ServiceHandle {
            role,
            config,
            applied,
            plugins,
            service,
        })
    }
}

/// A configured rendering service, not yet started.
#[derive(Debug)]
pub struct ServiceHandle<S> {
    role: ProcessRole,
    config: Arc<EffectiveConfig>,
    applied: Vec<AppliedOverride>,
    plugins: PluginResolution,
    service: S,
}

impl<S: RenderService> ServiceHandle<S> {
    /// Role of this process.
    pub fn role(&self) -> ProcessRole {
        self.role
    }

    /// The effective configuration.
    pub fn config(&self) -> &Arc<EffectiveConfig> {
        &self.config
    }

    /// Environment overrides written during bootstrap.
    pub fn applied_overrides(&self) -> &[AppliedOverride] {
        &self.applied
    }

    /// Plugin activation outcome.
    pub fn plugins(&self) -> &PluginResolution {
        &self.plugins
    }

    /// The configured service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Start the service.
    pub fn start(self) -> BootstrapResult<()> {
        info!(role = %self.role, "starting rendering service");
        self.service.start()
    }
}
