//! Bootstrapper for a multi-worker prerender service.
//!
//! Resolves one effective configuration (see [`prerender_cluster_config`]),
//! propagates selected values into the process environment once per process
//! group, decides which middleware plugins to activate, and hands the
//! resolved options to an external rendering service.
//!
//! # Architecture
//!
//! ```text
//!  defaults ─┐
//!  file ─────┼─► merge ─► EffectiveConfig ─┬─► apply_environment (coordinator only)
//!  cli ──────┘                             ├─► broadcast_config  (coordinator only)
//!                                          ├─► RenderServiceFactory::create
//!                                          └─► resolve_plugins ─► RenderService::mount
//! ```
//!
//! # Example
//!
//! ```
//! use prerender_cluster::{Bootstrapper, DryRunFactory, MemoryEnvironment, SingleProcess};
//! use prerender_cluster_config::{CliSource, EnvSnapshot};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cli = CliSource::parse_from(["prerender-cluster", "--port", "8080", "--logger"])?;
//! let mut bootstrapper = Bootstrapper::new(DryRunFactory::new(), SingleProcess::coordinator())
//!     .with_snapshot(EnvSnapshot::default())
//!     .with_environment(MemoryEnvironment::new());
//!
//! let handle = bootstrapper.bootstrap(&cli)?;
//! assert_eq!(handle.config().service_options.listen_port, 8080);
//! assert_eq!(handle.plugins().activated.len(), 3);
//! handle.start()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

#[macro_use]
mod macros;

mod bootstrap;
mod environment;
mod error;
mod plugins;
mod service;
mod topology;

pub use bootstrap::{resolve_config, Bootstrapper, ServiceHandle};
pub use environment::{
    apply_environment, AppliedOverride, EnvironmentStore, MemoryEnvironment, ProcessEnvironment,
};
pub use error::{BootstrapError, BootstrapResult};
pub use plugins::{resolve_plugins, Activation, PluginResolution};
pub use service::{DryRunFactory, DryRunService, RenderService, RenderServiceFactory};
pub use topology::{ProcessRole, ProcessTopology, SingleProcess, WORKER_ID_VAR};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
