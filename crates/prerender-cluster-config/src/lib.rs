//! Layered configuration for the prerender cluster.
//!
//! This crate resolves one effective configuration from three sources:
//! - built-in defaults, seeded from an environment snapshot ([`DefaultSource`])
//! - an optional JSON or TOML document ([`FileSource`])
//! - command-line flags ([`CliSource`])
//!
//! # Overview
//!
//! Sources produce a [`PartialConfig`] each. [`merge`] layers them with the
//! precedence command line > file > defaults, leaf by leaf, and returns an
//! [`EffectiveConfig`] with three groups:
//!
//! - [`ServiceOptions`] - options for the rendering service
//! - environment overrides - [`EnvOverride`] values keyed by variable name
//! - plugin toggles - [`PluginToggle`] values keyed by plugin name
//!
//! # Example
//!
//! ```
//! use prerender_cluster_config::{merge, CliSource, DefaultSource, EnvSnapshot, FileSource};
//!
//! # fn main() -> Result<(), prerender_cluster_config::ConfigError> {
//! let cli = CliSource::parse_from(["prerender-cluster", "--port", "8080", "--workers", "4"])?;
//! let file = FileSource::load(cli.config_path.as_deref())?;
//! let defaults = DefaultSource::load(&EnvSnapshot::default());
//!
//! let config = merge(&defaults, &file, &cli.partial);
//! assert_eq!(config.service_options.listen_port, 8080);
//! assert_eq!(config.service_options.worker_count, 4);
//! assert_eq!(config.service_options.base_port, 12400);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```json
//! {
//!   "options": { "workers": 2, "port": 3030, "phantomArguments": ["--load-images=false"] },
//!   "env":     { "JS_TIMEOUT": { "set": true, "value": 20000 } },
//!   "plugins": { "logger": true, "basicAuth": { "load": true, "env": {} } }
//! }
//! ```

#![warn(missing_docs)]

mod cli;
mod defaults;
mod error;
mod file;
mod merge;
mod partial;
mod schema;
pub mod validate;

pub use cli::{CliArgs, CliSource};
pub use defaults::{DefaultSource, EnvSnapshot, BASE_PORT_VAR, ITERATIONS_VAR, PORT_VAR, WORKERS_VAR};
pub use error::{ConfigError, ErrorKind, ValidationError};
pub use file::{FileFormat, FileSource};
pub use merge::{merge, overlay};
pub use partial::*;
pub use schema::*;
pub use validate::{check_range, parse_boolean_switch, validate_integer, IntegerRule};
