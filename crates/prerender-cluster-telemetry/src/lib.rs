//! Logging for the prerender cluster.
//!
//! Every process in the cluster logs through `tracing`. This crate installs
//! the subscriber: JSON lines for log shippers, or a human-readable format
//! for terminals, filtered by `RUST_LOG` when it is set.
//!
//! Logs go to stderr so stdout stays free for `--print-config` output.
//!
//! # Example
//!
//! ```rust,ignore
//! use prerender_cluster_telemetry::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_env("info");
//! init_logging(&config)?;
//!
//! tracing::info!(port = 3030, "listening");
//! ```

#![warn(missing_docs)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat, FORMAT_VAR};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
