//! Error types for bootstrapping the prerender cluster.

use prerender_cluster_config::ConfigError;
use prerender_cluster_telemetry::TelemetryError;
use thiserror::Error;

/// Errors that stop the cluster from starting.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration could not be collected.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The rendering service failed to construct, mount, or start.
    #[error("Service error: {message}")]
    Service {
        /// Error message.
        message: String,
    },

    /// The process topology rejected an operation.
    #[error("Topology error: {message}")]
    Topology {
        /// Error message.
        message: String,
    },

    /// Logging could not be initialized.
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}

impl BootstrapError {
    /// Create a service error.
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// Create a topology error.
    pub fn topology(message: impl Into<String>) -> Self {
        Self::Topology {
            message: message.into(),
        }
    }

    /// Get the error category for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Service { .. } => "service",
            Self::Topology { .. } => "topology",
            Self::Telemetry(_) => "telemetry",
        }
    }
}

/// Result type for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

#[cfg(test)]
mod tests {
    use super::*;
    use prerender_cluster_config::ValidationError;

    #[test]
    fn test_error_constructors() {
        let err = BootstrapError::service("engine binary not found");
        assert_eq!(err.category(), "service");
        assert!(err.to_string().contains("Service error"));

        let err = BootstrapError::topology("already broadcast");
        assert_eq!(err.category(), "topology");
    }

    #[test]
    fn test_from_config_error() {
        let err: BootstrapError = ConfigError::from(ValidationError::not_a_number("x")).into();
        assert_eq!(err.category(), "config");
        assert!(err.to_string().contains("not a number"));
    }
}
