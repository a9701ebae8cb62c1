//! Configuration error types.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Classification of a [`ValidationError`].
///
/// Parse and range failures come from operator input on the command line and
/// abort startup. File and plugin failures come from best-effort sources and
/// are logged while resolution continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The value could not be parsed as the expected type.
    Parse,
    /// The value parsed but lies outside the allowed bounds.
    Range,
    /// The configuration file is missing, unreadable, or corrupt.
    FileLoad,
    /// A plugin was requested that is unknown or not offered by the service.
    UnknownPlugin,
}

impl ErrorKind {
    /// Whether an error of this kind must stop startup.
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Parse | Self::Range)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parse => "parse error",
            Self::Range => "range error",
            Self::FileLoad => "file load error",
            Self::UnknownPlugin => "unknown plugin",
        };
        f.write_str(name)
    }
}

/// A structured, renderable validation failure.
///
/// Never raised as a panic: callers print [`ValidationError::remediation`]
/// and then either exit or drop the offending source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} for {field}: {reason} (got `{supplied_value}`)")]
pub struct ValidationError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// The flag, file, or configuration path the value came from.
    pub field: String,
    /// The raw value as supplied by the operator.
    pub supplied_value: String,
    /// Short machine-stable reason, e.g. `"not a number"`.
    pub reason: String,
    /// Human-readable advice on how to fix the input.
    pub remediation: String,
}

impl ValidationError {
    /// Create a new validation error.
    pub fn new(
        kind: ErrorKind,
        field: impl Into<String>,
        supplied_value: impl Into<String>,
        reason: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            field: field.into(),
            supplied_value: supplied_value.into(),
            reason: reason.into(),
            remediation: remediation.into(),
        }
    }

    /// The supplied value is not a base-10 integer.
    pub fn not_a_number(raw: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Parse,
            "value",
            raw,
            "not a number",
            "supply a base-10 integer",
        )
    }

    /// The supplied value lies outside `[min, max]`, or is a forbidden zero.
    pub fn out_of_range(raw: impl Into<String>, min: i64, max: i64) -> Self {
        Self::new(
            ErrorKind::Range,
            "value",
            raw,
            "out of range",
            format!("supply a number between {min} and {max}"),
        )
    }

    /// The configuration file at `path` could not be used.
    pub fn file_load(path: &Path, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::FileLoad,
            "--config",
            path.display().to_string(),
            reason,
            "check the --config path and JSON syntax; continuing with defaults and command-line values",
        )
    }

    /// The plugin name is not part of the known plugin set.
    pub fn unknown_plugin(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            ErrorKind::UnknownPlugin,
            format!("plugins.{name}"),
            name,
            "not recognized",
            "remove the entry or use one of the known plugin names",
        )
    }

    /// The plugin is known but the rendering service does not offer it.
    pub fn unavailable_plugin(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            ErrorKind::UnknownPlugin,
            format!("plugins.{name}"),
            name,
            "not available",
            "the rendering service does not provide this capability; it will not be loaded",
        )
    }

    /// Attribute the error to a specific flag or configuration path.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Replace the remediation text.
    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = remediation.into();
        self
    }

    /// Whether this error must stop startup.
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

/// Errors that can occur while collecting configuration sources.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A supplied value failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The command line itself is malformed, or help/version was requested.
    #[error(transparent)]
    Usage(#[from] clap::Error),
}

impl ConfigError {
    /// Whether this error must stop startup.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Validation(e) => e.is_fatal(),
            Self::Usage(_) => true,
        }
    }
}
