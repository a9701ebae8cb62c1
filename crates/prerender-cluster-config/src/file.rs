//! Configuration file source.
//!
//! Loads an optional JSON (or TOML) document mirroring the effective
//! configuration's shape. Any failure is reported as a
//! [`ErrorKind::FileLoad`](crate::ErrorKind::FileLoad) error, which callers
//! treat as recoverable.

use std::fs;
use std::path::Path;

use crate::validate::{BASE_PORT, ITERATIONS, PORT, WORKERS};
use crate::{IntegerRule, PartialConfig, ValidationError};

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// JSON document.
    Json,
    /// TOML document.
    Toml,
}

impl FileFormat {
    /// Pick a format from the file extension; anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// The middle-precedence configuration source.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSource;

impl FileSource {
    /// Load a configuration file.
    ///
    /// `None` yields an empty [`PartialConfig`]. A missing, unreadable,
    /// corrupt, or out-of-range document yields an error naming the path.
    ///
    /// # Example
    ///
    /// ```
    /// use prerender_cluster_config::FileSource;
    ///
    /// let partial = FileSource::load(None).unwrap();
    /// assert!(partial.is_empty());
    ///
    /// let err = FileSource::load(Some("/nonexistent/cfg.json".as_ref())).unwrap_err();
    /// assert!(!err.is_fatal());
    /// ```
    pub fn load(path: Option<&Path>) -> Result<PartialConfig, ValidationError> {
        let Some(path) = path else {
            return Ok(PartialConfig::default());
        };

        if !path.is_file() {
            return Err(ValidationError::file_load(path, "file does not exist"));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ValidationError::file_load(path, format!("could not be read: {e}")))?;

        Self::parse(&content, FileFormat::from_path(path)).map_err(|mut e| {
            if e.supplied_value == DOCUMENT {
                e.supplied_value = path.display().to_string();
            }
            e.field = format!("{} ({})", e.field, path.display());
            e
        })
    }

    /// Parse a document from a string.
    pub fn parse(content: &str, format: FileFormat) -> Result<PartialConfig, ValidationError> {
        let partial: PartialConfig = match format {
            FileFormat::Json => serde_json::from_str(content)
                .map_err(|e| parse_error(format!("is not valid JSON: {e}")))?,
            FileFormat::Toml => toml::from_str(content)
                .map_err(|e| parse_error(format!("is not valid TOML: {e}")))?,
        };

        check_bounds(&partial)?;
        Ok(partial)
    }
}

const DOCUMENT: &str = "<document>";

fn parse_error(reason: String) -> ValidationError {
    ValidationError::file_load(Path::new(DOCUMENT), reason)
}

// File values obey the same bounds as the matching command-line flags.
fn check_bounds(partial: &PartialConfig) -> Result<(), ValidationError> {
    let options = &partial.service_options;
    let checks: [(&str, Option<i64>, IntegerRule); 4] = [
        ("options.workers", options.worker_count.map(i64::from), WORKERS),
        ("options.iterations", options.restart_after_n_requests.map(i64::from), ITERATIONS),
        ("options.port", options.listen_port.map(i64::from), PORT),
        ("options.phantomBasePort", options.base_port.map(i64::from), BASE_PORT),
    ];

    for (field, value, rule) in checks {
        if let Some(value) = value {
            rule.check(value).map_err(|e| {
                ValidationError::new(
                    crate::ErrorKind::FileLoad,
                    field,
                    e.supplied_value,
                    format!("{field} is out of range"),
                    e.remediation,
                )
            })?;
        }
    }

    Ok(())
}
