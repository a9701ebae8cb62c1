//! Scalar validation for operator-supplied values.

use crate::ValidationError;

/// Inclusive integer bounds with an optional ban on zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerRule {
    /// Smallest accepted value.
    pub min: i64,
    /// Largest accepted value.
    pub max: i64,
    /// Reject zero even when it lies inside `[min, max]`.
    pub exclude_zero: bool,
}

impl IntegerRule {
    /// Create a rule accepting `[min, max]`.
    pub const fn new(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            exclude_zero: false,
        }
    }

    /// Validate a raw string against this rule.
    pub fn validate(&self, raw: &str) -> Result<i64, ValidationError> {
        validate_integer(raw, self.min, self.max, self.exclude_zero)
    }

    /// Validate an already-parsed value against this rule.
    pub fn check(&self, value: i64) -> Result<i64, ValidationError> {
        check_range(value, self.min, self.max, self.exclude_zero)
    }
}

/// Worker processes: 0 means one per available CPU.
pub const WORKERS: IntegerRule = IntegerRule::new(0, 128);

/// Requests served before the rendering engine is recycled.
pub const ITERATIONS: IntegerRule = IntegerRule::new(1, 500);

/// Port the service listens on.
pub const PORT: IntegerRule = IntegerRule::new(3000, 64000);

/// First port of the rendering engine cluster.
pub const BASE_PORT: IntegerRule = IntegerRule::new(3001, 64000);

/// Parse `raw` as a base-10 integer and check it lies in `[min, max]`.
///
/// Surrounding whitespace is ignored. When `exclude_zero` is set, zero is
/// rejected even if the range contains it.
///
/// # Example
///
/// ```
/// use prerender_cluster_config::{validate_integer, ErrorKind};
///
/// assert_eq!(validate_integer("50", 0, 100, false).unwrap(), 50);
/// assert_eq!(validate_integer("abc", 0, 100, false).unwrap_err().kind, ErrorKind::Parse);
/// assert_eq!(validate_integer("150", 0, 100, false).unwrap_err().kind, ErrorKind::Range);
/// ```
pub fn validate_integer(
    raw: &str,
    min: i64,
    max: i64,
    exclude_zero: bool,
) -> Result<i64, ValidationError> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::not_a_number(raw))?;

    check_range(value, min, max, exclude_zero)
}

/// Range-check a value that is already an integer.
pub fn check_range(
    value: i64,
    min: i64,
    max: i64,
    exclude_zero: bool,
) -> Result<i64, ValidationError> {
    if exclude_zero && value == 0 {
        return Err(ValidationError::out_of_range(value.to_string(), min, max)
            .with_remediation(format!("supply a non-zero number between {min} and {max}")));
    }

    if !(min..=max).contains(&value) {
        return Err(ValidationError::out_of_range(value.to_string(), min, max));
    }

    Ok(value)
}

/// Interpret an optional switch value.
///
/// A missing value, `true`, and every unrecognised token enable the switch.
/// Only an explicit false-equivalent token (`false`, `0`, `no`, `off`, any
/// case) disables it.
///
/// # Example
///
/// ```
/// use prerender_cluster_config::parse_boolean_switch;
///
/// assert!(parse_boolean_switch(None));
/// assert!(!parse_boolean_switch(Some("false")));
/// assert!(parse_boolean_switch(Some("anything-else")));
/// ```
pub fn parse_boolean_switch(raw: Option<&str>) -> bool {
    raw.map_or(true, |value| parse_bool(value) != Some(false))
}

/// Parse a boolean from a string.
pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
