//! Structured error handling for credit-risk
//!
//! Provides a single error type with:
//! - Numeric error codes grouped by category
//! - HTTP status code mapping for the web layer
//! - Context fields and hints that survive serialization
//!
//! # Error Categories
//!
//! - Validation (1xxx) - malformed or non-numeric inputs, reported as client errors
//! - Inference (2xxx) - failures while running the fuzzy pipeline
//! - Model (3xxx) - invalid membership functions or rule references
//! - Config (4xxx) - configuration values that cannot be applied
//! - Internal (9xxx)
//!
//! # Example
//!
//! ```rust,ignore
//! use credit_risk::error::{RiskError, ErrorCode};
//!
//! fn check_income(income: f64) -> Result<(), RiskError> {
//!     if !income.is_finite() {
//!         return Err(RiskError::new(ErrorCode::NonFiniteInput, "income must be finite")
//!             .with_context("field", "income")
//!             .with_hint("send a plain decimal number"));
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    /// Generic invalid input
    InvalidInput = 1000,
    /// A required field is absent
    MissingField = 1001,
    /// A field could not be read as a number
    NonNumericInput = 1002,
    /// NaN or infinite value
    NonFiniteInput = 1003,
    /// Request body is not valid JSON
    MalformedBody = 1004,

    // Inference errors (2xxx)
    /// Aggregated output set has zero membership everywhere
    DegenerateInference = 2001,
    /// An input variable has no value in the evaluation context
    MissingInput = 2002,

    // Model errors (3xxx)
    /// Generic model construction error
    ModelError = 3000,
    /// Breakpoints are not finite or not non-decreasing
    InvalidMembership = 3001,
    /// Rule references an undeclared variable
    UnknownVariable = 3002,
    /// Rule references an undeclared label
    UnknownLabel = 3003,
    /// Label declared twice on the same variable
    DuplicateLabel = 3004,

    // Config errors (4xxx)
    /// Generic config error
    ConfigError = 4000,
    /// Config value out of range or unknown
    InvalidConfigValue = 4001,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "Invalid input",
            ErrorCode::MissingField => "Missing required field",
            ErrorCode::NonNumericInput => "Non-numeric input",
            ErrorCode::NonFiniteInput => "Non-finite input",
            ErrorCode::MalformedBody => "Malformed request body",

            ErrorCode::DegenerateInference => "No rule fired for the given inputs",
            ErrorCode::MissingInput => "Missing input variable",

            ErrorCode::ModelError => "Model error",
            ErrorCode::InvalidMembership => "Invalid membership function",
            ErrorCode::UnknownVariable => "Unknown variable",
            ErrorCode::UnknownLabel => "Unknown label",
            ErrorCode::DuplicateLabel => "Duplicate label",

            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::InvalidConfigValue => "Invalid configuration value",

            ErrorCode::InternalError => "Internal error",
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::InvalidInput
            | ErrorCode::MissingField
            | ErrorCode::NonNumericInput
            | ErrorCode::NonFiniteInput
            | ErrorCode::MalformedBody => 400,

            ErrorCode::DegenerateInference
            | ErrorCode::MissingInput
            | ErrorCode::ModelError
            | ErrorCode::InvalidMembership
            | ErrorCode::UnknownVariable
            | ErrorCode::UnknownLabel
            | ErrorCode::DuplicateLabel
            | ErrorCode::ConfigError
            | ErrorCode::InvalidConfigValue
            | ErrorCode::InternalError => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for credit-risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional key-value context
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl RiskError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::MissingField, format!("'{}' is required", field))
            .with_context("field", field)
    }

    pub fn non_numeric(field: &str) -> Self {
        Self::new(ErrorCode::NonNumericInput, format!("'{}' must be a number", field))
            .with_context("field", field)
    }

    pub fn non_finite(field: &str, value: f64) -> Self {
        Self::new(
            ErrorCode::NonFiniteInput,
            format!("'{}' must be finite, got {}", field, value),
        )
        .with_context("field", field)
    }

    /// Zero total membership in the aggregated output set
    pub fn degenerate(variable: &str) -> Self {
        Self::new(
            ErrorCode::DegenerateInference,
            format!("no rule produced any membership for '{}'", variable),
        )
        .with_context("variable", variable)
        .with_hint("the inputs fall outside every rule's antecedent support")
    }

    pub fn missing_input(variable: &str) -> Self {
        Self::new(
            ErrorCode::MissingInput,
            format!("no crisp value supplied for input '{}'", variable),
        )
        .with_context("variable", variable)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.http_status())
    }
}

impl fmt::Display for RiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;
        if let Some(ref hint) = self.hint {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for RiskError {}

impl From<serde_json::Error> for RiskError {
    fn from(err: serde_json::Error) -> Self {
        RiskError::new(ErrorCode::MalformedBody, err.to_string()).with_context("format", "JSON")
    }
}

impl From<crate::config::ConfigError> for RiskError {
    fn from(err: crate::config::ConfigError) -> Self {
        use crate::config::ConfigError;

        let (code, key) = match &err {
            ConfigError::InvalidValue { key, .. } => (ErrorCode::InvalidConfigValue, Some(*key)),
            _ => (ErrorCode::ConfigError, None),
        };
        let mut risk = RiskError::new(code, err.to_string());
        if let ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } = &err {
            risk = risk.with_context("path", path.display().to_string());
        }
        if let Some(key) = key {
            risk = risk.with_context("key", key);
        }
        risk
    }
}

/// A Result type using RiskError
pub type RiskResult<T> = Result<T, RiskError>;

// ============================================================================
// Error response for HTTP APIs
// ============================================================================

/// Structured error body returned by the HTTP layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error indicator
    pub error: bool,
    /// Error code (string form)
    pub code: String,
    /// Numeric error code
    pub code_num: u32,
    /// HTTP status code
    pub status: u16,
    /// Error message
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl From<&RiskError> for ErrorResponse {
    fn from(err: &RiskError) -> Self {
        Self {
            error: true,
            code: format!("{:?}", err.code),
            code_num: err.code.code(),
            status: err.http_status(),
            message: err.message.clone(),
            details: err.context.clone(),
            hint: err.hint.clone(),
        }
    }
}

// ============================================================================
// Macros for convenient error creation
// ============================================================================

/// Bail out early with a RiskError
#[macro_export]
macro_rules! risk_bail {
    ($code:expr, $msg:expr) => {
        return Err($crate::error::RiskError::new($code, $msg))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::RiskError::new($code, format!($fmt, $($arg)*)))
    };
}

/// Ensure a condition holds, or return a RiskError
#[macro_export]
macro_rules! risk_ensure {
    ($cond:expr, $code:expr, $msg:expr) => {
        if !$cond {
            $crate::risk_bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::risk_bail!($code, $fmt, $($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_client_errors() {
        assert!(RiskError::missing_field("income").is_client_error());
        assert!(RiskError::non_numeric("debt").is_client_error());
        assert_eq!(RiskError::non_finite("income", f64::NAN).http_status(), 400);
    }

    #[test]
    fn test_degenerate_is_server_error() {
        let err = RiskError::degenerate("risk");
        assert_eq!(err.code, ErrorCode::DegenerateInference);
        assert!(err.is_server_error());
        assert!(!err.is_client_error());
        assert_eq!(err.context.get("variable").map(String::as_str), Some("risk"));
        assert!(err.hint.is_some());
    }

    #[test]
    fn test_display_includes_code_and_hint() {
        let err = RiskError::invalid_input("bad").with_hint("try again");
        let display = err.to_string();
        assert!(display.contains("[1000]"));
        assert!(display.contains("bad"));
        assert!(display.contains("try again"));
    }

    #[test]
    fn test_error_response_from_error() {
        let err = RiskError::missing_field("experience");
        let resp = ErrorResponse::from(&err);
        assert!(resp.error);
        assert_eq!(resp.status, 400);
        assert_eq!(resp.code, "MissingField");
        assert_eq!(resp.code_num, 1001);
        assert_eq!(resp.details.get("field").map(String::as_str), Some("experience"));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = RiskError::from(parse_err);
        assert_eq!(err.code, ErrorCode::MalformedBody);
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_config_error_conversion() {
        use crate::config::ConfigError;
        use std::path::PathBuf;

        let err = RiskError::from(ConfigError::InvalidValue {
            key: "server.port",
            value: "eighty".to_string(),
        });
        assert_eq!(err.code, ErrorCode::InvalidConfigValue);
        assert_eq!(err.context.get("key").map(String::as_str), Some("server.port"));
        assert!(err.is_server_error());

        let err = RiskError::from(ConfigError::Parse {
            path: PathBuf::from("credit-risk.toml"),
            message: "expected `]`".to_string(),
        });
        assert_eq!(err.code, ErrorCode::ConfigError);
        assert_eq!(err.code.code(), 4000);
        assert_eq!(err.context.get("path").map(String::as_str), Some("credit-risk.toml"));
    }

    fn ensure_positive(x: f64) -> RiskResult<f64> {
        crate::risk_ensure!(x > 0.0, ErrorCode::InvalidInput, "{} is not positive", x);
        Ok(x)
    }

    #[test]
    fn test_ensure_macro() {
        assert_eq!(ensure_positive(2.0), Ok(2.0));
        let err = ensure_positive(-1.0).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(err.message.contains("-1"));
    }
}
