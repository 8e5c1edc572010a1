//! Configuration System for credit-risk
//!
//! Supports:
//! - TOML configuration files
//! - Environment variable overrides
//! - Multiple config file locations
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./credit-risk.toml` - Project-local configuration
//! 2. `~/.config/credit-risk/config.toml` - User configuration (XDG)
//! 3. `~/.credit-risk/config.toml` - User configuration (legacy)
//! 4. `/etc/credit-risk/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `CREDIT_RISK_HOST` - Address to bind the HTTP server to
//! - `CREDIT_RISK_PORT` - HTTP server port (`PORT` is honoured as a fallback)
//! - `CREDIT_RISK_LOG_LEVEL` - Log filter when `RUST_LOG` is unset
//! - `CREDIT_RISK_DEFUZZ` - Defuzzification method (centroid, area-centroid)
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 5000
//! index_page = "./frontcredit.html"
//!
//! [logging]
//! level = "debug"
//!
//! [model]
//! defuzzification = "centroid"
//! ```

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::fuzzy::DefuzzificationMethod;

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RiskConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub model: ModelConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable CORS for all origins
    pub cors_enabled: bool,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
    /// HTML file served at `/`; the built-in page is used when unset
    pub index_page: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors_enabled: true,
            max_body_size: 64 * 1024,
            index_page: None,
        }
    }
}

impl ServerConfig {
    /// Set CORS permissiveness
    pub fn with_cors(mut self, enabled: bool) -> Self {
        self.cors_enabled = enabled;
        self
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "server.host",
                value: self.host.clone(),
            })
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
        }
    }
}

/// Log line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

/// Inference settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ModelConfig {
    pub defuzzification: DefuzzificationMethod,
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl RiskConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from an explicit file, or from the first default
    /// location that exists. Environment overrides are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::config_paths().into_iter().find(|p| p.exists()) {
                Some(path) => Self::load_from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            message: e.to_string(),
        })
    }

    /// Get the list of config file search paths
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./credit-risk.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("credit-risk").join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".credit-risk").join("config.toml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/credit-risk/config.toml"));

        paths
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Unparsable values are errors
    /// rather than being silently ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("CREDIT_RISK_HOST") {
            self.server.host = val;
        }

        if let Some(val) = lookup("CREDIT_RISK_PORT").or_else(|| lookup("PORT")) {
            self.server.port = val.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: "server.port",
                value: val.clone(),
            })?;
        }

        if let Some(val) = lookup("CREDIT_RISK_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Some(val) = lookup("CREDIT_RISK_DEFUZZ") {
            self.model.defuzzification = DefuzzificationMethod::from_str(&val).ok_or(
                ConfigError::InvalidValue {
                    key: "model.defuzzification",
                    value: val.clone(),
                },
            )?;
        }

        Ok(())
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Generate a default configuration file content
    pub fn default_config_content() -> &'static str {
        r#"# credit-risk configuration file

[server]
# Address and port of the HTTP service
host = "127.0.0.1"
port = 5000
# Allow browser clients from any origin
cors_enabled = true
# Maximum request body size (bytes)
max_body_size = 65536
# HTML page served at / (the built-in form is used when unset)
# index_page = "./frontcredit.html"

[logging]
# Filter directive used when RUST_LOG is unset, e.g. "info" or "credit_risk=debug"
level = "info"
# Log layout: full, compact
format = "full"

[model]
# Defuzzification: centroid, area-centroid
defuzzification = "centroid"
"#
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Parse error in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = RiskConfig::new();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.model.defuzzification, DefuzzificationMethod::Centroid);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [server]
            port = 9000
            index_page = "static/index.html"

            [logging]
            level = "debug"
            format = "compact"

            [model]
            defuzzification = "area-centroid"
        "#;

        let config = RiskConfig::load_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.index_page, Some(PathBuf::from("static/index.html")));
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.model.defuzzification, DefuzzificationMethod::AreaCentroid);
    }

    #[test]
    fn test_default_content_parses_to_defaults() {
        let config = RiskConfig::load_from_str(RiskConfig::default_config_content()).unwrap();
        assert_eq!(config, RiskConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = RiskConfig::load_from_str("[server\nport = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_overrides() {
        let mut config = RiskConfig::new();
        config
            .apply_overrides(lookup_from(&[
                ("CREDIT_RISK_HOST", "0.0.0.0"),
                ("CREDIT_RISK_PORT", "8081"),
                ("CREDIT_RISK_LOG_LEVEL", "credit_risk=trace"),
                ("CREDIT_RISK_DEFUZZ", "area"),
            ]))
            .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.logging.level, "credit_risk=trace");
        assert_eq!(config.model.defuzzification, DefuzzificationMethod::AreaCentroid);
    }

    #[test]
    fn test_port_fallback_and_precedence() {
        let mut config = RiskConfig::new();
        config.apply_overrides(lookup_from(&[("PORT", "7000")])).unwrap();
        assert_eq!(config.server.port, 7000);

        config
            .apply_overrides(lookup_from(&[("PORT", "7000"), ("CREDIT_RISK_PORT", "7001")]))
            .unwrap();
        assert_eq!(config.server.port, 7001);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let mut config = RiskConfig::new();
        let err = config
            .apply_overrides(lookup_from(&[("CREDIT_RISK_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "server.port", .. }));

        let err = config
            .apply_overrides(lookup_from(&[("CREDIT_RISK_DEFUZZ", "bisector")]))
            .unwrap_err();
        assert!(err.to_string().contains("model.defuzzification"));
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().port(), 5000);

        let bad = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 6123").unwrap();
        let config = RiskConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 6123);

        let missing = RiskConfig::load_from_file(Path::new("/nonexistent/credit-risk.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_serialize_config() {
        let toml = RiskConfig::new().to_toml().unwrap();
        assert!(toml.contains("[server]"));
        assert!(toml.contains("[model]"));
        assert!(toml.contains("centroid"));
    }

    #[test]
    fn test_config_paths() {
        let paths = RiskConfig::config_paths();
        assert!(paths[0].ends_with("credit-risk.toml"));
    }
}
