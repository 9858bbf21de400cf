//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: ACTON_)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/acton-viewsets/{service_name}/config.toml
//! 4. System directory: /etc/acton-viewsets/{service_name}/config.toml
//! 5. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// ViewSet defaults shared by every registered ViewSet
    #[serde(default)]
    pub viewset: ViewSetConfig,

    /// Middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl ServiceConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// ViewSet configuration
///
/// These values seed [`PaginationSettings`](crate::pagination::PaginationSettings)
/// and the soft-delete column used by the query selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSetConfig {
    /// Page size used when the request does not specify `per_page`
    #[serde(default = "default_per_page")]
    pub default_per_page: u32,

    /// Upper bound for a requested `per_page`
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,

    /// Column holding the soft-delete timestamp
    #[serde(default = "default_soft_delete_field")]
    pub soft_delete_field: String,

    /// Maximum request payload size read into a request context, in bytes
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

impl ViewSetConfig {
    /// Reject page sizes and column names no ViewSet can work with
    pub fn validate(&self) -> Result<()> {
        if self.default_per_page == 0 || self.max_per_page == 0 {
            return Err(Error::ViewSet("page sizes must be at least 1".to_string()));
        }
        if self.default_per_page > self.max_per_page {
            return Err(Error::ViewSet(format!(
                "default_per_page ({}) exceeds max_per_page ({})",
                self.default_per_page, self.max_per_page
            )));
        }
        if self.soft_delete_field.trim().is_empty() {
            return Err(Error::ViewSet("soft_delete_field must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for ViewSetConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
            soft_delete_field: default_soft_delete_field(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

/// Middleware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Request body size limit in MB
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,

    /// Enable panic recovery middleware
    #[serde(default = "default_true")]
    pub catch_panic: bool,

    /// Enable compression
    #[serde(default = "default_true")]
    pub compression: bool,

    /// CORS configuration
    #[serde(default = "default_cors_mode")]
    pub cors_mode: String,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            body_limit_mb: default_body_limit_mb(),
            catch_panic: true,
            compression: true,
            cors_mode: default_cors_mode(),
        }
    }
}

// Default value functions
fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_true() -> bool {
    true
}

fn default_per_page() -> u32 {
    20
}

fn default_max_per_page() -> u32 {
    100
}

fn default_soft_delete_field() -> String {
    "deleted_at".to_string()
}

fn default_max_payload_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_body_limit_mb() -> usize {
    10 // 10 MB
}

fn default_cors_mode() -> String {
    "permissive".to_string()
}

impl Config {
    /// Load configuration for the current binary
    pub fn load() -> Result<Self> {
        // Try to infer service name from binary name or use default
        let service_name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "acton-viewsets".to_string());

        Self::load_for_service(&service_name)
    }

    /// Load configuration for a named service, searching all config locations
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let config_paths = Self::find_config_paths(service_name);

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut defaults = Config::default();
        defaults.service.name = service_name.to_string();

        let mut figment = Figment::new().merge(Serialized::defaults(defaults));

        // Lowest priority first so later files override earlier ones
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed("ACTON_").split("__"));

        let config: Config = figment.extract()?;
        config.viewset.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file path
    pub fn load_from(path: &str) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("ACTON_").split("__"))
            .extract::<Config>()?;

        config.viewset.validate()?;
        Ok(config)
    }

    fn find_config_paths(service_name: &str) -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Current working directory (highest priority for dev/testing)
        paths.push(PathBuf::from("config.toml"));

        // 2. XDG config directory (~/.config/acton-viewsets/{service_name}/config.toml)
        let xdg_dirs = xdg::BaseDirectories::with_prefix("acton-viewsets");
        let config_file_path = Path::new(service_name).join("config.toml");
        if let Some(path) = xdg_dirs.find_config_file(&config_file_path) {
            paths.push(path);
        }

        // 3. System-wide directory (/etc/acton-viewsets/{service_name}/config.toml)
        paths.push(
            PathBuf::from("/etc/acton-viewsets")
                .join(service_name)
                .join("config.toml"),
        );

        paths
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "acton-viewsets".to_string(),
                port: default_port(),
                log_level: default_log_level(),
                timeout_secs: default_timeout(),
                environment: default_environment(),
            },
            viewset: ViewSetConfig::default(),
            middleware: MiddlewareConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.port, 8080);
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.viewset.default_per_page, 20);
        assert_eq!(config.viewset.max_per_page, 100);
        assert_eq!(config.viewset.soft_delete_field, "deleted_at");
    }

    #[test]
    fn test_timeout_duration() {
        let config = Config::default();
        assert_eq!(config.service.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [service]
                name = "articles"
                port = 9000

                [viewset]
                default_per_page = 10
                "#,
            ))
            .extract()
            .expect("config should parse");

        assert_eq!(config.service.name, "articles");
        assert_eq!(config.service.port, 9000);
        assert_eq!(config.viewset.default_per_page, 10);
        assert_eq!(config.viewset.max_per_page, 100);
        assert_eq!(config.middleware.cors_mode, "permissive");
    }

    #[test]
    fn test_viewset_config_validation() {
        assert!(ViewSetConfig::default().validate().is_ok());

        let inverted = ViewSetConfig {
            default_per_page: 50,
            max_per_page: 10,
            ..ViewSetConfig::default()
        };
        assert!(matches!(inverted.validate(), Err(Error::ViewSet(_))));

        let unnamed = ViewSetConfig {
            soft_delete_field: " ".to_string(),
            ..ViewSetConfig::default()
        };
        assert!(unnamed.validate().is_err());
    }
}
