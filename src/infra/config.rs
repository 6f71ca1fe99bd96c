//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml
//!
//! Vendor credentials are never compiled in. They come from the file or,
//! preferably, from the environment (see [`Config::with_env_overrides`]).

use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

pub const ENV_ZEPTO_API_KEY: &str = "ZEPTO_API_KEY";
pub const ENV_ZEPTO_TEMPLATE_KEY: &str = "ZEPTO_TEMPLATE_KEY";
pub const ENV_NEARBY_API_BASE_URL: &str = "NEARBY_API_BASE_URL";
pub const ENV_VASTUSETU_API_BASE_URL: &str = "VASTUSETU_API_BASE_URL";
pub const ENV_EMAIL_PROXY_URL: &str = "EMAIL_PROXY_URL";
pub const ENV_CONFIG_FILE: &str = "CONFIG_FILE";

pub const DEFAULT_CONFIG_FILE: &str = "config/dev.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_cors_allow_origin")]
    pub cors_allow_origin: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            service_name: default_service_name(),
            cors_allow_origin: default_cors_allow_origin(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_service_name() -> String {
    "ZeptoMail Proxy Server".to_string()
}

fn default_cors_allow_origin() -> String {
    "*".to_string()
}

fn default_max_body_bytes() -> usize {
    100 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZeptoMailConfig {
    #[serde(default = "default_zepto_api_url")]
    pub api_url: String,
    /// Full Authorization header value (e.g. "Zoho-enczapikey ...")
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub template_key: Option<String>,
    #[serde(default = "default_from_address")]
    pub from_address: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl Default for ZeptoMailConfig {
    fn default() -> Self {
        Self {
            api_url: default_zepto_api_url(),
            api_key: None,
            template_key: None,
            from_address: default_from_address(),
            from_name: default_from_name(),
        }
    }
}

fn default_zepto_api_url() -> String {
    "https://api.zeptomail.in/v1.1/email/template".to_string()
}

fn default_from_address() -> String {
    "noreply@trippechalo.in".to_string()
}

fn default_from_name() -> String {
    "TrippeChalo".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NearbyConfig {
    /// Host serving the proximity webhooks
    #[serde(default = "default_nearby_base_url")]
    pub base_url: String,
    /// Host serving event/experience detail records
    #[serde(default = "default_detail_base_url")]
    pub detail_base_url: String,
    #[serde(default = "default_max_distance")]
    pub default_max_distance: String,
}

impl Default for NearbyConfig {
    fn default() -> Self {
        Self {
            base_url: default_nearby_base_url(),
            detail_base_url: default_detail_base_url(),
            default_max_distance: default_max_distance(),
        }
    }
}

fn default_nearby_base_url() -> String {
    "https://primary-production-b3fe0.up.railway.app".to_string()
}

fn default_detail_base_url() -> String {
    "https://www.vastusetu.com".to_string()
}

fn default_max_distance() -> String {
    "500".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BookingConfig {
    /// Defaults to the nearby detail host when unset
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailProxyConfig {
    #[serde(default = "default_email_proxy_url")]
    pub url: String,
}

impl Default for EmailProxyConfig {
    fn default() -> Self {
        Self { url: default_email_proxy_url() }
    }
}

fn default_email_proxy_url() -> String {
    "http://localhost:3001".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    /// Fixed position used in place of a device location source
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default = "default_location_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_location_maximum_age_ms")]
    pub maximum_age_ms: u64,
    #[serde(default = "default_enable_high_accuracy")]
    pub enable_high_accuracy: bool,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            lat: None,
            lng: None,
            timeout_ms: default_location_timeout_ms(),
            maximum_age_ms: default_location_maximum_age_ms(),
            enable_high_accuracy: default_enable_high_accuracy(),
        }
    }
}

fn default_location_timeout_ms() -> u64 {
    10_000
}

fn default_location_maximum_age_ms() -> u64 {
    300_000
}

fn default_enable_high_accuracy() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval_secs() }
    }
}

fn default_metrics_interval_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub zeptomail: ZeptoMailConfig,
    #[serde(default)]
    pub nearby: NearbyConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub email_proxy: EmailProxyConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    bind_address: String,
    port: u16,
    service_name: String,
    cors_allow_origin: String,
    max_body_bytes: usize,
    zepto_api_url: String,
    zepto_api_key: Option<String>,
    zepto_template_key: Option<String>,
    from_address: String,
    from_name: String,
    nearby_base_url: String,
    detail_base_url: String,
    default_max_distance: String,
    booking_base_url: Option<String>,
    email_proxy_url: String,
    fixed_location: Option<(f64, f64)>,
    location_timeout_ms: u64,
    location_maximum_age_ms: u64,
    location_high_accuracy: bool,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        let fixed_location = match (toml_config.location.lat, toml_config.location.lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        };

        Self {
            bind_address: toml_config.server.bind_address,
            port: toml_config.server.port,
            service_name: toml_config.server.service_name,
            cors_allow_origin: toml_config.server.cors_allow_origin,
            max_body_bytes: toml_config.server.max_body_bytes,
            zepto_api_url: toml_config.zeptomail.api_url,
            zepto_api_key: toml_config.zeptomail.api_key.filter(|s| !s.is_empty()),
            zepto_template_key: toml_config.zeptomail.template_key.filter(|s| !s.is_empty()),
            from_address: toml_config.zeptomail.from_address,
            from_name: toml_config.zeptomail.from_name,
            nearby_base_url: toml_config.nearby.base_url,
            detail_base_url: toml_config.nearby.detail_base_url,
            default_max_distance: toml_config.nearby.default_max_distance,
            booking_base_url: toml_config.booking.base_url,
            email_proxy_url: toml_config.email_proxy.url,
            fixed_location,
            location_timeout_ms: toml_config.location.timeout_ms,
            location_maximum_age_ms: toml_config.location.maximum_age_ms,
            location_high_accuracy: toml_config.location.enable_high_accuracy,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            config_file,
        }
    }

    /// Pick the config file: the `--config` value, else `CONFIG_FILE`,
    /// else [`DEFAULT_CONFIG_FILE`]
    pub fn resolve_config_path<F>(cli_path: Option<&str>, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        cli_path
            .filter(|path| !path.is_empty())
            .map(str::to_string)
            .or_else(|| lookup(ENV_CONFIG_FILE).filter(|path| !path.is_empty()))
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string())
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, path.display().to_string()))
    }

    /// Load configuration from a path, falling back to defaults, then apply
    /// environment overrides
    pub fn load_from_path(path: &str) -> Self {
        let config = match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}. Using defaults.", e);
                Self::default()
            }
        };
        config.with_env_overrides(|key| env::var(key).ok())
    }

    /// Resolve the path from the `--config` value and the environment, then load
    pub fn load(cli_path: Option<&str>) -> Self {
        Self::load_from_path(&Self::resolve_config_path(cli_path, |key| env::var(key).ok()))
    }

    /// Overlay secrets and per-environment URLs from a variable lookup.
    /// Empty values are ignored.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(key) = get(ENV_ZEPTO_API_KEY) {
            self.zepto_api_key = Some(key);
        }
        if let Some(key) = get(ENV_ZEPTO_TEMPLATE_KEY) {
            self.zepto_template_key = Some(key);
        }
        if let Some(url) = get(ENV_NEARBY_API_BASE_URL) {
            self.nearby_base_url = url;
        }
        if let Some(url) = get(ENV_VASTUSETU_API_BASE_URL) {
            self.detail_base_url = url;
        }
        if let Some(url) = get(ENV_EMAIL_PROXY_URL) {
            self.email_proxy_url = url;
        }
        self
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.bind_address, self.port))
    }

    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn cors_allow_origin(&self) -> &str {
        &self.cors_allow_origin
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    pub fn zepto_api_url(&self) -> &str {
        &self.zepto_api_url
    }

    pub fn zepto_api_key(&self) -> Option<&str> {
        self.zepto_api_key.as_deref()
    }

    pub fn zepto_template_key(&self) -> Option<&str> {
        self.zepto_template_key.as_deref()
    }

    pub fn from_address(&self) -> &str {
        &self.from_address
    }

    pub fn from_name(&self) -> &str {
        &self.from_name
    }

    pub fn nearby_base_url(&self) -> &str {
        &self.nearby_base_url
    }

    pub fn detail_base_url(&self) -> &str {
        &self.detail_base_url
    }

    pub fn default_max_distance(&self) -> &str {
        &self.default_max_distance
    }

    pub fn booking_base_url(&self) -> &str {
        self.booking_base_url.as_deref().unwrap_or(&self.detail_base_url)
    }

    pub fn email_proxy_url(&self) -> &str {
        &self.email_proxy_url
    }

    pub fn fixed_location(&self) -> Option<(f64, f64)> {
        self.fixed_location
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location_timeout_ms)
    }

    pub fn location_maximum_age(&self) -> Duration {
        Duration::from_millis(self.location_maximum_age_ms)
    }

    pub fn location_high_accuracy(&self) -> bool {
        self.location_high_accuracy
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }
}
