//! Integration tests for configuration loading

use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use trippe_gateway::infra::config::{
    DEFAULT_CONFIG_FILE, ENV_CONFIG_FILE, ENV_VASTUSETU_API_BASE_URL, ENV_ZEPTO_API_KEY,
};
use trippe_gateway::infra::Config;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[server]
bind_address = "127.0.0.1"
port = 8081
service_name = "mail-proxy"
cors_allow_origin = "https://trippechalo.in"
max_body_bytes = 4096

[zeptomail]
api_url = "http://localhost:9000/v1.1/email/template"
template_key = "tmpl-from-file"
from_address = "hello@example.com"
from_name = "Example"

[nearby]
base_url = "http://localhost:9001"
detail_base_url = "http://localhost:9002"
default_max_distance = "50"

[booking]
base_url = "http://localhost:9003"

[email_proxy]
url = "http://localhost:8081"

[location]
lat = 32.2432
lng = 77.1892
timeout_ms = 2500

[metrics]
interval_secs = 15
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.bind_addr().unwrap(), "127.0.0.1:8081".parse().unwrap());
    assert_eq!(config.service_name(), "mail-proxy");
    assert_eq!(config.cors_allow_origin(), "https://trippechalo.in");
    assert_eq!(config.max_body_bytes(), 4096);
    assert_eq!(config.zepto_api_url(), "http://localhost:9000/v1.1/email/template");
    assert_eq!(config.zepto_template_key(), Some("tmpl-from-file"));
    assert!(config.zepto_api_key().is_none());
    assert_eq!(config.from_address(), "hello@example.com");
    assert_eq!(config.nearby_base_url(), "http://localhost:9001");
    assert_eq!(config.detail_base_url(), "http://localhost:9002");
    assert_eq!(config.default_max_distance(), "50");
    assert_eq!(config.booking_base_url(), "http://localhost:9003");
    assert_eq!(config.email_proxy_url(), "http://localhost:8081");
    assert_eq!(config.fixed_location(), Some((32.2432, 77.1892)));
    assert_eq!(config.location_timeout(), Duration::from_millis(2500));
    assert_eq!(config.location_maximum_age(), Duration::from_secs(300));
    assert_eq!(config.metrics_interval_secs(), 15);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[server]\nport = 4000\n\n[location]\nlat = 1.0\n").unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.port(), 4000);
    assert_eq!(config.service_name(), "ZeptoMail Proxy Server");
    // a fixed location needs both coordinates
    assert!(config.fixed_location().is_none());
}

#[test]
fn test_invalid_toml_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[server\nport = ").unwrap();
    temp_file.flush().unwrap();

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config file"));
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.port(), 3001);
    assert_eq!(config.default_max_distance(), "500");
    assert_eq!(config.email_proxy_url(), "http://localhost:3001");
}

#[test]
fn test_env_overrides_file_values() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let content = "[zeptomail]\napi_key = \"from-file\"\n\n[nearby]\ndetail_base_url = \"http://file\"\n";
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    let config = config.with_env_overrides(|key| match key {
        k if k == ENV_ZEPTO_API_KEY => Some("from-env".to_string()),
        k if k == ENV_VASTUSETU_API_BASE_URL => Some("http://env".to_string()),
        _ => None,
    });

    assert_eq!(config.zepto_api_key(), Some("from-env"));
    assert_eq!(config.detail_base_url(), "http://env");
    // booking lookups follow the detail host unless configured
    assert_eq!(config.booking_base_url(), "http://env");
}

#[test]
fn test_config_file_variable_selects_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[server]\nport = 8443\n").unwrap();
    temp_file.flush().unwrap();

    let file_path = temp_file.path().display().to_string();
    let lookup = |key: &str| (key == ENV_CONFIG_FILE).then(|| file_path.clone());

    let path = Config::resolve_config_path(None, lookup);
    assert_eq!(path, file_path);
    let config = Config::load_from_path(&path);
    assert_eq!(config.port(), 8443);
    assert_eq!(config.config_file(), file_path);

    // an explicit --config value still wins
    assert_eq!(Config::resolve_config_path(Some("config/prod.toml"), lookup), "config/prod.toml");
    assert_eq!(Config::resolve_config_path(None, |_| None), DEFAULT_CONFIG_FILE);
}
