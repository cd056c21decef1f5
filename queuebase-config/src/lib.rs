use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Pre-compiled regex for hostname validation (compiled once at first use)
static HOSTNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][-a-zA-Z0-9\.]*[a-zA-Z0-9]$").unwrap());

/// Liveness route served next to the gateway path.
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub logging: Option<LoggingSection>,
    #[serde(default)]
    pub gateway: Option<GatewaySection>,
    #[serde(default)]
    pub auth: Option<AuthSection>,
    /// Per-job config objects layered over the registered defaults.
    #[serde(default)]
    pub jobs: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct GatewaySection {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub body_limit_bytes: Option<usize>,
    #[serde(default)]
    pub invocation_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AuthSection {
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub keys: Option<BTreeMap<String, String>>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Load a RawConfigFile from a path. The format is inferred from the extension: .toml, .yaml/.yml, .json
pub fn load_raw_from_file<P: AsRef<Path>>(path: P) -> Result<RawConfigFile, ConfigError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    parse_config_str(&s, ext.as_deref())
}

/// Parse configuration from a string with optional format hint
#[inline]
fn parse_config_str(s: &str, ext: Option<&str>) -> Result<RawConfigFile, ConfigError> {
    match ext {
        #[cfg(feature = "toml")]
        Some("toml") => toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        #[cfg(feature = "yaml")]
        Some("yaml" | "yml") => {
            serde_yaml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
        }
        #[cfg(feature = "json")]
        Some("json") => serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        _ => parse_config_auto(s),
    }
}

/// Try to parse config by attempting each enabled format
#[inline]
fn parse_config_auto(s: &str) -> Result<RawConfigFile, ConfigError> {
    #[cfg(feature = "yaml")]
    if let Ok(cfg) = serde_yaml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "toml")]
    if let Ok(cfg) = toml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "json")]
    if let Ok(cfg) = serde_json::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(any(feature = "yaml", feature = "toml", feature = "json"))]
    {
        Err(ConfigError::Parse(
            "failed to parse config as any supported format".into(),
        ))
    }

    #[cfg(not(any(feature = "yaml", feature = "toml", feature = "json")))]
    {
        let _ = s; // suppress unused warning
        Err(ConfigError::Parse("no config format enabled".into()))
    }
}

/// Concrete application configuration with defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub gateway: GatewayConfig,
    pub auth: AuthConfig,
    pub jobs: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayConfig {
    /// Route serving both the list (GET) and invoke (POST) operations.
    pub path: String,
    pub body_limit_bytes: usize,
    /// Unset means handlers may run indefinitely.
    pub invocation_timeout_secs: Option<u64>,
}

impl GatewayConfig {
    #[inline]
    pub fn invocation_timeout(&self) -> Option<Duration> {
        self.invocation_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            path: "/api/queuebase".to_string(),
            body_limit_bytes: 1024 * 1024,
            invocation_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthConfig {
    /// Default secret, used when a request carries no key id.
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    /// Secrets selected by the `X-Queuebase-Key-Id` header.
    #[serde(skip_serializing)]
    pub keys: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
            gateway: GatewayConfig::default(),
            auth: AuthConfig {
                secret_key: None,
                keys: BTreeMap::new(),
            },
            jobs: BTreeMap::new(),
        }
    }
}

#[inline]
fn parse_bool(s: &str) -> Result<bool, ()> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(()),
    }
}

/// Helper macro to apply optional value if present
macro_rules! apply_opt {
    ($target:expr, $source:expr) => {
        if let Some(v) = $source {
            $target = v;
        }
    };
    ($target:expr, $source:expr, wrap) => {
        if let Some(v) = $source {
            $target = Some(v);
        }
    };
}

/// Load concrete `Config` from optional file and environment variables.
/// Environment variables take precedence over file values and defaults.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();

    if let Some(p) = path {
        let raw = load_raw_from_file(p)?;
        apply_raw(&mut cfg, raw);
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

/// Layer file values over `cfg`.
pub fn apply_raw(cfg: &mut Config, raw: RawConfigFile) {
    if let Some(server) = raw.server {
        apply_opt!(cfg.server.host, server.host);
        apply_opt!(cfg.server.port, server.port);
    }
    if let Some(logging) = raw.logging {
        apply_opt!(cfg.logging.level, logging.level);
        apply_opt!(cfg.logging.json, logging.json);
    }
    if let Some(gateway) = raw.gateway {
        apply_opt!(cfg.gateway.path, gateway.path);
        apply_opt!(cfg.gateway.body_limit_bytes, gateway.body_limit_bytes);
        apply_opt!(
            cfg.gateway.invocation_timeout_secs,
            gateway.invocation_timeout_secs,
            wrap
        );
    }
    if let Some(auth) = raw.auth {
        apply_opt!(cfg.auth.secret_key, auth.secret_key, wrap);
        apply_opt!(cfg.auth.keys, auth.keys);
    }
    if let Some(jobs) = raw.jobs {
        cfg.jobs.extend(jobs);
    }
}

/// Helper to parse env var as a specific type
#[inline]
fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Parse(format!("invalid {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

/// Helper to parse env var as bool
#[inline]
fn env_bool(key: &str) -> Result<Option<bool>, ConfigError> {
    match env::var(key) {
        Ok(v) => parse_bool(&v)
            .map(Some)
            .map_err(|_| ConfigError::Parse(format!("invalid {}", key))),
        Err(_) => Ok(None),
    }
}

/// Helper to get env var as string
#[inline]
fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Apply all environment variable overrides to config
fn apply_env_overrides(cfg: &mut Config) -> Result<(), ConfigError> {
    // Server
    if let Some(v) = env_str("QUEUEBASE_SERVER_HOST") {
        cfg.server.host = v;
    }
    if let Some(v) = env_parse::<u16>("QUEUEBASE_SERVER_PORT")? {
        cfg.server.port = v;
    }

    // Logging
    if let Some(v) = env_str("QUEUEBASE_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env_bool("QUEUEBASE_LOG_JSON")? {
        cfg.logging.json = v;
    }

    // Gateway
    if let Some(v) = env_str("QUEUEBASE_GATEWAY_PATH") {
        cfg.gateway.path = v;
    }
    if let Some(v) = env_parse::<usize>("QUEUEBASE_BODY_LIMIT_BYTES")? {
        cfg.gateway.body_limit_bytes = v;
    }
    if let Some(v) = env_parse::<u64>("QUEUEBASE_INVOCATION_TIMEOUT_SECS")? {
        cfg.gateway.invocation_timeout_secs = Some(v);
    }

    // Auth
    if let Some(v) = env_str("QUEUEBASE_SECRET_KEY") {
        cfg.auth.secret_key = Some(v);
    }

    Ok(())
}

/// Validate higher-level constraints on the resolved configuration.
pub fn validate_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.server.port == 0 {
        return Err(ConfigError::Validation("server.port must be > 0".into()));
    }
    let host_ok = cfg.server.host.parse::<std::net::IpAddr>().is_ok()
        || HOSTNAME_REGEX.is_match(&cfg.server.host);
    if !host_ok {
        return Err(ConfigError::Validation(format!(
            "invalid server.host: {}",
            cfg.server.host
        )));
    }

    if !cfg.gateway.path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "gateway.path must start with '/': {}",
            cfg.gateway.path
        )));
    }
    if cfg.gateway.path.contains(['{', '}', ':', '*']) {
        return Err(ConfigError::Validation(format!(
            "gateway.path must be a literal route without '{{', '}}', ':' or '*': {}",
            cfg.gateway.path
        )));
    }
    if cfg.gateway.path.trim_end_matches('/') == HEALTH_PATH {
        return Err(ConfigError::Validation(format!(
            "gateway.path must not be {HEALTH_PATH}"
        )));
    }
    if cfg.gateway.body_limit_bytes == 0 {
        return Err(ConfigError::Validation(
            "gateway.body_limit_bytes must be > 0".into(),
        ));
    }
    if cfg.gateway.invocation_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "gateway.invocation_timeout_secs must be > 0 when set".into(),
        ));
    }

    let has_default = cfg
        .auth
        .secret_key
        .as_deref()
        .is_some_and(|s| !s.is_empty());
    if !has_default && cfg.auth.keys.is_empty() {
        return Err(ConfigError::Validation(
            "no signing secret configured (set auth.secret_key or QUEUEBASE_SECRET_KEY)".into(),
        ));
    }
    if let Some((id, _)) = cfg.auth.keys.iter().find(|(_, secret)| secret.is_empty()) {
        return Err(ConfigError::Validation(format!(
            "auth.keys.{id} must not be empty"
        )));
    }

    if let Some((name, _)) = cfg.jobs.iter().find(|(_, v)| !v.is_object()) {
        return Err(ConfigError::Validation(format!(
            "jobs.{name} must be an object"
        )));
    }
    Ok(())
}
