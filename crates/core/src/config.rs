//! Gateway configuration sourced from the process environment

use crate::{ClawError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use url::Url;

/// Default SearXNG base address
pub const DEFAULT_UPSTREAM_URL: &str = "http://localhost:8888";
/// Default time-to-live for cached envelopes, in seconds
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Runtime configuration for the gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base address of the SearXNG instance
    pub upstream_url: Url,
    /// Allowed API keys; empty disables authentication
    pub api_keys: Vec<String>,
    /// Lifetime of a cached response envelope
    pub cache_ttl: Duration,
    /// Redis address; `None` runs on the in-process store only
    pub external_store_url: Option<String>,
    /// Host to bind
    pub listen_host: String,
    /// Port to bind
    pub listen_port: u16,
    /// Deadline for one upstream search call
    pub upstream_timeout: Duration,
    /// Deadline for Redis connection checks and operations
    pub external_store_timeout: Duration,
}

/// Raw environment view, one field per recognized variable
#[derive(Debug, Deserialize)]
struct EnvSettings {
    #[serde(default = "default_upstream_url")]
    upstream_url: String,
    #[serde(default)]
    api_keys: String,
    #[serde(default = "default_cache_ttl_seconds")]
    cache_ttl_seconds: u64,
    #[serde(default)]
    external_store_url: Option<String>,
    #[serde(default = "default_listen_host")]
    listen_host: String,
    #[serde(default = "default_listen_port")]
    listen_port: u16,
    #[serde(default = "default_upstream_timeout_seconds")]
    upstream_timeout_seconds: u64,
    #[serde(default = "default_external_store_timeout_ms")]
    external_store_timeout_ms: u64,
}

fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

fn default_cache_ttl_seconds() -> u64 {
    DEFAULT_CACHE_TTL_SECONDS
}

fn default_listen_host() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    8000
}

fn default_upstream_timeout_seconds() -> u64 {
    30
}

fn default_external_store_timeout_ms() -> u64 {
    2000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            upstream_url: Url::parse(DEFAULT_UPSTREAM_URL).expect("default upstream URL is valid"),
            api_keys: Vec::new(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
            external_store_url: None,
            listen_host: default_listen_host(),
            listen_port: default_listen_port(),
            upstream_timeout: Duration::from_secs(default_upstream_timeout_seconds()),
            external_store_timeout: Duration::from_millis(default_external_store_timeout_ms()),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(config::Environment::default())
    }

    /// Load configuration from an explicit variable map instead of the
    /// process environment
    pub fn from_env_map(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(config::Environment::default().source(Some(vars)))
    }

    fn load(source: config::Environment) -> Result<Self> {
        let settings: EnvSettings = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: EnvSettings) -> Result<Self> {
        let upstream_url = Url::parse(settings.upstream_url.trim())?;

        if settings.cache_ttl_seconds == 0 {
            return Err(ClawError::validation(
                "CACHE_TTL_SECONDS must be at least 1",
            ));
        }

        let external_store_url = settings
            .external_store_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        Ok(Self {
            upstream_url,
            api_keys: parse_api_keys(&settings.api_keys),
            cache_ttl: Duration::from_secs(settings.cache_ttl_seconds),
            external_store_url,
            listen_host: settings.listen_host,
            listen_port: settings.listen_port,
            upstream_timeout: Duration::from_secs(settings.upstream_timeout_seconds),
            external_store_timeout: Duration::from_millis(settings.external_store_timeout_ms),
        })
    }

    /// Whether requests must present an allowed API key
    pub fn auth_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }

    /// Socket address the server binds to
    ///
    /// `LISTEN_HOST` must be an IPv4 or IPv6 literal (brackets optional) or
    /// `localhost`.
    pub fn bind_address(&self) -> Result<SocketAddr> {
        let host = self.listen_host.trim();
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        let ip = if host.eq_ignore_ascii_case("localhost") {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            host.parse::<IpAddr>().map_err(|e| {
                ClawError::validation(format!("Invalid LISTEN_HOST '{}': {}", self.listen_host, e))
            })?
        };

        Ok(SocketAddr::new(ip, self.listen_port))
    }
}

/// Split a comma-separated allow-list, dropping blanks
pub fn parse_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = GatewayConfig::from_env_map(HashMap::new()).unwrap();
        assert_eq!(config.upstream_url.as_str(), "http://localhost:8888/");
        assert!(config.api_keys.is_empty());
        assert!(!config.auth_enabled());
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!(config.external_store_url.is_none());
        assert_eq!(config.bind_address().unwrap().to_string(), "0.0.0.0:8000");
        assert_eq!(config.upstream_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_recognized_variables() {
        let config = GatewayConfig::from_env_map(vars(&[
            ("UPSTREAM_URL", "http://searx.internal:8080"),
            ("API_KEYS", "alpha, beta,,"),
            ("CACHE_TTL_SECONDS", "60"),
            ("EXTERNAL_STORE_URL", "redis://cache:6379"),
            ("LISTEN_PORT", "9000"),
        ]))
        .unwrap();

        assert_eq!(config.upstream_url.host_str(), Some("searx.internal"));
        assert_eq!(config.api_keys, vec!["alpha", "beta"]);
        assert!(config.auth_enabled());
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(
            config.external_store_url.as_deref(),
            Some("redis://cache:6379")
        );
        assert_eq!(config.listen_port, 9000);
    }

    #[test]
    fn test_blank_external_store_means_fallback_only() {
        let config =
            GatewayConfig::from_env_map(vars(&[("EXTERNAL_STORE_URL", "  ")])).unwrap();
        assert!(config.external_store_url.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(GatewayConfig::from_env_map(vars(&[("CACHE_TTL_SECONDS", "soon")])).is_err());
        assert!(GatewayConfig::from_env_map(vars(&[("CACHE_TTL_SECONDS", "0")])).is_err());
        assert!(GatewayConfig::from_env_map(vars(&[("UPSTREAM_URL", "not a url")])).is_err());
    }

    #[test]
    fn test_bind_address_accepts_ipv6_hosts() {
        for host in ["::", "[::]"] {
            let config = GatewayConfig::from_env_map(vars(&[("LISTEN_HOST", host)])).unwrap();
            let addr = config.bind_address().unwrap();
            assert!(addr.is_ipv6());
            assert_eq!(addr.port(), 8000);
            assert_eq!(addr.to_string(), "[::]:8000");
        }

        let config = GatewayConfig::from_env_map(vars(&[
            ("LISTEN_HOST", "::1"),
            ("LISTEN_PORT", "9000"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address().unwrap().to_string(), "[::1]:9000");
    }

    #[test]
    fn test_bind_address_hosts() {
        let config =
            GatewayConfig::from_env_map(vars(&[("LISTEN_HOST", "localhost")])).unwrap();
        assert_eq!(config.bind_address().unwrap().to_string(), "127.0.0.1:8000");

        let config =
            GatewayConfig::from_env_map(vars(&[("LISTEN_HOST", "not-an-ip")])).unwrap();
        let err = config.bind_address().unwrap_err();
        assert!(matches!(err, ClawError::Validation { .. }));
    }

    #[test]
    fn test_parse_api_keys() {
        assert!(parse_api_keys("").is_empty());
        assert!(parse_api_keys(" , ").is_empty());
        assert_eq!(parse_api_keys("k1"), vec!["k1"]);
    }
}
