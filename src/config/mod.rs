pub mod types;

pub use types::*;

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("client.base_url '{0}' must be an absolute http(s) URL")]
    InvalidBaseUrl(String),
    #[error("server.listen '{0}' is not a socket address")]
    InvalidListen(String),
    #[error("client.timeout_secs must be greater than zero")]
    ZeroTimeout,
    #[error("client.transport '{0}' is not one of rest, graphql, jsonrpc, trpc")]
    UnknownTransport(String),
}

pub fn load_config(path: &str) -> Result<ApiFestConfig, anyhow::Error> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {path}"))?;

    let config: ApiFestConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {path}"))?;

    config
        .validate()
        .with_context(|| format!("Config validation failed: {path}"))?;
    Ok(config)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_config_lenient(path: &str) -> Result<ApiFestConfig, anyhow::Error> {
    if !Path::new(path).exists() {
        tracing::debug!(path, "Config file not found, using defaults");
        return Ok(ApiFestConfig::default());
    }
    load_config(path)
}

impl ApiFestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server
            .listen
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidListen(self.server.listen.clone()))?;

        let base = &self.client.base_url;
        match reqwest::Url::parse(base) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            _ => return Err(ConfigError::InvalidBaseUrl(base.clone())),
        }

        if self.client.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        self.client.transport()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ApiFestConfig::default();
        config.validate().unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:3000");
        assert_eq!(config.client.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.client.timeout_secs, 10);
        assert!(config.server.metrics_enabled);
        assert!(!config.client.trpc_batch);
    }

    #[test]
    fn relative_base_url_is_rejected() {
        let mut config = ApiFestConfig::default();
        config.client.base_url = "/api".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
        config.client.base_url = "ftp://example.com".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = ApiFestConfig::default();
        config.client.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));
    }

    #[test]
    fn unknown_transport_is_rejected() {
        let mut config = ApiFestConfig::default();
        config.client.transport = "soap".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownTransport(_))
        ));
    }
}
