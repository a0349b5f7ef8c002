use serde::Deserialize;

use crate::model::Transport;

#[derive(Debug, Default, Deserialize)]
pub struct ApiFestConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Selector identifier: `rest`, `graphql`, `jsonrpc` or `trpc`.
    #[serde(default = "default_transport")]
    pub transport: String,
    #[serde(default)]
    pub trpc_batch: bool,
}

impl ClientConfig {
    pub fn transport(&self) -> Result<Transport, super::ConfigError> {
        self.transport
            .parse()
            .map_err(|_| super::ConfigError::UnknownTransport(self.transport.clone()))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            transport: default_transport(),
            trpc_batch: false,
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:3000".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}
fn default_timeout() -> u64 {
    10
}
fn default_transport() -> String {
    "rest".to_string()
}
