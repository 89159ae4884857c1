//! Process configuration, read from a JSON file.
use std::{net::SocketAddr, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "ETHWATCH_CONFIG";

/// Default HTTP listen address.
pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:8080";

/// Default node JSON-RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Indexer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Address the HTTP API binds to.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Node JSON-RPC URL.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Seconds between ingestion ticks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Per-request RPC timeout in seconds.
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
}

fn default_listen_address() -> String {
    DEFAULT_LISTEN_ADDRESS.to_string()
}

fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            rpc_url: default_rpc_url(),
            poll_interval_secs: default_poll_interval_secs(),
            rpc_timeout_secs: default_rpc_timeout_secs(),
        }
    }
}

impl Config {
    /// Load and validate the JSON file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config from {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by [`CONFIG_ENV`], or defaults when it is unset.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Reject values the process cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be greater than zero");
        }
        if self.rpc_timeout_secs == 0 {
            bail!("rpc_timeout_secs must be greater than zero");
        }
        if self.rpc_url.trim().is_empty() {
            bail!("rpc_url must not be empty");
        }
        self.listen_addr()?;
        Ok(())
    }

    /// Parsed [`listen_address`](Self::listen_address).
    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listen_address
            .parse()
            .with_context(|| format!("invalid listen_address {:?}", self.listen_address))
    }

    /// Tick interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// RPC request timeout.
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_gets_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        config.validate().unwrap();
    }

    #[test]
    fn loads_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"rpc_url": "https://node.example:8545", "poll_interval_secs": 12}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.rpc_url, "https://node.example:8545");
        assert_eq!(config.poll_interval_secs, 12);
        assert_eq!(config.listen_address, DEFAULT_LISTEN_ADDRESS);
    }

    #[test]
    fn rejects_unusable_values() {
        let zero_interval = Config {
            poll_interval_secs: 0,
            ..Config::default()
        };
        assert!(zero_interval.validate().is_err());

        let bad_listen = Config {
            listen_address: "localhost".into(),
            ..Config::default()
        };
        assert!(bad_listen.validate().is_err());

        let no_url = Config {
            rpc_url: " ".into(),
            ..Config::default()
        };
        assert!(no_url.validate().is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::from_file("/nonexistent/ethwatch.json").is_err());
    }
}
