use alloy_primitives::Address;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::chain::ETH_USD_FEED;
use crate::scheduler::SchedulerConfig;

/// Sepolia testnet.
pub const DEFAULT_CHAIN_ID: u64 = 11155111;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub network: Network,
    #[serde(default)]
    pub oracle: Option<Oracle>,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub general: General,
}

#[derive(Debug, Deserialize)]
pub struct Network {
    pub rpc_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    pub contract_address: Address,
}

#[derive(Debug, Deserialize)]
pub struct Oracle {
    pub rpc_url: String,
    #[serde(default = "default_feed")]
    pub feed_address: Address,
    #[serde(default = "default_oracle_poll")]
    pub poll_secs: u64,
}

impl Oracle {
    /// Poll period, never shorter than one second.
    pub fn poll_every(&self) -> Duration {
        Duration::from_secs(self.poll_secs.max(1))
    }
}

#[derive(Default, Deserialize)]
pub struct Credentials {
    pub private_key: Option<String>,
}

// Never print the key
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct General {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_refresh")]
    pub refresh_secs: u64,
}

impl Default for General {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            refresh_secs: default_refresh(),
        }
    }
}

fn default_chain_id() -> u64 {
    DEFAULT_CHAIN_ID
}

fn default_feed() -> Address {
    ETH_USD_FEED
}

fn default_oracle_poll() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_refresh() -> u64 {
    15
}

impl Config {
    /// Load the TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    /// `CONTRACT_ADDRESS`, `CHAIN_ID`, `RPC_URL` and `PRIVATE_KEY` win over
    /// the file.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(address) = var("CONTRACT_ADDRESS") {
            self.network.contract_address = address.trim().parse()?;
        }
        if let Some(chain_id) = var("CHAIN_ID") {
            self.network.chain_id = chain_id.trim().parse()?;
        }
        if let Some(rpc_url) = var("RPC_URL") {
            self.network.rpc_url = rpc_url;
        }
        if let Some(key) = var("PRIVATE_KEY") {
            self.credentials.private_key = Some(key);
        }
        Ok(())
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            refresh_every: Duration::from_secs(self.general.refresh_secs.max(1)),
            ..Default::default()
        }
    }
}
