//! # Simulator Settings
//!
//! Everything a run needs besides the chosen operation. Values come from,
//! in increasing priority: built-in defaults, an optional TOML file,
//! environment variables (handled by clap), and command-line flags.
//!
//! ```toml
//! access_node = "http://127.0.0.1:8888"
//! profile = "flowEmulator"
//! cadence_root = ".."
//!
//! [contracts]
//! OmniverseNFT = "0xf8d6e0586b0a20c7"
//!
//! [[accounts]]
//! name = "owner"
//! address = "0xf8d6e0586b0a20c7"
//! private_key = "69e7..."
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use omniverse_protocol::config::{
    DEFAULT_ACCESS_NODE, DEFAULT_GAS_LIMIT, DEFAULT_POLL_INTERVAL, DEFAULT_PROFILE,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_SETTLEMENT_TIMEOUT, NFT_CONTRACT_NAME,
};
use omniverse_protocol::dispatch::{CadenceSource, FlowRestConfig};
use omniverse_protocol::identity::{AccountConfig, AddressError, FlowAddress, RegistryConfig};

use crate::cli::SimulatorCli;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid access node URL {url:?}: {source}")]
    AccessNode {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("contract {name} has an invalid address: {source}")]
    ContractAddress {
        name: String,
        #[source]
        source: AddressError,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Resolved run settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Access node REST endpoint.
    pub access_node: String,
    /// Chain label used in mint payloads.
    pub profile: String,
    /// Directory holding `transactions/` and `scripts/`.
    pub cadence_root: PathBuf,
    pub gas_limit: u64,
    pub settlement_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    /// Import placeholder name to deployment address.
    pub contracts: BTreeMap<String, String>,
    /// Replaces the built-in emulator accounts when present.
    pub accounts: Option<Vec<AccountConfig>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            access_node: DEFAULT_ACCESS_NODE.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            cadence_root: PathBuf::from(".."),
            gas_limit: DEFAULT_GAS_LIMIT,
            settlement_timeout_secs: DEFAULT_SETTLEMENT_TIMEOUT.as_secs(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            contracts: BTreeMap::new(),
            accounts: None,
        }
    }
}

impl Settings {
    /// Read a settings file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, then the `--config` file if given, then CLI overrides.
    pub fn resolve(cli: &SimulatorCli) -> Result<Self, SettingsError> {
        let mut settings = match &cli.config {
            Some(path) => {
                let settings = Self::from_file(path)?;
                tracing::debug!(path = %path.display(), "settings file loaded");
                settings
            }
            None => Self::default(),
        };
        settings.apply_overrides(cli);
        settings.validate()?;
        Ok(settings)
    }

    fn apply_overrides(&mut self, cli: &SimulatorCli) {
        if let Some(access_node) = &cli.access_node {
            self.access_node = access_node.clone();
        }
        if let Some(profile) = &cli.profile {
            self.profile = profile.clone();
        }
        if let Some(root) = &cli.cadence_root {
            self.cadence_root = root.clone();
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        url::Url::parse(&self.access_node).map_err(|source| SettingsError::AccessNode {
            url: self.access_node.clone(),
            source,
        })?;
        if self.gas_limit == 0 {
            return Err(SettingsError::Zero("gas_limit"));
        }
        if self.poll_interval_ms == 0 {
            return Err(SettingsError::Zero("poll_interval_ms"));
        }
        if self.request_timeout_secs == 0 {
            return Err(SettingsError::Zero("request_timeout_secs"));
        }
        self.contract_addresses()?;
        Ok(())
    }

    /// Configured accounts, or the emulator's four when none are listed.
    pub fn registry_config(&self) -> RegistryConfig {
        match &self.accounts {
            Some(accounts) => RegistryConfig {
                accounts: accounts.clone(),
            },
            None => RegistryConfig::emulator(),
        }
    }

    pub fn rest_config(&self) -> FlowRestConfig {
        FlowRestConfig {
            access_node: self.access_node.clone(),
            gas_limit: self.gas_limit,
            settlement_timeout: Duration::from_secs(self.settlement_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn cadence_source(&self) -> Result<CadenceSource, SettingsError> {
        let source = self
            .contract_addresses()?
            .into_iter()
            .fold(CadenceSource::new(&self.cadence_root), |source, (name, address)| {
                source.with_alias(&name, address)
            });
        Ok(source)
    }

    /// Address the NFT contract is deployed at, if configured.
    pub fn nft_contract(&self) -> Result<Option<FlowAddress>, SettingsError> {
        Ok(self
            .contract_addresses()?
            .into_iter()
            .find(|(name, _)| name.trim_start_matches("0x") == NFT_CONTRACT_NAME)
            .map(|(_, address)| address))
    }

    fn contract_addresses(&self) -> Result<Vec<(String, FlowAddress)>, SettingsError> {
        self.contracts
            .iter()
            .map(|(name, address)| {
                address
                    .parse::<FlowAddress>()
                    .map(|a| (name.clone(), a))
                    .map_err(|source| SettingsError::ContractAddress {
                        name: name.clone(),
                        source,
                    })
            })
            .collect()
    }
}
