//! # Account Registry
//!
//! The fixed set of identities the simulator signs as. The registry is built
//! once from a [`RegistryConfig`] and never mutated afterwards; every lookup
//! hands out a shared reference.
//!
//! Construction validates everything up front (addresses, key material, name
//! and signer uniqueness), so a registry that exists is a registry whose
//! identities can all sign.

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use super::address::{AddressError, FlowAddress};
use crate::crypto::{Curve, HashAlgorithm, KeyError, PrivateKey, PublicKey};

/// Name of the identity that owns the Omniverse contracts.
pub const OWNER: &str = "owner";

/// Errors from building or querying the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("identity not registered: {0}")]
    NotFound(String),

    #[error("identity name registered twice: {0}")]
    DuplicateName(String),

    #[error("{address} key #{key_index} is assigned to more than one identity")]
    DuplicateSigner { address: FlowAddress, key_index: u32 },

    #[error("identity {name} has an invalid address: {source}")]
    InvalidAddress {
        name: String,
        #[source]
        source: AddressError,
    },

    #[error("identity {name} has invalid key material: {source}")]
    InvalidKey {
        name: String,
        #[source]
        source: KeyError,
    },

    #[error("registry configuration lists no identities")]
    Empty,
}

/// Literal description of one identity, as written in code or a settings
/// file.
#[derive(Clone, Deserialize)]
pub struct AccountConfig {
    pub name: String,
    pub address: String,
    pub private_key: String,
    #[serde(default)]
    pub key_index: u32,
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    #[serde(default)]
    pub curve: Curve,
}

impl AccountConfig {
    /// An identity with the emulator's defaults: key slot 0, SHA3-256,
    /// secp256k1.
    pub fn new(name: &str, address: &str, private_key: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            private_key: private_key.to_string(),
            key_index: 0,
            hash_algorithm: HashAlgorithm::Sha3_256,
            curve: Curve::Secp256k1,
        }
    }
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("private_key", &"[REDACTED]")
            .field("key_index", &self.key_index)
            .field("hash_algorithm", &self.hash_algorithm)
            .field("curve", &self.curve)
            .finish()
    }
}

/// Input to [`AccountRegistry::new`]. Order is preserved and becomes the
/// registry's iteration order.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub accounts: Vec<AccountConfig>,
}

impl RegistryConfig {
    /// The four identities provisioned on the local emulator for Omniverse
    /// testing.
    pub fn emulator() -> Self {
        Self {
            accounts: vec![
                AccountConfig::new(
                    OWNER,
                    "0xf8d6e0586b0a20c7",
                    "69e7e51ead557351ade7a575e947c4d4bd19dd8a6cdf00c51f9c7f6f721b72dc",
                ),
                AccountConfig::new(
                    "Alice",
                    "0x01cf0e2f2f715450",
                    "c9193930b34dd498378e36c35118a627d9eb500f6fd69b16d8e59db7cc8f5bb3",
                ),
                AccountConfig::new(
                    "Bob",
                    "0x179b6b1cb6755e31",
                    "d95472318e773b2046b078ae252c42082752c7b7876ce2770a2d3e00b02bbed5",
                ),
                AccountConfig::new(
                    "Carl",
                    "0xf3fcd2c1a78f5eee",
                    "f559fa403545e328ea024ef27e030a478634ae04212519e8bb5293add4b6dda4",
                ),
            ],
        }
    }
}

/// A named signer: address, key slot, key material, and signing parameters.
#[derive(Debug, Clone)]
pub struct IdentityRecord {
    name: String,
    address: FlowAddress,
    private_key: PrivateKey,
    key_index: u32,
    hash_algorithm: HashAlgorithm,
}

impl IdentityRecord {
    fn from_config(config: &AccountConfig) -> Result<Self, RegistryError> {
        let address = config
            .address
            .parse()
            .map_err(|source| RegistryError::InvalidAddress {
                name: config.name.clone(),
                source,
            })?;
        let private_key =
            PrivateKey::from_hex(config.curve, &config.private_key).map_err(|source| {
                RegistryError::InvalidKey {
                    name: config.name.clone(),
                    source,
                }
            })?;
        Ok(Self {
            name: config.name.clone(),
            address,
            private_key,
            key_index: config.key_index,
            hash_algorithm: config.hash_algorithm,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> FlowAddress {
        self.address
    }

    pub fn key_index(&self) -> u32 {
        self.key_index
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    pub fn curve(&self) -> Curve {
        self.private_key.curve()
    }

    /// The identity's public key, recomputed from its private key.
    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }

    /// Sign `message` with this identity's key and hash algorithm.
    pub fn sign(&self, message: &[u8]) -> Result<[u8; 64], KeyError> {
        self.private_key.sign(self.hash_algorithm, message)
    }
}

/// Immutable name → identity mapping.
#[derive(Debug, Clone)]
pub struct AccountRegistry {
    identities: Vec<IdentityRecord>,
}

impl AccountRegistry {
    /// Validate `config` and build the registry. Fails without producing a
    /// partial registry.
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        if config.accounts.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut identities: Vec<IdentityRecord> = Vec::with_capacity(config.accounts.len());
        for account in &config.accounts {
            let record = IdentityRecord::from_config(account)?;
            if identities.iter().any(|r| r.name == record.name) {
                return Err(RegistryError::DuplicateName(record.name));
            }
            if identities
                .iter()
                .any(|r| r.address == record.address && r.key_index == record.key_index)
            {
                return Err(RegistryError::DuplicateSigner {
                    address: record.address,
                    key_index: record.key_index,
                });
            }
            identities.push(record);
        }

        tracing::debug!(count = identities.len(), "account registry built");
        Ok(Self { identities })
    }

    /// Look up an identity by name.
    pub fn lookup(&self, name: &str) -> Result<&IdentityRecord, RegistryError> {
        self.identities
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Identities in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &IdentityRecord> {
        self.identities.iter()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
