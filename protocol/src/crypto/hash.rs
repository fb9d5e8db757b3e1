//! # Hashing Utilities
//!
//! The digests an identity can sign with. Flow accounts declare a hashing
//! algorithm per key, so every signature the simulator produces is computed
//! over the digest that key declared:
//!
//! - **SHA3-256**: the emulator service account default and what the four
//!   simulated identities use.
//! - **SHA2-256**: the other algorithm Flow accepts for account keys.
//! - **Keccak-256**: the pre-standard SHA3 variant used on the EVM side of the
//!   Omniverse bridge.

use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha3::{Digest, Keccak256, Sha3_256};
use std::fmt;
use std::str::FromStr;

use super::keys::KeyError;

/// Hash function an identity uses when producing a signing digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// FIPS 202 SHA3-256.
    #[serde(rename = "SHA3_256")]
    Sha3_256,
    /// FIPS 180-4 SHA-256.
    #[serde(rename = "SHA2_256")]
    Sha2_256,
    /// Original Keccak-256 (Ethereum flavour).
    #[serde(rename = "KECCAK_256")]
    Keccak256,
}

impl HashAlgorithm {
    /// Hash `data` and return the 32-byte digest.
    pub fn digest(&self, data: &[u8]) -> [u8; 32] {
        match self {
            HashAlgorithm::Sha3_256 => sha3_256(data),
            HashAlgorithm::Sha2_256 => sha256(data),
            HashAlgorithm::Keccak256 => keccak256(data),
        }
    }

    /// Name as it appears in Flow account key listings.
    pub fn flow_name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha3_256 => "SHA3_256",
            HashAlgorithm::Sha2_256 => "SHA2_256",
            HashAlgorithm::Keccak256 => "KECCAK_256",
        }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Sha3_256
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flow_name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        match normalized.as_str() {
            "sha3256" | "sha3" => Ok(HashAlgorithm::Sha3_256),
            "sha2256" | "sha256" => Ok(HashAlgorithm::Sha2_256),
            "keccak256" | "keccak" => Ok(HashAlgorithm::Keccak256),
            _ => Err(KeyError::UnsupportedHash(s.to_string())),
        }
    }
}

/// SHA3-256 digest of `data`.
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    Sha3_256::digest(data).into()
}

/// SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Keccak-256 digest of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}
