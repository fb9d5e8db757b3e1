//! # Protocol Configuration & Constants
//!
//! Every fixed value the simulator relies on lives here: the Flow signing
//! domain tag, key sizes, default endpoints, and the Cadence file references
//! each operation ships to the network.
//!
//! Identities are deliberately *not* constants. They are injected through
//! [`RegistryConfig`](crate::identity::RegistryConfig) so tests and alternate
//! networks can swap them without touching this module.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Simulator Identity
// ---------------------------------------------------------------------------

/// Version banner printed by `--version`.
pub const SIMULATOR_BANNER: &str = "Test Tools for omniverse Flow. v0.0.1";

/// Chain label used in mint payloads when no profile is configured.
pub const DEFAULT_PROFILE: &str = "flowEmulator";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Raw private scalar length for secp256k1.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// SEC1 uncompressed public key length: one format byte plus X and Y.
pub const UNCOMPRESSED_PUBLIC_KEY_LENGTH: usize = 65;

/// Raw coordinate length once the SEC1 format byte is stripped.
pub const RAW_PUBLIC_KEY_LENGTH: usize = 64;

/// ECDSA signature length on the wire (`r || s`).
pub const SIGNATURE_LENGTH: usize = 64;

/// Flow account address length in bytes.
pub const ADDRESS_LENGTH: usize = 8;

/// Domain separation tag prepended to every transaction envelope before
/// hashing. Right-padded with zeros to [`DOMAIN_TAG_LENGTH`].
pub const TRANSACTION_DOMAIN_TAG: &str = "FLOW-V0.0-transaction";

/// Every Flow domain tag occupies exactly 32 bytes.
pub const DOMAIN_TAG_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Network Defaults
// ---------------------------------------------------------------------------

/// REST endpoint of a locally running Flow emulator.
pub const DEFAULT_ACCESS_NODE: &str = "http://127.0.0.1:8888";

/// Computation limit attached to every submitted transaction.
pub const DEFAULT_GAS_LIMIT: u64 = 9_999;

/// How long to wait for a transaction to seal before giving up.
pub const DEFAULT_SETTLEMENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Delay between transaction result polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

/// Per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Cadence File References
// ---------------------------------------------------------------------------

/// Transaction replacing the allowed member-chain table.
pub const SET_MEMBERS_TX: &str = "transactions/setMembers.cdc";

/// Transaction updating the cooling-off period.
pub const SET_LOCK_PERIOD_TX: &str = "transactions/setLockPeriod.cdc";

/// Script returning the allowed member-chain table.
pub const GET_MEMBERS_SCRIPT: &str = "scripts/getMembers.cdc";

/// Script returning the cooling-off period.
pub const GET_LOCK_PERIOD_SCRIPT: &str = "scripts/getLockPeriod.cdc";

/// Script returning minting metadata (including the next NFT id) for a
/// public key.
pub const GET_NFT_TX_META_SCRIPT: &str = "scripts/getNFTTxMeta.cdc";

/// Contract declaring the cross-chain payload struct. Also the alias name
/// looked up in the contract address map.
pub const NFT_CONTRACT_NAME: &str = "OmniverseNFT";

/// Struct type carrying an Omniverse NFT operation.
pub const NFT_PAYLOAD_STRUCT: &str = "OmniverseNFTPayload";

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Returns the 32-byte, zero-padded transaction domain tag.
pub fn transaction_domain_tag() -> [u8; DOMAIN_TAG_LENGTH] {
    let mut tag = [0u8; DOMAIN_TAG_LENGTH];
    let bytes = TRANSACTION_DOMAIN_TAG.as_bytes();
    tag[..bytes.len()].copy_from_slice(bytes);
    tag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_tag_is_zero_padded() {
        let tag = transaction_domain_tag();
        assert_eq!(&tag[..TRANSACTION_DOMAIN_TAG.len()], TRANSACTION_DOMAIN_TAG.as_bytes());
        assert!(tag[TRANSACTION_DOMAIN_TAG.len()..].iter().all(|b| *b == 0));
    }

    #[test]
    fn key_lengths_are_consistent() {
        assert_eq!(UNCOMPRESSED_PUBLIC_KEY_LENGTH, RAW_PUBLIC_KEY_LENGTH + 1);
        assert_eq!(SIGNATURE_LENGTH, 2 * PRIVATE_KEY_LENGTH);
    }

    #[test]
    fn timing_defaults_sanity() {
        assert!(DEFAULT_POLL_INTERVAL < DEFAULT_SETTLEMENT_TIMEOUT);
        assert!(DEFAULT_REQUEST_TIMEOUT.as_secs() > 0);
    }

    #[test]
    fn file_references_are_relative() {
        for path in [
            SET_MEMBERS_TX,
            SET_LOCK_PERIOD_TX,
            GET_MEMBERS_SCRIPT,
            GET_LOCK_PERIOD_SCRIPT,
            GET_NFT_TX_META_SCRIPT,
        ] {
            assert!(!path.starts_with('/'));
            assert!(path.ends_with(".cdc"));
        }
    }
}
