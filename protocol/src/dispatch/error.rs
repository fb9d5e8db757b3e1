//! Error types for the ledger boundary.
//!
//! Every [`Dispatcher`](super::Dispatcher) operation that can fail returns a
//! [`DispatchError`]. None of these are recovered inside the simulator: they
//! end the running operation and the process.

use std::path::PathBuf;
use thiserror::Error;

use crate::cadence::CadenceError;
use crate::crypto::KeyError;
use crate::identity::FlowAddress;

/// Failures crossing the ledger boundary.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A transaction or script file could not be read.
    #[error("cannot read Cadence source {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configured access node is not a usable base URL.
    #[error("invalid access node URL {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// The request never produced an HTTP response.
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The access node answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// A response body did not have the expected shape.
    #[error("unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    /// Argument encoding or result decoding failed.
    #[error(transparent)]
    Cadence(#[from] CadenceError),

    /// The signer's key could not produce a signature.
    #[error("signing failed: {0}")]
    Signing(#[from] KeyError),

    /// The access node reported no sealed block to reference.
    #[error("access node returned no sealed block")]
    NoSealedBlock,

    /// The signer's key slot does not exist (or is revoked) on chain.
    #[error("key #{key_index} not found on account {address}")]
    KeyNotFound { address: FlowAddress, key_index: u32 },

    /// The transaction executed and failed.
    #[error("transaction {id} failed (status code {status_code}): {message}")]
    TransactionFailed {
        id: String,
        status_code: u32,
        message: String,
    },

    /// The transaction's reference block aged out before inclusion.
    #[error("transaction {id} expired before being sealed")]
    Expired { id: String },

    /// Sealing took longer than the configured settlement timeout.
    #[error("transaction {id} not sealed after {elapsed_ms}ms")]
    SettlementTimeout { id: String, elapsed_ms: u64 },

    /// A test double was asked for a script it has no answer for.
    #[error("no canned result for script {0}")]
    NoScriptResult(String),
}
