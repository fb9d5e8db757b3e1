//! # Ledger Dispatch
//!
//! The capability boundary between the simulator and the Flow network. The
//! simulator hands over *who* signs, *which* Cadence file runs, and the typed
//! arguments; a [`Dispatcher`] does the rest.
//!
//! ```text
//!   handler ──submit(signer, tx, args)──────► Dispatcher ──► PendingTransaction
//!   handler ──await_settlement(pending)─────► Dispatcher ──► SettlementReceipt
//!   handler ──run_script(signer, script, args)► Dispatcher ──► CadenceValue
//! ```
//!
//! Two implementations ship with the crate:
//!
//! - [`FlowRestDispatcher`] talks to a Flow access node over its REST API,
//!   building and signing transaction envelopes locally.
//! - [`RecordingDispatcher`] records calls in memory and answers from canned
//!   results, for tests.

pub mod envelope;
pub mod memory;
pub mod rest;
pub mod source;

mod error;

pub use envelope::{EnvelopeSignature, ProposalKey, TransactionBody};
pub use error::DispatchError;
pub use memory::{DispatchCall, RecordingDispatcher};
pub use rest::{FlowRestConfig, FlowRestDispatcher};
pub use source::CadenceSource;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cadence::CadenceValue;
use crate::identity::IdentityRecord;

/// Reference to a transaction file, relative to the Cadence root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionRef(String);

/// Reference to a script file, relative to the Cadence root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScriptRef(String);

impl TransactionRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &str {
        &self.0
    }
}

impl ScriptRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ScriptRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A submitted transaction whose outcome is not yet known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    /// Transaction id as lowercase hex.
    pub id: String,
    /// Name of the identity that signed it.
    pub signer: String,
    /// File that was submitted.
    pub transaction: TransactionRef,
}

/// Lifecycle status as reported by the access node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Unknown,
    Pending,
    Finalized,
    Executed,
    Sealed,
    Expired,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An event emitted by a settled transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEvent {
    /// Fully-qualified event type, e.g. `A.f8d6e0586b0a20c7.Omniverse.MembersSet`.
    pub event_type: String,
    pub payload: CadenceValue,
}

/// Final on-ledger outcome of a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementReceipt {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub block_id: Option<String>,
    pub events: Vec<TransactionEvent>,
    /// When the simulator observed the seal.
    pub settled_at: DateTime<Utc>,
}

/// Signs, submits and settles transactions; executes read-only scripts.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Sign `transaction` as `signer` with `args` and submit it. Returns as
    /// soon as the network has accepted the transaction.
    async fn submit(
        &self,
        signer: &IdentityRecord,
        transaction: &TransactionRef,
        args: &[CadenceValue],
    ) -> Result<PendingTransaction, DispatchError>;

    /// Execute a read-only script and return its value.
    async fn run_script(
        &self,
        signer: &IdentityRecord,
        script: &ScriptRef,
        args: &[CadenceValue],
    ) -> Result<CadenceValue, DispatchError>;

    /// Wait until `pending` is sealed. Execution failures and expiry are
    /// errors.
    async fn await_settlement(
        &self,
        pending: PendingTransaction,
    ) -> Result<SettlementReceipt, DispatchError>;
}
