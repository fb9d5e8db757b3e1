//! In-memory [`Dispatcher`] for tests.
//!
//! Records every call in order, answers scripts from a table of canned
//! results keyed by file path, and settles submitted transactions
//! immediately (or fails them, when configured to).

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::{
    DispatchError, Dispatcher, PendingTransaction, ScriptRef, SettlementReceipt, TransactionRef,
    TransactionStatus,
};
use crate::cadence::CadenceValue;
use crate::identity::IdentityRecord;

/// One recorded dispatcher call.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchCall {
    Submit {
        signer: String,
        transaction: TransactionRef,
        args: Vec<CadenceValue>,
    },
    RunScript {
        signer: String,
        script: ScriptRef,
        args: Vec<CadenceValue>,
    },
    AwaitSettlement {
        transaction_id: String,
    },
}

#[derive(Default)]
struct RecordingState {
    calls: Vec<DispatchCall>,
    script_results: HashMap<String, CadenceValue>,
    settlement_failure: Option<String>,
    submitted: u64,
}

/// A dispatcher that never leaves the process.
#[derive(Default)]
pub struct RecordingDispatcher {
    state: Mutex<RecordingState>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `run_script` for `script` with `value`.
    pub fn with_script_result(self, script: &str, value: CadenceValue) -> Self {
        self.state
            .lock()
            .script_results
            .insert(script.to_string(), value);
        self
    }

    /// Make every settlement fail with `message`.
    pub fn with_failing_settlement(self, message: &str) -> Self {
        self.state.lock().settlement_failure = Some(message.to_string());
        self
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<DispatchCall> {
        self.state.lock().calls.clone()
    }

    /// Number of `submit` calls so far.
    pub fn submit_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, DispatchCall::Submit { .. }))
            .count()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn submit(
        &self,
        signer: &IdentityRecord,
        transaction: &TransactionRef,
        args: &[CadenceValue],
    ) -> Result<PendingTransaction, DispatchError> {
        let mut state = self.state.lock();
        state.submitted += 1;
        state.calls.push(DispatchCall::Submit {
            signer: signer.name().to_string(),
            transaction: transaction.clone(),
            args: args.to_vec(),
        });
        Ok(PendingTransaction {
            id: format!("{:064x}", state.submitted),
            signer: signer.name().to_string(),
            transaction: transaction.clone(),
        })
    }

    async fn run_script(
        &self,
        signer: &IdentityRecord,
        script: &ScriptRef,
        args: &[CadenceValue],
    ) -> Result<CadenceValue, DispatchError> {
        let mut state = self.state.lock();
        state.calls.push(DispatchCall::RunScript {
            signer: signer.name().to_string(),
            script: script.clone(),
            args: args.to_vec(),
        });
        state
            .script_results
            .get(script.path())
            .cloned()
            .ok_or_else(|| DispatchError::NoScriptResult(script.path().to_string()))
    }

    async fn await_settlement(
        &self,
        pending: PendingTransaction,
    ) -> Result<SettlementReceipt, DispatchError> {
        let mut state = self.state.lock();
        state.calls.push(DispatchCall::AwaitSettlement {
            transaction_id: pending.id.clone(),
        });
        if let Some(message) = &state.settlement_failure {
            return Err(DispatchError::TransactionFailed {
                id: pending.id,
                status_code: 1,
                message: message.clone(),
            });
        }
        Ok(SettlementReceipt {
            transaction_id: pending.id,
            status: TransactionStatus::Sealed,
            block_id: None,
            events: Vec::new(),
            settled_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{AccountRegistry, RegistryConfig, OWNER};

    #[tokio::test]
    async fn records_calls_in_order() {
        let registry = AccountRegistry::new(RegistryConfig::emulator()).unwrap();
        let owner = registry.lookup(OWNER).unwrap();
        let dispatcher = RecordingDispatcher::new()
            .with_script_result("scripts/a.cdc", CadenceValue::Bool(true));

        let pending = dispatcher
            .submit(owner, &TransactionRef::new("transactions/t.cdc"), &[])
            .await
            .unwrap();
        let receipt = dispatcher.await_settlement(pending.clone()).await.unwrap();
        let value = dispatcher
            .run_script(owner, &ScriptRef::new("scripts/a.cdc"), &[])
            .await
            .unwrap();

        assert_eq!(receipt.status, TransactionStatus::Sealed);
        assert_eq!(receipt.transaction_id, pending.id);
        assert_eq!(value, CadenceValue::Bool(true));
        assert_eq!(dispatcher.submit_count(), 1);
        assert!(matches!(dispatcher.calls()[1], DispatchCall::AwaitSettlement { .. }));
    }

    #[tokio::test]
    async fn unknown_script_is_an_error() {
        let registry = AccountRegistry::new(RegistryConfig::emulator()).unwrap();
        let owner = registry.lookup(OWNER).unwrap();
        let err = RecordingDispatcher::new()
            .run_script(owner, &ScriptRef::new("scripts/none.cdc"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::NoScriptResult(_)));
    }

    #[tokio::test]
    async fn failing_settlement_surfaces_message() {
        let registry = AccountRegistry::new(RegistryConfig::emulator()).unwrap();
        let owner = registry.lookup(OWNER).unwrap();
        let dispatcher = RecordingDispatcher::new().with_failing_settlement("panic: not owner");
        let pending = dispatcher
            .submit(owner, &TransactionRef::new("transactions/t.cdc"), &[])
            .await
            .unwrap();
        match dispatcher.await_settlement(pending).await {
            Err(DispatchError::TransactionFailed { message, .. }) => {
                assert_eq!(message, "panic: not owner")
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
