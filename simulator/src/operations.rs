//! # Operation Handlers
//!
//! One handler per CLI operation. Handlers are generic over the
//! [`Dispatcher`] so tests can run them against a
//! [`RecordingDispatcher`](omniverse_protocol::dispatch::RecordingDispatcher)
//! and over the output sink so tests can capture what would be printed.
//!
//! Error policy: a wrong number of tokens is reported on the output and the
//! handler returns `Ok` without contacting the ledger. A token that cannot
//! be parsed, and every ledger failure, is returned as an error and ends the
//! run.

use serde_json::Value;
use std::io::{self, Write};
use thiserror::Error;

use omniverse_protocol::cadence::{parse_members, CadenceError, CadenceValue, UFix64};
use omniverse_protocol::config::{
    GET_LOCK_PERIOD_SCRIPT, GET_MEMBERS_SCRIPT, GET_NFT_TX_META_SCRIPT, SET_LOCK_PERIOD_TX,
    SET_MEMBERS_TX,
};
use omniverse_protocol::dispatch::{
    DispatchError, Dispatcher, ScriptRef, SettlementReceipt, TransactionRef,
};
use omniverse_protocol::identity::{
    AccountRegistry, FlowAddress, IdentityRecord, RegistryError, OWNER,
};
use omniverse_protocol::payload::{MintMetadata, OmniverseNftPayload, PayloadError};

use crate::cli::Operation;

/// Separator printed after each account by `--check-accounts`.
pub const ACCOUNT_SEPARATOR: &str = "**********************************";

/// Problems with the tokens passed to a write operation.
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("{expected} arguments are needed, but {provided} provided")]
    Count { expected: usize, provided: usize },

    #[error("invalid {what} {token:?}: {source}")]
    Malformed {
        what: &'static str,
        token: String,
        #[source]
        source: CadenceError,
    },
}

#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("cannot write output: {0}")]
    Output(#[from] io::Error),
}

/// Everything the handlers share for one run.
pub struct Simulator<D> {
    registry: AccountRegistry,
    dispatcher: D,
    /// Chain label for mint payloads.
    profile: String,
    /// Where the NFT contract lives, for the payload's struct type id.
    nft_contract: Option<FlowAddress>,
}

impl<D: Dispatcher> Simulator<D> {
    pub fn new(
        registry: AccountRegistry,
        dispatcher: D,
        profile: impl Into<String>,
        nft_contract: Option<FlowAddress>,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            profile: profile.into(),
            nft_contract,
        }
    }

    #[cfg(test)]
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Run `operation`, writing its console output to `out`.
    pub async fn run<W: Write>(
        &self,
        operation: Operation,
        out: &mut W,
    ) -> Result<(), OperationError> {
        tracing::debug!(?operation, "running operation");
        match operation {
            Operation::SetMembers(tokens) => self.set_members(&tokens, out).await.map(drop),
            Operation::CheckMembers => self.check_members(out).await.map(drop),
            Operation::SetLockPeriod(tokens) => self.set_lock_period(&tokens, out).await.map(drop),
            Operation::CheckLockPeriod => self.check_lock_period(out).await.map(drop),
            Operation::CheckAccounts => self.check_accounts(out),
            Operation::Mint => self.mint(out).await.map(drop),
        }
    }

    fn owner(&self) -> Result<&IdentityRecord, RegistryError> {
        self.registry.lookup(OWNER)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Replace the member-chain table. Returns the settlement receipt, or
    /// `None` when the token count was wrong and nothing was sent.
    pub async fn set_members<W: Write>(
        &self,
        tokens: &[String],
        out: &mut W,
    ) -> Result<Option<SettlementReceipt>, OperationError> {
        let Some(token) = single_token(tokens, out)? else {
            return Ok(None);
        };
        let members = parse_members(token).map_err(|source| ArgumentError::Malformed {
            what: "member table",
            token: token.to_string(),
            source,
        })?;

        let receipt = self
            .submit_and_settle(&TransactionRef::new(SET_MEMBERS_TX), members, out)
            .await?;
        Ok(Some(receipt))
    }

    /// Update the cooling-off period.
    pub async fn set_lock_period<W: Write>(
        &self,
        tokens: &[String],
        out: &mut W,
    ) -> Result<Option<SettlementReceipt>, OperationError> {
        let Some(token) = single_token(tokens, out)? else {
            return Ok(None);
        };
        let period: UFix64 = token.parse().map_err(|source| ArgumentError::Malformed {
            what: "lock period",
            token: token.to_string(),
            source,
        })?;

        let receipt = self
            .submit_and_settle(
                &TransactionRef::new(SET_LOCK_PERIOD_TX),
                CadenceValue::UFix64(period),
                out,
            )
            .await?;
        Ok(Some(receipt))
    }

    async fn submit_and_settle<W: Write>(
        &self,
        transaction: &TransactionRef,
        argument: CadenceValue,
        out: &mut W,
    ) -> Result<SettlementReceipt, OperationError> {
        let owner = self.owner()?;
        let pending = self
            .dispatcher
            .submit(owner, transaction, std::slice::from_ref(&argument))
            .await?;
        let receipt = self.dispatcher.await_settlement(pending).await?;

        tracing::info!(
            id = %receipt.transaction_id,
            signer = owner.name(),
            address = %owner.address(),
            transaction = %transaction,
            status = %receipt.status,
            "transaction settled"
        );
        writeln!(out, "Transaction {} {}", receipt.transaction_id, receipt.status)?;
        for event in &receipt.events {
            writeln!(out, "  {} {}", event.event_type, render(&event.payload))?;
        }
        Ok(receipt)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Print the allowed member chains.
    pub async fn check_members<W: Write>(&self, out: &mut W) -> Result<CadenceValue, OperationError> {
        self.print_script(&ScriptRef::new(GET_MEMBERS_SCRIPT), &[], out)
            .await
    }

    /// Print the cooling-off period.
    pub async fn check_lock_period<W: Write>(
        &self,
        out: &mut W,
    ) -> Result<CadenceValue, OperationError> {
        self.print_script(&ScriptRef::new(GET_LOCK_PERIOD_SCRIPT), &[], out)
            .await
    }

    async fn print_script<W: Write>(
        &self,
        script: &ScriptRef,
        args: &[CadenceValue],
        out: &mut W,
    ) -> Result<CadenceValue, OperationError> {
        let value = self.dispatcher.run_script(self.owner()?, script, args).await?;
        writeln!(out, "{}", render(&value))?;
        Ok(value)
    }

    /// Print every identity and its public key, in registry order.
    pub fn check_accounts<W: Write>(&self, out: &mut W) -> Result<(), OperationError> {
        for identity in self.registry.iter() {
            writeln!(out, "Account: {}", identity.name())?;
            writeln!(out, "Public Key: {}", identity.public_key().to_hex())?;
            writeln!(out, "{ACCOUNT_SEPARATOR}")?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Mint
    // -----------------------------------------------------------------------

    /// Query minting metadata for the owner's key and print the resulting
    /// payload. The payload is returned, never submitted.
    pub async fn mint<W: Write>(&self, out: &mut W) -> Result<OmniverseNftPayload, OperationError> {
        let owner = self.owner()?;
        let public_key = owner.public_key();

        let metadata_value = self
            .print_script(
                &ScriptRef::new(GET_NFT_TX_META_SCRIPT),
                &[CadenceValue::byte_array(public_key.raw_bytes())],
                out,
            )
            .await?;
        let metadata = MintMetadata::from_value(&metadata_value)?;

        let payload = OmniverseNftPayload::mint(&public_key, &metadata, self.profile.as_str());
        let argument = payload.to_cadence(self.nft_contract)?;
        tracing::info!(
            token_id = %payload.token_id,
            chain = %payload.chain,
            op = %payload.op,
            "mint payload prepared (not submitted)"
        );

        writeln!(out, "{}", pretty(&argument.to_json()))?;
        Ok(payload)
    }
}

/// The only token of a write operation, or `None` after reporting a count
/// mismatch.
fn single_token<'a, W: Write>(
    tokens: &'a [String],
    out: &mut W,
) -> Result<Option<&'a str>, OperationError> {
    match tokens {
        [token] => Ok(Some(token.as_str())),
        _ => {
            let err = ArgumentError::Count {
                expected: 1,
                provided: tokens.len(),
            };
            tracing::warn!(provided = tokens.len(), "wrong number of arguments");
            writeln!(out, "{err}")?;
            Ok(None)
        }
    }
}

/// Console form of a script result: bare text for strings and numbers
/// carried as strings, pretty JSON for everything else.
fn render(value: &CadenceValue) -> String {
    match value.to_plain_json() {
        Value::String(s) => s,
        other => pretty(&other),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use omniverse_protocol::dispatch::{DispatchCall, RecordingDispatcher};
    use omniverse_protocol::identity::RegistryConfig;

    fn simulator(dispatcher: RecordingDispatcher) -> Simulator<RecordingDispatcher> {
        let registry = AccountRegistry::new(RegistryConfig::emulator()).unwrap();
        Simulator::new(registry, dispatcher, "flowEmulator", None)
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    fn tokens(raw: &str) -> Vec<String> {
        crate::cli::split_tokens(raw)
    }

    #[tokio::test]
    async fn set_members_with_wrong_token_count_never_submits() {
        let sim = simulator(RecordingDispatcher::new());

        for raw in ["a|b", "a|b|c"] {
            let mut out = Vec::new();
            let receipt = sim.set_members(&tokens(raw), &mut out).await.unwrap();
            assert!(receipt.is_none());
            let expected = format!(
                "1 arguments are needed, but {} provided\n",
                tokens(raw).len()
            );
            assert_eq!(output(out), expected);
        }

        let mut out = Vec::new();
        sim.set_members(&[], &mut out).await.unwrap();
        assert_eq!(output(out), "1 arguments are needed, but 0 provided\n");

        assert_eq!(sim.dispatcher().submit_count(), 0);
        assert!(sim.dispatcher().calls().is_empty());
    }

    #[tokio::test]
    async fn set_members_submits_dictionary_then_settles() {
        let sim = simulator(RecordingDispatcher::new());
        let mut out = Vec::new();

        let receipt = sim
            .set_members(
                &tokens(r#"[{"key":1,"value":"ethereum"},{"key":2,"value":"flow"}]"#),
                &mut out,
            )
            .await
            .unwrap()
            .expect("submitted");

        let calls = sim.dispatcher().calls();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            DispatchCall::Submit {
                signer,
                transaction,
                args,
            } => {
                assert_eq!(signer, OWNER);
                assert_eq!(transaction.path(), SET_MEMBERS_TX);
                assert_eq!(
                    args[0],
                    CadenceValue::Dictionary(vec![
                        (
                            CadenceValue::UInt32(1),
                            CadenceValue::String("ethereum".into())
                        ),
                        (CadenceValue::UInt32(2), CadenceValue::String("flow".into())),
                    ])
                );
            }
            other => panic!("expected submit, got {other:?}"),
        }
        assert_eq!(
            calls[1],
            DispatchCall::AwaitSettlement {
                transaction_id: receipt.transaction_id.clone()
            }
        );
        assert!(output(out).contains("Sealed"));
    }

    #[tokio::test]
    async fn malformed_member_table_is_an_error_before_dispatch() {
        let sim = simulator(RecordingDispatcher::new());
        let err = sim
            .set_members(&tokens("not json"), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OperationError::Argument(ArgumentError::Malformed { .. })
        ));
        assert!(sim.dispatcher().calls().is_empty());
    }

    #[tokio::test]
    async fn set_lock_period_sends_ufix64() {
        let sim = simulator(RecordingDispatcher::new());
        sim.set_lock_period(&tokens("3600.5"), &mut Vec::new())
            .await
            .unwrap()
            .expect("submitted");

        match &sim.dispatcher().calls()[0] {
            DispatchCall::Submit {
                transaction, args, ..
            } => {
                assert_eq!(transaction.path(), SET_LOCK_PERIOD_TX);
                assert_eq!(args[0].to_json()["value"], "3600.50000000");
            }
            other => panic!("expected submit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn set_lock_period_rejects_bad_number_and_extra_tokens() {
        let sim = simulator(RecordingDispatcher::new());
        assert!(sim
            .set_lock_period(&tokens("-1"), &mut Vec::new())
            .await
            .is_err());

        let mut out = Vec::new();
        let sent = sim.set_lock_period(&tokens("1.0|2.0"), &mut out).await.unwrap();
        assert!(sent.is_none());
        assert_eq!(output(out), "1 arguments are needed, but 2 provided\n");
        assert_eq!(sim.dispatcher().submit_count(), 0);
    }

    #[tokio::test]
    async fn failed_settlement_propagates() {
        let sim = simulator(RecordingDispatcher::new().with_failing_settlement("not the owner"));
        let err = sim
            .set_lock_period(&tokens("10.0"), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OperationError::Dispatch(DispatchError::TransactionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn check_lock_period_prints_bare_value() {
        let sim = simulator(RecordingDispatcher::new().with_script_result(
            GET_LOCK_PERIOD_SCRIPT,
            CadenceValue::UFix64("3600".parse().unwrap()),
        ));
        let mut out = Vec::new();
        sim.run(Operation::CheckLockPeriod, &mut out).await.unwrap();
        assert_eq!(output(out), "3600.00000000\n");
    }

    #[tokio::test]
    async fn check_members_prints_plain_json() {
        let sim = simulator(RecordingDispatcher::new().with_script_result(
            GET_MEMBERS_SCRIPT,
            CadenceValue::Dictionary(vec![(
                CadenceValue::UInt32(1),
                CadenceValue::String("ethereum".into()),
            )]),
        ));
        let mut out = Vec::new();
        sim.run(Operation::CheckMembers, &mut out).await.unwrap();
        let printed: Value = serde_json::from_str(&output(out)).unwrap();
        assert_eq!(printed, serde_json::json!({ "1": "ethereum" }));
        assert!(matches!(
            sim.dispatcher().calls()[0],
            DispatchCall::RunScript { .. }
        ));
    }

    #[tokio::test]
    async fn check_accounts_lists_every_identity_in_order() {
        let sim = simulator(RecordingDispatcher::new());
        let mut out = Vec::new();
        sim.run(Operation::CheckAccounts, &mut out).await.unwrap();

        let text = output(out);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 12);

        let names: Vec<&str> = lines
            .iter()
            .filter_map(|l| l.strip_prefix("Account: "))
            .collect();
        assert_eq!(names, vec!["owner", "Alice", "Bob", "Carl"]);

        for chunk in lines.chunks(3) {
            let key = chunk[1].strip_prefix("Public Key: ").expect("key line");
            assert_eq!(key.len(), 130);
            assert!(key.starts_with("04"));
            assert_eq!(chunk[2], ACCOUNT_SEPARATOR);
        }
        assert!(sim.dispatcher().calls().is_empty());
    }

    #[tokio::test]
    async fn mint_builds_payload_from_metadata_and_never_submits() {
        let metadata = CadenceValue::structure(
            "A.f8d6e0586b0a20c7.OmniverseNFT.NFTTxMeta",
            vec![("nextNFTId".into(), CadenceValue::UInt128(7))],
        );
        let sim = simulator(
            RecordingDispatcher::new().with_script_result(GET_NFT_TX_META_SCRIPT, metadata),
        );
        let owner_key = sim.owner().unwrap().public_key();

        let mut out = Vec::new();
        let payload = sim.mint(&mut out).await.unwrap();

        assert_eq!(payload.token_id, 7);
        assert_eq!(payload.ex_data, owner_key.raw_hex());
        assert_eq!(payload.chain, "flowEmulator");

        let calls = sim.dispatcher().calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            DispatchCall::RunScript { script, args, .. } => {
                assert_eq!(script.path(), GET_NFT_TX_META_SCRIPT);
                assert_eq!(args[0], CadenceValue::byte_array(owner_key.raw_bytes()));
            }
            other => panic!("expected script, got {other:?}"),
        }
        assert_eq!(sim.dispatcher().submit_count(), 0);
        assert!(output(out).contains("OmniverseNFTPayload"));
    }

    #[tokio::test]
    async fn mint_without_next_id_fails() {
        let sim = simulator(
            RecordingDispatcher::new().with_script_result(GET_NFT_TX_META_SCRIPT, CadenceValue::Void),
        );
        let err = sim.mint(&mut Vec::new()).await.unwrap_err();
        assert!(matches!(err, OperationError::Payload(_)));
    }

    #[tokio::test]
    async fn missing_owner_is_registry_error() {
        let registry = AccountRegistry::new(RegistryConfig {
            accounts: vec![omniverse_protocol::identity::AccountConfig::new(
                "Alice",
                "0x01cf0e2f2f715450",
                "c9193930b34dd498378e36c35118a627d9eb500f6fd69b16d8e59db7cc8f5bb3",
            )],
        })
        .unwrap();
        let sim = Simulator::new(registry, RecordingDispatcher::new(), "flowEmulator", None);
        let err = sim.check_members(&mut Vec::new()).await.unwrap_err();
        assert!(matches!(
            err,
            OperationError::Registry(RegistryError::NotFound(_))
        ));
    }
}
