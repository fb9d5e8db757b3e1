//! # Flow Access REST Dispatcher
//!
//! A [`Dispatcher`] backed by the access node's `/v1` REST API. Transactions
//! are assembled, RLP-encoded and signed locally, so the node never sees a
//! private key.
//!
//! | Step              | Endpoint                                   |
//! |-------------------|--------------------------------------------|
//! | reference block   | `GET  /v1/blocks?height=sealed`            |
//! | sequence number   | `GET  /v1/accounts/{address}?expand=keys`  |
//! | submit            | `POST /v1/transactions`                    |
//! | settle            | `GET  /v1/transaction_results/{id}`        |
//! | run script        | `POST /v1/scripts?block_height=sealed`     |

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

use super::envelope::{EnvelopeSignature, TransactionBody};
use super::{
    CadenceSource, DispatchError, Dispatcher, PendingTransaction, ScriptRef, SettlementReceipt,
    TransactionEvent, TransactionRef, TransactionStatus,
};
use crate::cadence::CadenceValue;
use crate::config::{
    DEFAULT_ACCESS_NODE, DEFAULT_GAS_LIMIT, DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SETTLEMENT_TIMEOUT,
};
use crate::identity::{FlowAddress, IdentityRecord};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Connection and pacing parameters for [`FlowRestDispatcher`].
#[derive(Debug, Clone)]
pub struct FlowRestConfig {
    /// Base URL of the access node REST API, without the `/v1` suffix.
    pub access_node: String,
    /// Computation limit for every submitted transaction.
    pub gas_limit: u64,
    /// Upper bound on the time spent waiting for a seal.
    pub settlement_timeout: Duration,
    /// Delay between result polls.
    pub poll_interval: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for FlowRestConfig {
    fn default() -> Self {
        Self {
            access_node: DEFAULT_ACCESS_NODE.to_string(),
            gas_limit: DEFAULT_GAS_LIMIT,
            settlement_timeout: DEFAULT_SETTLEMENT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl FlowRestConfig {
    pub fn new(access_node: impl Into<String>) -> Self {
        Self {
            access_node: access_node.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Wire Types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct BlockResponse {
    header: BlockHeader,
}

#[derive(Debug, Deserialize)]
struct BlockHeader {
    id: String,
    #[serde(default)]
    height: String,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(default)]
    keys: Vec<AccountKeyResponse>,
}

/// Numeric fields arrive as decimal strings.
#[derive(Debug, Deserialize)]
struct AccountKeyResponse {
    index: String,
    sequence_number: String,
    #[serde(default)]
    revoked: bool,
}

#[derive(Debug, Serialize)]
struct ScriptRequest {
    script: String,
    arguments: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ProposalKeyRequest {
    address: String,
    key_index: String,
    sequence_number: String,
}

#[derive(Debug, Serialize)]
struct SignatureRequest {
    address: String,
    key_index: String,
    signature: String,
}

impl From<&EnvelopeSignature> for SignatureRequest {
    fn from(sig: &EnvelopeSignature) -> Self {
        Self {
            address: sig.address.to_hex(),
            key_index: sig.key_index.to_string(),
            signature: BASE64.encode(&sig.signature),
        }
    }
}

#[derive(Debug, Serialize)]
struct TransactionRequest {
    script: String,
    arguments: Vec<String>,
    reference_block_id: String,
    gas_limit: String,
    payer: String,
    proposal_key: ProposalKeyRequest,
    authorizers: Vec<String>,
    payload_signatures: Vec<SignatureRequest>,
    envelope_signatures: Vec<SignatureRequest>,
}

impl TransactionRequest {
    fn new(body: &TransactionBody, envelope: &EnvelopeSignature) -> Self {
        Self {
            script: BASE64.encode(&body.script),
            arguments: body.arguments.iter().map(|a| BASE64.encode(a)).collect(),
            reference_block_id: hex::encode(&body.reference_block_id),
            gas_limit: body.gas_limit.to_string(),
            payer: body.payer.to_hex(),
            proposal_key: ProposalKeyRequest {
                address: body.proposal_key.address.to_hex(),
                key_index: body.proposal_key.key_index.to_string(),
                sequence_number: body.proposal_key.sequence_number.to_string(),
            },
            authorizers: body.authorizers.iter().map(FlowAddress::to_hex).collect(),
            payload_signatures: Vec::new(),
            envelope_signatures: vec![SignatureRequest::from(envelope)],
        }
    }
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TransactionResultResponse {
    status: TransactionStatus,
    #[serde(default)]
    status_code: u32,
    #[serde(default)]
    error_message: String,
    #[serde(default)]
    block_id: String,
    #[serde(default)]
    events: Vec<EventResponse>,
}

#[derive(Debug, Deserialize)]
struct EventResponse {
    #[serde(rename = "type")]
    event_type: String,
    payload: String,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Talks to a Flow access node over HTTP.
#[derive(Debug)]
pub struct FlowRestDispatcher {
    http: reqwest::Client,
    base_url: String,
    config: FlowRestConfig,
    source: CadenceSource,
}

impl FlowRestDispatcher {
    pub fn new(config: FlowRestConfig, source: CadenceSource) -> Result<Self, DispatchError> {
        let url = Url::parse(&config.access_node).map_err(|e| DispatchError::InvalidEndpoint {
            url: config.access_node.clone(),
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(DispatchError::InvalidEndpoint {
                url: config.access_node.clone(),
                reason: "not a base URL".into(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| DispatchError::Http {
                endpoint: config.access_node.clone(),
                source,
            })?;

        let base_url = config.access_node.trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            config,
            source,
        })
    }

    pub fn config(&self) -> &FlowRestConfig {
        &self.config
    }

    /// Id of the latest sealed block, used as the transaction's reference
    /// block.
    async fn latest_sealed_block_id(&self) -> Result<Vec<u8>, DispatchError> {
        let endpoint = "/v1/blocks?height=sealed";
        let blocks: Vec<BlockResponse> = self.get_json(endpoint).await?;
        let block = blocks.into_iter().next().ok_or(DispatchError::NoSealedBlock)?;
        tracing::debug!(id = %block.header.id, height = %block.header.height, "reference block");
        hex::decode(&block.header.id).map_err(|e| DispatchError::Decode {
            endpoint: endpoint.to_string(),
            reason: format!("block id: {e}"),
        })
    }

    /// Current sequence number of the signer's key slot.
    async fn sequence_number(
        &self,
        address: FlowAddress,
        key_index: u32,
    ) -> Result<u64, DispatchError> {
        let endpoint = format!("/v1/accounts/{}?expand=keys", address.to_hex());
        let account: AccountResponse = self.get_json(&endpoint).await?;

        let wanted = key_index.to_string();
        let key = account
            .keys
            .into_iter()
            .find(|k| k.index == wanted && !k.revoked)
            .ok_or(DispatchError::KeyNotFound { address, key_index })?;

        key.sequence_number
            .parse()
            .map_err(|e| DispatchError::Decode {
                endpoint,
                reason: format!("sequence number {:?}: {e}", key.sequence_number),
            })
    }

    async fn transaction_result(
        &self,
        id: &str,
    ) -> Result<TransactionResultResponse, DispatchError> {
        self.get_json(&format!("/v1/transaction_results/{id}")).await
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, DispatchError> {
        let request = self.http.get(format!("{}{endpoint}", self.base_url));
        self.send(request, endpoint).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, DispatchError> {
        let request = self
            .http
            .post(format!("{}{endpoint}", self.base_url))
            .json(body);
        self.send(request, endpoint).await
    }

    /// Send a request, turning transport failures, non-2xx statuses and
    /// unexpected bodies into distinct errors.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &str,
    ) -> Result<T, DispatchError> {
        let resp = request.send().await.map_err(|source| DispatchError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|source| DispatchError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(DispatchError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| DispatchError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

fn encode_arguments(args: &[CadenceValue]) -> Vec<Vec<u8>> {
    args.iter().map(CadenceValue::encode).collect()
}

fn decode_events(
    endpoint: &str,
    events: Vec<EventResponse>,
) -> Result<Vec<TransactionEvent>, DispatchError> {
    events
        .into_iter()
        .map(|event| {
            let bytes = BASE64.decode(&event.payload).map_err(|e| DispatchError::Decode {
                endpoint: endpoint.to_string(),
                reason: format!("event payload: {e}"),
            })?;
            Ok(TransactionEvent {
                event_type: event.event_type,
                payload: CadenceValue::decode(&bytes)?,
            })
        })
        .collect()
}

#[async_trait]
impl Dispatcher for FlowRestDispatcher {
    async fn submit(
        &self,
        signer: &IdentityRecord,
        transaction: &TransactionRef,
        args: &[CadenceValue],
    ) -> Result<PendingTransaction, DispatchError> {
        let code = self.source.load(transaction.path())?;
        let reference_block_id = self.latest_sealed_block_id().await?;
        let sequence_number = self
            .sequence_number(signer.address(), signer.key_index())
            .await?;

        let body = TransactionBody::single_signer(
            signer,
            code.into_bytes(),
            encode_arguments(args),
            reference_block_id,
            self.config.gas_limit,
            sequence_number,
        );
        let envelope = body.sign_envelope(signer)?;
        let request = TransactionRequest::new(&body, &envelope);

        let response: TransactionResponse = self.post_json("/v1/transactions", &request).await?;
        tracing::info!(
            id = %response.id,
            signer = signer.name(),
            transaction = %transaction,
            sequence_number,
            "transaction submitted"
        );

        Ok(PendingTransaction {
            id: response.id,
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
        let endpoint = "/v1/scripts?block_height=sealed";
        let code = self.source.load(script.path())?;
        let request = ScriptRequest {
            script: BASE64.encode(code.as_bytes()),
            arguments: encode_arguments(args)
                .iter()
                .map(|a| BASE64.encode(a))
                .collect(),
        };

        tracing::debug!(script = %script, requester = signer.name(), args = args.len(), "running script");
        let encoded: String = self.post_json(endpoint, &request).await?;
        let bytes = BASE64.decode(encoded.trim()).map_err(|e| DispatchError::Decode {
            endpoint: endpoint.to_string(),
            reason: format!("script result: {e}"),
        })?;
        Ok(CadenceValue::decode(&bytes)?)
    }

    async fn await_settlement(
        &self,
        pending: PendingTransaction,
    ) -> Result<SettlementReceipt, DispatchError> {
        let started = Instant::now();
        let endpoint = format!("/v1/transaction_results/{}", pending.id);

        loop {
            let result = self.transaction_result(&pending.id).await?;
            tracing::debug!(id = %pending.id, status = %result.status, "polled transaction");

            if !result.error_message.is_empty() || result.status_code != 0 {
                return Err(DispatchError::TransactionFailed {
                    id: pending.id,
                    status_code: result.status_code,
                    message: result.error_message,
                });
            }

            match result.status {
                TransactionStatus::Expired => {
                    return Err(DispatchError::Expired { id: pending.id });
                }
                TransactionStatus::Sealed => {
                    let events = decode_events(&endpoint, result.events)?;
                    tracing::info!(
                        id = %pending.id,
                        events = events.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "transaction sealed"
                    );
                    return Ok(SettlementReceipt {
                        transaction_id: pending.id,
                        status: TransactionStatus::Sealed,
                        block_id: Some(result.block_id).filter(|b| !b.is_empty()),
                        events,
                        settled_at: Utc::now(),
                    });
                }
                _ => {}
            }

            let elapsed = started.elapsed();
            if elapsed >= self.config.settlement_timeout {
                return Err(DispatchError::SettlementTimeout {
                    id: pending.id,
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}
