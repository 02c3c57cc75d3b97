use async_trait::async_trait;
use mb_provider::{ProviderError, RpcTransport};
use mb_types::{EthereumRequest, JsonRpcRequest, JsonRpcResponse};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// JSON-RPC over HTTP to a node whose accounts are unlocked.
///
/// Reads `MSGBRIDGE_RPC_URL` from environment at construction time
/// (default: `http://localhost:8545`).
pub struct HttpTransport {
    endpoint: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HttpTransport {
    pub fn new(endpoint: Option<String>) -> Self {
        let endpoint = endpoint
            .or_else(|| std::env::var("MSGBRIDGE_RPC_URL").ok())
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl RpcTransport for HttpTransport {
    async fn request(&self, request: &EthereumRequest) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = JsonRpcRequest::new(id, request);
        debug!(id, method = envelope.method, "rpc request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&envelope)
            .send()
            .await
            .map_err(|err| ProviderError::Transport(format!("{} transport: {err}", envelope.method)))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            // Some nodes report JSON-RPC errors with a non-2xx status.
            if let Ok(body) = serde_json::from_str::<JsonRpcResponse>(&text) {
                if let Some(err) = body.error {
                    return Err(err.into());
                }
            }
            return Err(ProviderError::Transport(format!(
                "{} HTTP {status}: {text}",
                envelope.method
            )));
        }

        parse_response(envelope.method, &text)
    }
}

fn parse_response(method: &'static str, text: &str) -> Result<Value, ProviderError> {
    let body: JsonRpcResponse = serde_json::from_str(text).map_err(|err| ProviderError::Decode {
        method,
        reason: err.to_string(),
    })?;

    if let Some(err) = body.error {
        warn!(method, code = err.code, "rpc error: {}", err.message);
        return Err(err.into());
    }

    // `null` results (e.g. an unmined receipt) deserialize as a missing field.
    Ok(body.result.unwrap_or(Value::Null))
}
