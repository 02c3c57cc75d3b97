use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// EIP-1193 "user rejected request".
pub const USER_REJECTED_CODE: i64 = 4001;

/// JSON-RPC 2.0 "method not found".
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WalletAddress(pub String);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ContractAddress(pub String);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TxHash(pub String);

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parameters of `eth_call`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub to: String,
    pub data: String,
}

/// Parameters of `eth_sendTransaction`. The wallet fills in gas, nonce and fees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: String,
    pub to: String,
    pub data: String,
}

/// Subset of an `eth_getTransactionReceipt` result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TxReceipt {
    /// Pre-Byzantium receipts carry no status and count as included.
    pub fn succeeded(&self) -> bool {
        !matches!(self.status.as_deref(), Some("0x0") | Some("0x00"))
    }
}

/// The EIP-1193 requests the bridge issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EthereumRequest {
    Accounts,
    RequestAccounts,
    Call(CallRequest),
    SendTransaction(TransactionRequest),
    GetTransactionReceipt(TxHash),
}

impl EthereumRequest {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Accounts => "eth_accounts",
            Self::RequestAccounts => "eth_requestAccounts",
            Self::Call(_) => "eth_call",
            Self::SendTransaction(_) => "eth_sendTransaction",
            Self::GetTransactionReceipt(_) => "eth_getTransactionReceipt",
        }
    }

    pub fn params(&self) -> Value {
        match self {
            Self::Accounts | Self::RequestAccounts => json!([]),
            Self::Call(call) => json!([call, "latest"]),
            Self::SendTransaction(tx) => json!([tx]),
            Self::GetTransactionReceipt(hash) => json!([hash.0]),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, request: &EthereumRequest) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: request.method(),
            params: request.params(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_params_target_latest_block() {
        let request = EthereumRequest::Call(CallRequest {
            from: None,
            to: "0x5fbdb2315678afecb367f032d93f642f64180aa3".to_owned(),
            data: "0xe21f37ce".to_owned(),
        });

        assert_eq!(request.method(), "eth_call");
        assert_eq!(
            request.params(),
            json!([
                { "to": "0x5fbdb2315678afecb367f032d93f642f64180aa3", "data": "0xe21f37ce" },
                "latest"
            ])
        );
    }

    #[test]
    fn envelope_carries_method_and_params() {
        let envelope = JsonRpcRequest::new(7, &EthereumRequest::RequestAccounts);
        let encoded = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            encoded,
            json!({ "jsonrpc": "2.0", "id": 7, "method": "eth_requestAccounts", "params": [] })
        );
    }

    #[test]
    fn receipt_status_decides_success() {
        let mined: TxReceipt = serde_json::from_value(json!({
            "transactionHash": "0xabc",
            "blockNumber": "0x2",
            "status": "0x1"
        }))
        .unwrap();
        let reverted: TxReceipt = serde_json::from_value(json!({
            "transactionHash": "0xdef",
            "status": "0x0"
        }))
        .unwrap();

        assert!(mined.succeeded());
        assert_eq!(mined.transaction_hash, TxHash("0xabc".to_owned()));
        assert!(!reverted.succeeded());
        assert_eq!(reverted.block_number, None);
    }

    #[test]
    fn error_response_parses() {
        let response: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 4001, "message": "User rejected the request." }
        }))
        .unwrap();

        let error = response.error.unwrap();
        assert_eq!(error.code, USER_REJECTED_CODE);
        assert!(response.result.is_none());
    }
}
