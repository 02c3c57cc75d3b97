mod error;
mod timer;

pub use error::ProviderError;
#[cfg(feature = "tokio")]
pub use timer::TokioTimer;
pub use timer::{Timer, with_timeout};

use async_trait::async_trait;
use mb_types::{
    CallRequest, EthereumRequest, TransactionRequest, TxHash, TxReceipt, WalletAddress,
};
use serde_json::Value;
use std::rc::Rc;
use tracing::{debug, warn};

/// An EIP-1193 `request({ method, params })` endpoint: an injected browser
/// wallet or a node reached over HTTP.
#[async_trait(?Send)]
pub trait RpcTransport {
    async fn request(&self, request: &EthereumRequest) -> Result<Value, ProviderError>;
}

/// A capability able to authorize transactions for one account.
#[async_trait(?Send)]
pub trait TransactionSigner {
    fn account(&self) -> &WalletAddress;
    /// Executes a read-only call and returns the raw `0x`-prefixed result.
    async fn call(&self, to: &str, data: &str) -> Result<String, ProviderError>;
    async fn send_transaction(&self, to: &str, data: &str) -> Result<TxHash, ProviderError>;
    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>, ProviderError>;
}

/// The connected wallet as seen by the bridge.
#[async_trait(?Send)]
pub trait WalletProvider {
    /// Accounts already authorized for this origin. Never prompts.
    async fn list_accounts(&self) -> Result<Vec<WalletAddress>, ProviderError>;
    /// Asks the wallet to authorize accounts. May show an approval dialog.
    async fn request_accounts(&self) -> Result<Vec<WalletAddress>, ProviderError>;
    fn signer(&self, account: &WalletAddress) -> Rc<dyn TransactionSigner>;
}

/// Wallet provider speaking plain EIP-1193 over any transport.
pub struct Eip1193Provider<T> {
    transport: Rc<T>,
}

impl<T> Clone for Eip1193Provider<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Rc::clone(&self.transport),
        }
    }
}

impl<T: RpcTransport + 'static> Eip1193Provider<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Rc::new(transport),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn accounts(&self, request: EthereumRequest) -> Result<Vec<WalletAddress>, ProviderError> {
        let method = request.method();
        let value = self.transport.request(&request).await?;
        debug!(method, "accounts response received");
        decode_accounts(method, value)
    }
}

#[async_trait(?Send)]
impl<T: RpcTransport + 'static> WalletProvider for Eip1193Provider<T> {
    async fn list_accounts(&self) -> Result<Vec<WalletAddress>, ProviderError> {
        self.accounts(EthereumRequest::Accounts).await
    }

    async fn request_accounts(&self) -> Result<Vec<WalletAddress>, ProviderError> {
        match self.accounts(EthereumRequest::RequestAccounts).await {
            // Plain nodes expose their unlocked accounts without an authorization step.
            Err(err) if err.is_method_not_found() => {
                warn!("eth_requestAccounts unsupported, falling back to eth_accounts");
                self.list_accounts().await
            }
            other => other,
        }
    }

    fn signer(&self, account: &WalletAddress) -> Rc<dyn TransactionSigner> {
        Rc::new(Eip1193Signer {
            transport: Rc::clone(&self.transport),
            account: account.clone(),
        })
    }
}

/// Signer that delegates signing to the wallet via `eth_sendTransaction`.
pub struct Eip1193Signer<T> {
    transport: Rc<T>,
    account: WalletAddress,
}

#[async_trait(?Send)]
impl<T: RpcTransport> TransactionSigner for Eip1193Signer<T> {
    fn account(&self) -> &WalletAddress {
        &self.account
    }

    async fn call(&self, to: &str, data: &str) -> Result<String, ProviderError> {
        let request = EthereumRequest::Call(CallRequest {
            from: Some(self.account.0.clone()),
            to: to.to_owned(),
            data: data.to_owned(),
        });
        let value = self.transport.request(&request).await?;
        decode_string("eth_call", value)
    }

    async fn send_transaction(&self, to: &str, data: &str) -> Result<TxHash, ProviderError> {
        let request = EthereumRequest::SendTransaction(TransactionRequest {
            from: self.account.0.clone(),
            to: to.to_owned(),
            data: data.to_owned(),
        });
        let value = self.transport.request(&request).await?;
        decode_string("eth_sendTransaction", value).map(TxHash)
    }

    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<TxReceipt>, ProviderError> {
        let request = EthereumRequest::GetTransactionReceipt(hash.clone());
        let value = self.transport.request(&request).await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|err| ProviderError::Decode {
                method: "eth_getTransactionReceipt",
                reason: err.to_string(),
            })
    }
}

fn decode_accounts(method: &'static str, value: Value) -> Result<Vec<WalletAddress>, ProviderError> {
    let accounts: Vec<String> = serde_json::from_value(value).map_err(|err| ProviderError::Decode {
        method,
        reason: err.to_string(),
    })?;
    Ok(accounts.into_iter().map(WalletAddress).collect())
}

fn decode_string(method: &'static str, value: Value) -> Result<String, ProviderError> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(ProviderError::Decode {
            method,
            reason: format!("expected string, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mb_types::METHOD_NOT_FOUND_CODE;
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Default)]
    struct ScriptedTransport {
        seen: RefCell<Vec<&'static str>>,
        request_accounts_unsupported: bool,
    }

    #[async_trait(?Send)]
    impl RpcTransport for ScriptedTransport {
        async fn request(&self, request: &EthereumRequest) -> Result<Value, ProviderError> {
            self.seen.borrow_mut().push(request.method());
            match request {
                EthereumRequest::Accounts => Ok(json!(["0xaaa", "0xbbb"])),
                EthereumRequest::RequestAccounts if self.request_accounts_unsupported => {
                    Err(ProviderError::Rpc {
                        code: METHOD_NOT_FOUND_CODE,
                        message: "method not found".to_owned(),
                    })
                }
                EthereumRequest::RequestAccounts => Ok(json!(["0xccc"])),
                EthereumRequest::Call(call) => {
                    assert_eq!(call.from.as_deref(), Some("0xaaa"));
                    Ok(json!("0x00"))
                }
                EthereumRequest::SendTransaction(tx) => {
                    assert_eq!(tx.from, "0xaaa");
                    Ok(json!("0xfeed"))
                }
                EthereumRequest::GetTransactionReceipt(_) => Ok(Value::Null),
            }
        }
    }

    #[tokio::test]
    async fn accounts_are_decoded_in_order() -> anyhow::Result<()> {
        let provider = Eip1193Provider::new(ScriptedTransport::default());

        let accounts = provider.list_accounts().await?;
        assert_eq!(
            accounts,
            vec![WalletAddress("0xaaa".to_owned()), WalletAddress("0xbbb".to_owned())]
        );

        let granted = provider.request_accounts().await?;
        assert_eq!(granted, vec![WalletAddress("0xccc".to_owned())]);
        Ok(())
    }

    #[tokio::test]
    async fn request_accounts_falls_back_when_unsupported() -> anyhow::Result<()> {
        let provider = Eip1193Provider::new(ScriptedTransport {
            request_accounts_unsupported: true,
            ..Default::default()
        });

        let accounts = provider.request_accounts().await?;
        assert_eq!(accounts.len(), 2);
        assert_eq!(
            *provider.transport().seen.borrow(),
            vec!["eth_requestAccounts", "eth_accounts"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn signer_sends_from_its_account() -> anyhow::Result<()> {
        let provider = Eip1193Provider::new(ScriptedTransport::default());
        let signer = provider.signer(&WalletAddress("0xaaa".to_owned()));

        assert_eq!(signer.call("0xcontract", "0x01").await?, "0x00");
        let hash = signer.send_transaction("0xcontract", "0x02").await?;
        assert_eq!(hash, TxHash("0xfeed".to_owned()));
        assert_eq!(signer.transaction_receipt(&hash).await?, None);
        Ok(())
    }

    #[test]
    fn non_array_accounts_is_a_decode_error() {
        let err = decode_accounts("eth_accounts", json!({ "nope": true })).unwrap_err();
        assert!(matches!(err, ProviderError::Decode { method: "eth_accounts", .. }));
    }
}
