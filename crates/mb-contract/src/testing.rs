//! In-memory wallet that answers EIP-1193 requests against a stored message.

use alloy_primitives::hex;
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use mb_provider::{ProviderError, RpcTransport};
use mb_types::{EthereumRequest, TxHash, TxReceipt, USER_REJECTED_CODE};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::{messageCall, setMessageCall};

#[derive(Default)]
struct FakeState {
    authorized: Vec<String>,
    grantable: Vec<String>,
    message: String,
    reject_authorization: bool,
    revert_writes: bool,
    failing: HashSet<&'static str>,
    hanging: HashSet<&'static str>,
    receipts: HashMap<String, TxReceipt>,
    receipt_delay: u32,
    receipt_polls: u32,
    next_tx: u64,
    log: Vec<&'static str>,
}

#[derive(Default)]
pub struct FakeWallet {
    state: RefCell<FakeState>,
}

impl FakeWallet {
    pub fn with_message(message: &str) -> Self {
        let wallet = Self::default();
        wallet.state.borrow_mut().message = message.to_owned();
        wallet
    }

    /// Accounts `eth_accounts` reports without prompting.
    pub fn authorize(&self, accounts: &[&str]) {
        self.state.borrow_mut().authorized = accounts.iter().map(|a| (*a).to_owned()).collect();
    }

    /// Accounts the user approves when `eth_requestAccounts` prompts.
    pub fn approve_on_request(&self, accounts: &[&str]) {
        self.state.borrow_mut().grantable = accounts.iter().map(|a| (*a).to_owned()).collect();
    }

    pub fn reject_authorization(&self, reject: bool) {
        self.state.borrow_mut().reject_authorization = reject;
    }

    pub fn revert_writes(&self, revert: bool) {
        self.state.borrow_mut().revert_writes = revert;
    }

    /// Makes `method` answer with an internal JSON-RPC error.
    pub fn fail(&self, method: &'static str, fail: bool) {
        let mut state = self.state.borrow_mut();
        if fail {
            state.failing.insert(method);
        } else {
            state.failing.remove(method);
        }
    }

    /// Makes `method` never answer.
    pub fn hang(&self, method: &'static str) {
        self.state.borrow_mut().hanging.insert(method);
    }

    /// Number of `null` receipts served before a transaction shows up mined.
    pub fn set_receipt_delay(&self, polls: u32) {
        self.state.borrow_mut().receipt_delay = polls;
    }

    pub fn receipt_polls(&self) -> u32 {
        self.state.borrow().receipt_polls
    }

    pub fn stored_message(&self) -> String {
        self.state.borrow().message.clone()
    }

    /// Sets the contract value behind the bridge's back.
    pub fn store_message(&self, message: &str) {
        self.state.borrow_mut().message = message.to_owned();
    }

    pub fn calls(&self, method: &str) -> usize {
        self.state.borrow().log.iter().filter(|m| **m == method).count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.borrow().log.len()
    }

    fn answer(&self, request: &EthereumRequest) -> Result<Value, ProviderError> {
        let mut state = self.state.borrow_mut();
        let method = request.method();
        state.log.push(method);

        if state.failing.contains(method) {
            return Err(ProviderError::Rpc {
                code: -32603,
                message: format!("{method} failed"),
            });
        }

        match request {
            EthereumRequest::Accounts => Ok(json!(state.authorized)),
            EthereumRequest::RequestAccounts => {
                if state.reject_authorization {
                    return Err(ProviderError::Rpc {
                        code: USER_REJECTED_CODE,
                        message: "User rejected the request.".to_owned(),
                    });
                }
                let granted = state.grantable.clone();
                for account in granted {
                    if !state.authorized.contains(&account) {
                        state.authorized.push(account);
                    }
                }
                Ok(json!(state.authorized))
            }
            EthereumRequest::Call(call) => {
                if call.data != hex::encode_prefixed(messageCall::SELECTOR) {
                    return Err(ProviderError::Rpc {
                        code: -32000,
                        message: "execution reverted".to_owned(),
                    });
                }
                Ok(json!(hex::encode_prefixed(state.message.abi_encode())))
            }
            EthereumRequest::SendTransaction(tx) => {
                let data = hex::decode(&tx.data).map_err(|err| ProviderError::Rpc {
                    code: -32602,
                    message: err.to_string(),
                })?;
                let call = setMessageCall::abi_decode(&data).map_err(|err| ProviderError::Rpc {
                    code: -32602,
                    message: err.to_string(),
                })?;

                state.next_tx += 1;
                let hash = format!("0x{:064x}", state.next_tx);
                let status = if state.revert_writes {
                    "0x0"
                } else {
                    state.message = call.newMessage;
                    "0x1"
                };
                let receipt = TxReceipt {
                    transaction_hash: TxHash(hash.clone()),
                    block_number: Some(format!("0x{:x}", state.next_tx)),
                    status: Some(status.to_owned()),
                };
                state.receipts.insert(hash.clone(), receipt);
                Ok(json!(hash))
            }
            EthereumRequest::GetTransactionReceipt(hash) => {
                state.receipt_polls += 1;
                if state.receipt_delay > 0 {
                    state.receipt_delay -= 1;
                    return Ok(Value::Null);
                }
                Ok(state
                    .receipts
                    .get(&hash.0)
                    .map(|receipt| json!(receipt))
                    .unwrap_or(Value::Null))
            }
        }
    }
}

#[async_trait(?Send)]
impl RpcTransport for FakeWallet {
    async fn request(&self, request: &EthereumRequest) -> Result<Value, ProviderError> {
        let hangs = self.state.borrow().hanging.contains(request.method());
        if hangs {
            self.state.borrow_mut().log.push(request.method());
            futures::future::pending::<()>().await;
        }
        self.answer(request)
    }
}
