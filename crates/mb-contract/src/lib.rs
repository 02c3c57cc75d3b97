//! Proxy for the on-chain message board: a `message()` getter and a
//! `setMessage(string)` setter, reached through a wallet signer.

#[cfg(any(test, feature = "testing"))]
pub mod testing;

use alloy_primitives::{Address, hex};
use alloy_sol_types::{SolCall, sol};
use async_trait::async_trait;
use mb_provider::{ProviderError, Timer, TransactionSigner};
use mb_types::{ContractAddress, TxHash, TxReceipt, WalletAddress};
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// First deployment address on a fresh local development node.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";

sol! {
    function message() external view returns (string);
    function setMessage(string newMessage) external;
}

#[derive(Debug, Error)]
pub enum ContractError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("invalid contract address {0}")]
    InvalidAddress(String),
    #[error("failed to decode {method} result: {reason}")]
    Decode { method: &'static str, reason: String },
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
}

/// Checks that `raw` is a 20-byte hex address.
pub fn parse_contract_address(raw: &str) -> Result<ContractAddress, ContractError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<Address>()
        .map_err(|_| ContractError::InvalidAddress(trimmed.to_owned()))?;
    Ok(ContractAddress(trimmed.to_owned()))
}

#[async_trait(?Send)]
pub trait MessageContract {
    fn address(&self) -> &ContractAddress;
    fn signer(&self) -> &WalletAddress;
    /// Invokes the side-effect free `message()` getter.
    async fn message(&self) -> Result<String, ContractError>;
    /// Submits `setMessage(new_message)`; the returned handle waits for inclusion.
    async fn set_message(&self, new_message: &str) -> Result<PendingTransaction, ContractError>;
}

/// A submitted transaction that has not been observed in a block yet.
pub struct PendingTransaction {
    hash: TxHash,
    signer: Rc<dyn TransactionSigner>,
    timer: Rc<dyn Timer>,
    poll_interval: Duration,
}

impl PendingTransaction {
    pub fn new(
        hash: TxHash,
        signer: Rc<dyn TransactionSigner>,
        timer: Rc<dyn Timer>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            hash,
            signer,
            timer,
            poll_interval,
        }
    }

    pub fn hash(&self) -> &TxHash {
        &self.hash
    }

    /// Polls for the receipt until the transaction is mined.
    ///
    /// Never gives up on its own; callers bound it with a timeout.
    pub async fn wait(&self) -> Result<TxReceipt, ContractError> {
        loop {
            match self.signer.transaction_receipt(&self.hash).await? {
                Some(receipt) if receipt.succeeded() => {
                    info!(tx = %self.hash, block = ?receipt.block_number, "transaction confirmed");
                    return Ok(receipt);
                }
                Some(_) => return Err(ContractError::Reverted(self.hash.clone())),
                None => {
                    debug!(tx = %self.hash, "receipt not available yet");
                    self.timer.sleep(self.poll_interval).await;
                }
            }
        }
    }
}

/// The message board contract bound to one signer.
pub struct MessageBoardContract {
    address: ContractAddress,
    signer: Rc<dyn TransactionSigner>,
    timer: Rc<dyn Timer>,
    poll_interval: Duration,
}

impl MessageBoardContract {
    pub fn new(
        address: ContractAddress,
        signer: Rc<dyn TransactionSigner>,
        timer: Rc<dyn Timer>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            address,
            signer,
            timer,
            poll_interval,
        }
    }
}

#[async_trait(?Send)]
impl MessageContract for MessageBoardContract {
    fn address(&self) -> &ContractAddress {
        &self.address
    }

    fn signer(&self) -> &WalletAddress {
        self.signer.account()
    }

    async fn message(&self) -> Result<String, ContractError> {
        let data = hex::encode_prefixed(messageCall::SELECTOR);
        let raw = self.signer.call(&self.address.0, &data).await?;
        decode_message(&raw)
    }

    async fn set_message(&self, new_message: &str) -> Result<PendingTransaction, ContractError> {
        let call = setMessageCall {
            newMessage: new_message.to_owned(),
        };
        let data = hex::encode_prefixed(call.abi_encode());
        let hash = self.signer.send_transaction(&self.address.0, &data).await?;
        info!(tx = %hash, from = %self.signer.account(), "setMessage submitted");

        Ok(PendingTransaction::new(
            hash,
            Rc::clone(&self.signer),
            Rc::clone(&self.timer),
            self.poll_interval,
        ))
    }
}

fn decode_message(raw: &str) -> Result<String, ContractError> {
    let bytes = hex::decode(raw).map_err(|err| ContractError::Decode {
        method: "message",
        reason: err.to_string(),
    })?;
    messageCall::abi_decode_returns(&bytes).map_err(|err| ContractError::Decode {
        method: "message",
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWallet;
    use mb_provider::{Eip1193Provider, TokioTimer, WalletProvider};

    fn contract_for(provider: &Eip1193Provider<FakeWallet>, account: &str) -> MessageBoardContract {
        MessageBoardContract::new(
            ContractAddress(DEFAULT_CONTRACT_ADDRESS.to_owned()),
            provider.signer(&WalletAddress(account.to_owned())),
            Rc::new(TokioTimer),
            Duration::from_millis(5),
        )
    }

    #[test]
    fn selectors_match_the_deployed_interface() {
        assert_eq!(hex::encode(messageCall::SELECTOR), "e21f37ce");
        assert_eq!(hex::encode(setMessageCall::SELECTOR), "368b8772");
    }

    #[test]
    fn contract_address_is_validated() {
        assert!(parse_contract_address(DEFAULT_CONTRACT_ADDRESS).is_ok());
        assert!(matches!(
            parse_contract_address("0x1234"),
            Err(ContractError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn reads_the_stored_message() -> anyhow::Result<()> {
        let provider = Eip1193Provider::new(FakeWallet::with_message("gm"));
        let contract = contract_for(&provider, "0xabc");

        assert_eq!(contract.message().await?, "gm");
        Ok(())
    }

    #[tokio::test]
    async fn write_then_read_round_trips() -> anyhow::Result<()> {
        let provider = Eip1193Provider::new(FakeWallet::default());
        provider.transport().set_receipt_delay(2);
        let contract = contract_for(&provider, "0xabc");

        let pending = contract.set_message("Hello, Ethereum!").await?;
        let receipt = pending.wait().await?;

        assert_eq!(&receipt.transaction_hash, pending.hash());
        assert_eq!(contract.message().await?, "Hello, Ethereum!");
        assert_eq!(provider.transport().receipt_polls(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn reverted_transaction_is_an_error() -> anyhow::Result<()> {
        let provider = Eip1193Provider::new(FakeWallet::with_message("before"));
        provider.transport().revert_writes(true);
        let contract = contract_for(&provider, "0xabc");

        let pending = contract.set_message("after").await?;
        assert!(matches!(pending.wait().await, Err(ContractError::Reverted(_))));
        assert_eq!(contract.message().await?, "before");
        Ok(())
    }

    #[test]
    fn garbage_return_data_fails_to_decode() {
        assert!(matches!(
            decode_message("0xzz"),
            Err(ContractError::Decode { method: "message", .. })
        ));
        assert!(matches!(
            decode_message("0x"),
            Err(ContractError::Decode { method: "message", .. })
        ));
    }
}
