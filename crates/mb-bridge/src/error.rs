use mb_contract::ContractError;
use mb_provider::ProviderError;
use thiserror::Error;

use crate::Notice;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("wallet provider unavailable")]
    ProviderUnavailable,
    #[error("account authorization failed: {0}")]
    Authorization(ProviderError),
    #[error("account enumeration failed: {0}")]
    Enumeration(ProviderError),
    #[error("wallet returned no accounts")]
    NoAccounts,
    #[error("message read failed: {0}")]
    Read(ContractError),
    #[error("message write failed: {0}")]
    Write(ContractError),
    #[error("contract not initialized")]
    NotInitialized,
    #[error("a message write is already in flight")]
    WriteInFlight,
}

impl BridgeError {
    pub fn notice(&self) -> Notice {
        match self {
            Self::ProviderUnavailable => Notice::WalletNotInstalled,
            Self::Authorization(_) => Notice::ConnectionFailed,
            Self::Enumeration(_) => Notice::AccountFetchFailed,
            Self::NoAccounts => Notice::NoAccountsFound,
            Self::Read(_) => Notice::MessageFetchFailed,
            Self::Write(_) => Notice::MessageUpdateFailed,
            Self::NotInitialized => Notice::ContractNotInitialized,
            Self::WriteInFlight => Notice::WriteInFlight,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        match self {
            Self::Authorization(err) | Self::Enumeration(err) => err.is_user_rejection(),
            Self::Write(ContractError::Provider(err)) => err.is_user_rejection(),
            _ => false,
        }
    }
}
