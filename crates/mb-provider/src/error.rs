use mb_types::{JsonRpcError, METHOD_NOT_FOUND_CODE, USER_REJECTED_CODE};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("no injected wallet provider")]
    Unavailable,
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed {method} response: {reason}")]
    Decode { method: &'static str, reason: String },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == USER_REJECTED_CODE)
    }

    pub fn is_method_not_found(&self) -> bool {
        matches!(self, Self::Rpc { code, .. } if *code == METHOD_NOT_FOUND_CODE)
    }
}

impl From<JsonRpcError> for ProviderError {
    fn from(err: JsonRpcError) -> Self {
        Self::Rpc {
            code: err.code,
            message: err.message,
        }
    }
}
