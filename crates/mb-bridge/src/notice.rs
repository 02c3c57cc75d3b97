use std::fmt;

/// Blocking, plain-text message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    WalletNotInstalled,
    AccountFetchFailed,
    ConnectionFailed,
    NoAccountsFound,
    MessageFetchFailed,
    ContractNotInitialized,
    MessageUpdateFailed,
    WriteInFlight,
}

impl Notice {
    pub fn text(self) -> &'static str {
        match self {
            Self::WalletNotInstalled => "MetaMask is not installed",
            Self::AccountFetchFailed => "Error fetching accounts",
            Self::ConnectionFailed => "Error connecting to MetaMask",
            Self::NoAccountsFound => "No accounts found",
            Self::MessageFetchFailed => "Error fetching message",
            Self::ContractNotInitialized => "Contract is not initialized",
            Self::MessageUpdateFailed => "Error updating message",
            Self::WriteInFlight => "A message update is already in progress",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}
