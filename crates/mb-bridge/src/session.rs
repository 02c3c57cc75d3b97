//! Immutable per-session snapshot and the transition that keeps the
//! contract handle in step with the active account.

use mb_contract::MessageContract;
use mb_types::{ContractAddress, WalletAddress};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderStatus {
    #[default]
    Unknown,
    Detected,
    Unavailable,
}

/// Where a session stands, derived from the snapshot's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Unavailable,
    ProviderDetected,
    AccountsEnumerated,
    ConnectedWithContract,
    MessageLoaded,
    MessageStale,
}

/// Contract proxy bound to the active account as transaction signer.
#[derive(Clone)]
pub struct ContractHandle {
    proxy: Rc<dyn MessageContract>,
}

impl ContractHandle {
    pub fn new(proxy: Rc<dyn MessageContract>) -> Self {
        Self { proxy }
    }

    pub fn address(&self) -> &ContractAddress {
        self.proxy.address()
    }

    pub fn signer(&self) -> &WalletAddress {
        self.proxy.signer()
    }

    pub fn proxy(&self) -> &dyn MessageContract {
        self.proxy.as_ref()
    }
}

impl fmt::Debug for ContractHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractHandle")
            .field("address", self.address())
            .field("signer", self.signer())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub(crate) provider: ProviderStatus,
    pub(crate) accounts_enumerated: bool,
    pub(crate) known_accounts: Vec<WalletAddress>,
    pub(crate) active_account: Option<WalletAddress>,
    pub(crate) contract: Option<ContractHandle>,
    pub(crate) message: Option<String>,
    pub(crate) message_fresh: bool,
}

impl Session {
    pub fn provider(&self) -> ProviderStatus {
        self.provider
    }

    pub fn known_accounts(&self) -> &[WalletAddress] {
        &self.known_accounts
    }

    pub fn active_account(&self) -> Option<&WalletAddress> {
        self.active_account.as_ref()
    }

    pub fn contract(&self) -> Option<&ContractHandle> {
        self.contract.as_ref()
    }

    /// Last value read from the contract; `None` until the first successful read.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn state(&self) -> SessionState {
        match self.provider {
            ProviderStatus::Unknown => SessionState::Uninitialized,
            ProviderStatus::Unavailable => SessionState::Unavailable,
            ProviderStatus::Detected if !self.accounts_enumerated => SessionState::ProviderDetected,
            ProviderStatus::Detected => match (&self.contract, &self.message) {
                (None, _) => SessionState::AccountsEnumerated,
                (Some(_), _) if self.message_fresh => SessionState::MessageLoaded,
                (Some(_), None) => SessionState::ConnectedWithContract,
                (Some(_), Some(_)) => SessionState::MessageStale,
            },
        }
    }

    /// Adopts an enumeration result: the first account becomes active.
    pub(crate) fn with_accounts(mut self, accounts: Vec<WalletAddress>) -> Self {
        self.active_account = accounts.first().cloned();
        self.known_accounts = accounts;
        self.accounts_enumerated = true;
        self
    }

    /// Same provider status, active account and handle signer.
    pub(crate) fn same_binding(&self, other: &Session) -> bool {
        self.provider == other.provider
            && self.active_account == other.active_account
            && self.contract().map(ContractHandle::signer)
                == other.contract().map(ContractHandle::signer)
    }

    pub(crate) fn with_message(mut self, message: String) -> Self {
        self.message = Some(message);
        self.message_fresh = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// A new handle was bound; its message has not been read yet.
    Bound,
    Unbound,
}

/// Brings the contract handle in line with provider and active account.
///
/// The handle exists exactly when a provider is detected and an account is
/// active, and it is always bound to that account. `bind` builds a proxy for
/// an account, or returns `None` when no provider is at hand.
pub fn reconcile<F>(mut session: Session, bind: F) -> (Session, Transition)
where
    F: FnOnce(&WalletAddress) -> Option<Rc<dyn MessageContract>>,
{
    let wanted = match session.provider {
        ProviderStatus::Detected => session.active_account.clone(),
        _ => None,
    };

    let Some(account) = wanted else {
        return match session.contract.take() {
            Some(_) => {
                session.message_fresh = false;
                (session, Transition::Unbound)
            }
            None => (session, Transition::Unchanged),
        };
    };

    if session
        .contract
        .as_ref()
        .is_some_and(|handle| handle.signer() == &account)
    {
        return (session, Transition::Unchanged);
    }

    match bind(&account) {
        Some(proxy) => {
            session.contract = Some(ContractHandle::new(proxy));
            session.message_fresh = false;
            (session, Transition::Bound)
        }
        None => {
            let transition = if session.contract.take().is_some() {
                Transition::Unbound
            } else {
                Transition::Unchanged
            };
            session.message_fresh = false;
            (session, transition)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mb_contract::{ContractError, PendingTransaction};

    struct Stub {
        address: ContractAddress,
        signer: WalletAddress,
    }

    #[async_trait::async_trait(?Send)]
    impl MessageContract for Stub {
        fn address(&self) -> &ContractAddress {
            &self.address
        }

        fn signer(&self) -> &WalletAddress {
            &self.signer
        }

        async fn message(&self) -> Result<String, ContractError> {
            Ok(String::new())
        }

        async fn set_message(&self, _: &str) -> Result<PendingTransaction, ContractError> {
            Err(ContractError::InvalidAddress("stub".to_owned()))
        }
    }

    fn stub(account: &WalletAddress) -> Option<Rc<dyn MessageContract>> {
        Some(Rc::new(Stub {
            address: ContractAddress("0xc0ffee".to_owned()),
            signer: account.clone(),
        }))
    }

    fn addr(raw: &str) -> WalletAddress {
        WalletAddress(raw.to_owned())
    }

    fn detected() -> Session {
        Session {
            provider: ProviderStatus::Detected,
            ..Default::default()
        }
    }

    #[test]
    fn binds_once_account_is_active() {
        let session = detected().with_accounts(vec![addr("0xa"), addr("0xb")]);
        let (session, transition) = reconcile(session, stub);

        assert_eq!(transition, Transition::Bound);
        assert_eq!(session.contract().map(ContractHandle::signer), Some(&addr("0xa")));
        assert_eq!(session.state(), SessionState::ConnectedWithContract);

        let (session, transition) = reconcile(session, stub);
        assert_eq!(transition, Transition::Unchanged);
        assert!(session.contract().is_some());
    }

    #[test]
    fn rebinds_on_account_change_and_marks_message_stale() {
        let session = detected().with_accounts(vec![addr("0xa")]);
        let (session, _) = reconcile(session, stub);
        let session = session.with_message("old".to_owned());
        assert_eq!(session.state(), SessionState::MessageLoaded);

        let (session, transition) = reconcile(session.with_accounts(vec![addr("0xb")]), stub);
        assert_eq!(transition, Transition::Bound);
        assert_eq!(session.contract().map(ContractHandle::signer), Some(&addr("0xb")));
        assert_eq!(session.state(), SessionState::MessageStale);
    }

    #[test]
    fn unbinds_when_account_disappears() {
        let session = detected().with_accounts(vec![addr("0xa")]);
        let (session, _) = reconcile(session, stub);

        let (session, transition) = reconcile(session.with_accounts(Vec::new()), stub);
        assert_eq!(transition, Transition::Unbound);
        assert!(session.contract().is_none());
        assert_eq!(session.state(), SessionState::AccountsEnumerated);
    }

    #[test]
    fn never_binds_without_a_provider() {
        let session = Session {
            provider: ProviderStatus::Unavailable,
            active_account: Some(addr("0xa")),
            ..Default::default()
        };
        let (session, transition) = reconcile(session, stub);

        assert_eq!(transition, Transition::Unchanged);
        assert!(session.contract().is_none());
        assert_eq!(session.state(), SessionState::Unavailable);

        let (session, _) = reconcile(detected().with_accounts(vec![addr("0xa")]), |_| None);
        assert!(session.contract().is_none());
    }

    #[test]
    fn fresh_session_is_uninitialized() {
        let session = Session::default();
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(session.message(), None);
        assert!(session.known_accounts().is_empty());
    }
}
