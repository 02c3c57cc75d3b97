//! Mediates between an injected wallet provider and the message board
//! contract.
//!
//! Every operation takes the current [`Session`] snapshot and returns an
//! [`Outcome`]: the next snapshot plus any notices for the user. Failures
//! never escape; they leave the snapshot as it was and surface a notice.

mod config;
mod error;
mod notice;
mod session;

pub use config::{
    BridgeConfig, DEFAULT_CALL_TIMEOUT, DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_RECEIPT_POLL_INTERVAL,
};
pub use error::BridgeError;
pub use notice::Notice;
pub use session::{ContractHandle, ProviderStatus, Session, SessionState, Transition, reconcile};

use mb_contract::{MessageBoardContract, MessageContract};
use mb_provider::{Timer, WalletProvider, with_timeout};
use mb_types::WalletAddress;
use std::cell::Cell;
use std::rc::Rc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Outcome {
    pub session: Session,
    pub notices: Vec<Notice>,
    /// Underlying causes of `notices`, for console logging.
    pub diagnostics: Vec<String>,
}

impl Outcome {
    fn quiet(session: Session) -> Self {
        Self {
            session,
            notices: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn failed(session: Session, err: BridgeError) -> Self {
        if err.is_user_rejection() {
            warn!("request rejected by user: {err}");
        } else {
            warn!("{err}");
        }
        Self {
            session,
            notices: vec![err.notice()],
            diagnostics: vec![err.to_string()],
        }
    }

    /// Settles an outcome started from `base` against the page's `current`
    /// snapshot.
    ///
    /// If the account binding moved on while the operation ran, `current`
    /// wins and only the notices are kept. Its own rebinding already
    /// triggered a fresh read.
    pub fn rebase(mut self, base: &Session, current: Session) -> Self {
        if !base.same_binding(&current) {
            info!(
                stale = ?self.session.active_account(),
                current = ?current.active_account(),
                "discarding snapshot from a superseded binding"
            );
            self.session = current;
        }
        self
    }
}

pub struct Bridge {
    provider: Option<Rc<dyn WalletProvider>>,
    timer: Rc<dyn Timer>,
    config: BridgeConfig,
    write_in_flight: Cell<bool>,
}

/// Holds the single write slot; released on drop, including cancellation.
struct WriteSlot<'a>(&'a Cell<bool>);

impl<'a> WriteSlot<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        Some(Self(flag))
    }
}

impl Drop for WriteSlot<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Bridge {
    /// `provider` is `None` when no wallet was injected into the page.
    pub fn new(
        provider: Option<Rc<dyn WalletProvider>>,
        timer: Rc<dyn Timer>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            provider,
            timer,
            config,
            write_in_flight: Cell::new(false),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn is_write_pending(&self) -> bool {
        self.write_in_flight.get()
    }

    /// Detects the provider and adopts any pre-authorized account without prompting.
    pub async fn initialize(&self) -> Outcome {
        let mut session = Session::default();
        let Some(provider) = &self.provider else {
            session.provider = ProviderStatus::Unavailable;
            return Outcome::failed(session, BridgeError::ProviderUnavailable);
        };
        session.provider = ProviderStatus::Detected;

        let accounts = with_timeout(
            self.timer.as_ref(),
            self.config.call_timeout,
            provider.list_accounts(),
        )
        .await;

        match accounts {
            Ok(accounts) => {
                info!(count = accounts.len(), "authorized accounts enumerated");
                self.settle(session.with_accounts(accounts)).await
            }
            Err(err) => Outcome::failed(session, BridgeError::Enumeration(err)),
        }
    }

    /// Prompts the wallet for authorization and adopts the first account.
    pub async fn connect(&self, session: Session) -> Outcome {
        match self.authorize().await {
            Ok(accounts) => {
                info!(count = accounts.len(), "wallet connected");
                self.settle(session.with_accounts(accounts)).await
            }
            Err(err) => Outcome::failed(session, err),
        }
    }

    async fn authorize(&self) -> Result<Vec<WalletAddress>, BridgeError> {
        let provider = self.provider.as_ref().ok_or(BridgeError::ProviderUnavailable)?;

        // Waits on the user's approval dialog, so no call bound applies.
        provider
            .request_accounts()
            .await
            .map_err(BridgeError::Authorization)?;
        let accounts = with_timeout(
            self.timer.as_ref(),
            self.config.call_timeout,
            provider.list_accounts(),
        )
        .await
        .map_err(BridgeError::Authorization)?;

        if accounts.is_empty() {
            return Err(BridgeError::NoAccounts);
        }
        Ok(accounts)
    }

    /// Applies an account list pushed by the wallet (its `accountsChanged` event).
    pub async fn accounts_changed(&self, session: Session, accounts: Vec<WalletAddress>) -> Outcome {
        if session.provider != ProviderStatus::Detected {
            return Outcome::quiet(session);
        }
        info!(count = accounts.len(), "wallet accounts changed");
        self.settle(session.with_accounts(accounts)).await
    }

    /// Refreshes the message through the session's contract handle.
    pub async fn read_message(&self, session: Session) -> Outcome {
        let Some(handle) = session.contract.clone() else {
            return Outcome::failed(session, BridgeError::NotInitialized);
        };

        let read = with_timeout(
            self.timer.as_ref(),
            self.config.call_timeout,
            handle.proxy().message(),
        )
        .await;

        match read {
            Ok(message) => Outcome::quiet(session.with_message(message)),
            Err(err) => Outcome::failed(session, BridgeError::Read(err)),
        }
    }

    /// Submits `setMessage`, waits for inclusion, then re-reads the value.
    ///
    /// A second write while one is pending is rejected without touching the
    /// network. Submission waits for the user to sign and is not bounded;
    /// only the confirmation wait is.
    pub async fn write_message(&self, session: Session, new_message: &str) -> Outcome {
        let Some(handle) = session.contract.clone() else {
            return Outcome::failed(session, BridgeError::NotInitialized);
        };
        let Some(slot) = WriteSlot::acquire(&self.write_in_flight) else {
            return Outcome::failed(session, BridgeError::WriteInFlight);
        };

        // Signing is unbounded so the slot also covers a late approval.
        let confirmed = async {
            let pending = handle.proxy().set_message(new_message).await?;
            with_timeout(
                self.timer.as_ref(),
                self.config.confirmation_timeout,
                pending.wait(),
            )
            .await
        }
        .await;
        drop(slot);

        match confirmed {
            Ok(receipt) => {
                info!(tx = %receipt.transaction_hash, "message updated");
                self.read_message(session).await
            }
            Err(err) => Outcome::failed(session, BridgeError::Write(err)),
        }
    }

    /// Runs the handle transition and performs the read a fresh binding calls for.
    async fn settle(&self, session: Session) -> Outcome {
        let (session, transition) = reconcile(session, |account| self.bind(account));
        match transition {
            Transition::Bound => {
                if let Some(handle) = session.contract() {
                    info!(contract = %handle.address(), signer = %handle.signer(), "contract bound");
                }
                self.read_message(session).await
            }
            Transition::Unbound => {
                info!("contract handle dropped, no active account");
                Outcome::quiet(session)
            }
            Transition::Unchanged => Outcome::quiet(session),
        }
    }

    fn bind(&self, account: &WalletAddress) -> Option<Rc<dyn MessageContract>> {
        let provider = self.provider.as_ref()?;
        Some(Rc::new(MessageBoardContract::new(
            self.config.contract_address.clone(),
            provider.signer(account),
            Rc::clone(&self.timer),
            self.config.receipt_poll_interval,
        )))
    }
}
