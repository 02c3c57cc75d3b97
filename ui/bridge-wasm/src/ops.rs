//! User-triggered bridge operations.

use crate::dom::{self, Elements};
use crate::state;
use crate::view;
use mb_types::WalletAddress;

/// Written when the message field is left empty.
pub const DEFAULT_MESSAGE: &str = "Hello, Ethereum!";

pub async fn on_connect(els: &Elements) {
    let Some(bridge) = state::bridge() else {
        return;
    };
    gloo_console::log!("Requesting accounts...");
    let base = state::session();
    let outcome = bridge.connect(base.clone()).await;
    view::apply(els, outcome.rebase(&base, state::session()));
}

pub async fn on_set_message(els: &Elements) {
    let Some(bridge) = state::bridge() else {
        return;
    };
    let typed = dom::get_input_value(&els.message_input);
    let new_message = if typed.is_empty() {
        DEFAULT_MESSAGE.to_string()
    } else {
        typed
    };

    let base = state::session();
    let write = bridge.write_message(base.clone(), &new_message);
    els.set_message_btn.set_disabled(true);
    let outcome = write.await;
    if outcome.notices.is_empty() {
        gloo_console::log!("Transaction successful!");
    }
    // The wallet may have switched accounts while the write was pending.
    view::apply(els, outcome.rebase(&base, state::session()));
}

pub async fn on_accounts_changed(els: &Elements, accounts: Vec<WalletAddress>) {
    let Some(bridge) = state::bridge() else {
        return;
    };
    let base = state::session();
    let outcome = bridge.accounts_changed(base.clone(), accounts).await;
    view::apply(els, outcome.rebase(&base, state::session()));
}
