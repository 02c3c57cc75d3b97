//! Projects a session snapshot onto the page.

use crate::dom::{self, Elements};
use crate::state;
use mb_bridge::Outcome;

/// Stores the new snapshot, raises its notices and re-renders.
pub fn apply(els: &Elements, outcome: Outcome) {
    for detail in &outcome.diagnostics {
        gloo_console::error!(detail.as_str());
    }
    state::set_session(outcome.session);
    render(els);
    for notice in &outcome.notices {
        dom::alert(notice.text());
    }
}

pub fn render(els: &Elements) {
    let session = state::session();
    let write_pending = state::bridge().is_some_and(|b| b.is_write_pending());

    match session.active_account() {
        None => {
            dom::set_visible(&els.connect_btn, true);
            dom::set_visible(&els.connected_panel, false);
        }
        Some(account) => {
            dom::set_visible(&els.connect_btn, false);
            dom::set_visible(&els.connected_panel, true);
            dom::set_text(&els.account_label, &account.0);
            dom::set_text(&els.message_label, session.message().unwrap_or_default());
        }
    }

    els.set_message_btn.set_disabled(write_pending);
    dom::toggle_class(&els.set_message_btn, "pending", write_pending);
}
