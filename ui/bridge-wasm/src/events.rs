//! Event binding.
//!
//! Async handlers are spawned via `wasm_bindgen_futures::spawn_local`.

use crate::dom::Elements;
use crate::ethereum::InjectedTransport;
use crate::ops;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Attach an async click handler to an element.
macro_rules! on_click_async {
    ($el:expr, $els:expr, $handler:expr) => {{
        let els = $els.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let els2 = els.clone();
            wasm_bindgen_futures::spawn_local(async move {
                $handler(&els2).await;
            });
        }) as Box<dyn FnMut(_)>);
        $el.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())?;
        cb.forget();
    }};
}

/// Bind all UI event listeners. Call once after init.
pub fn bind_events(els: &Elements) -> Result<(), JsValue> {
    on_click_async!(els.connect_btn, els, ops::on_connect);
    on_click_async!(els.set_message_btn, els, ops::on_set_message);
    Ok(())
}

/// Follow account switches made inside the wallet.
pub fn bind_wallet_events(els: &Elements, injected: &InjectedTransport) -> Result<(), JsValue> {
    let els = els.clone();
    injected.on_accounts_changed(move |accounts| {
        let els2 = els.clone();
        wasm_bindgen_futures::spawn_local(async move {
            ops::on_accounts_changed(&els2, accounts).await;
        });
    })
}
