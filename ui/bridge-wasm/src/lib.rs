//! Message board front-end.
//!
//! Connects the injected browser wallet to the message board contract and
//! renders the connected account and the stored message.

pub mod dom;
pub mod ethereum;
pub mod events;
pub mod ops;
pub mod state;
pub mod timer;
pub mod view;

use mb_bridge::{Bridge, BridgeConfig};
use mb_provider::{Eip1193Provider, WalletProvider};
use std::rc::Rc;
use wasm_bindgen::prelude::*;

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    init().await
}

async fn init() -> Result<(), JsValue> {
    let els = dom::Elements::bind()?;
    view::render(&els);

    let injected = ethereum::InjectedTransport::detect();
    let provider = injected
        .clone()
        .map(|transport| Rc::new(Eip1193Provider::new(transport)) as Rc<dyn WalletProvider>);
    let bridge = state::install_bridge(Bridge::new(
        provider,
        Rc::new(timer::GlooTimer),
        BridgeConfig::default(),
    ));

    events::bind_events(&els)?;

    let outcome = bridge.initialize().await;
    view::apply(&els, outcome);

    if let Some(injected) = &injected {
        events::bind_wallet_events(&els, injected)?;
    }

    Ok(())
}
