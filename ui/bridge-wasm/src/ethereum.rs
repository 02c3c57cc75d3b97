//! The injected `window.ethereum` provider.
//!
//! Forwards EIP-1193 `request({ method, params })` calls and exposes the
//! `accountsChanged` subscription.

use async_trait::async_trait;
use js_sys::{Function, Promise, Reflect};
use mb_provider::{ProviderError, RpcTransport};
use mb_types::{EthereumRequest, WalletAddress};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[derive(Serialize)]
struct RequestArguments<'a> {
    method: &'a str,
    params: &'a Value,
}

#[derive(Clone)]
pub struct InjectedTransport {
    ethereum: JsValue,
}

impl InjectedTransport {
    /// Returns `None` when no wallet extension injected itself into the page.
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        let ethereum = Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
        if ethereum.is_undefined() || ethereum.is_null() {
            return None;
        }
        Some(Self { ethereum })
    }

    /// Subscribes to the wallet's `accountsChanged` event for the page's lifetime.
    pub fn on_accounts_changed<F>(&self, mut handler: F) -> Result<(), JsValue>
    where
        F: FnMut(Vec<WalletAddress>) + 'static,
    {
        let on: Function = Reflect::get(&self.ethereum, &JsValue::from_str("on"))?.dyn_into()?;
        let cb = Closure::wrap(Box::new(move |accounts: JsValue| {
            match serde_wasm_bindgen::from_value::<Vec<String>>(accounts) {
                Ok(accounts) => handler(accounts.into_iter().map(WalletAddress).collect()),
                Err(err) => {
                    gloo_console::warn!(format!("ignoring malformed accountsChanged payload: {err}"));
                }
            }
        }) as Box<dyn FnMut(JsValue)>);
        on.call2(
            &self.ethereum,
            &JsValue::from_str("accountsChanged"),
            cb.as_ref().unchecked_ref(),
        )?;
        cb.forget();
        Ok(())
    }

    fn send(&self, method: &'static str, params: &Value) -> Result<Promise, ProviderError> {
        let args = RequestArguments { method, params }
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|err| ProviderError::Transport(format!("{method}: {err}")))?;

        let request: Function = Reflect::get(&self.ethereum, &JsValue::from_str("request"))
            .and_then(|f| f.dyn_into())
            .map_err(|_| ProviderError::Transport("provider has no request()".to_string()))?;

        request
            .call1(&self.ethereum, &args)
            .map_err(|err| provider_error(method, err))?
            .dyn_into::<Promise>()
            .map_err(|_| ProviderError::Transport(format!("{method}: request() did not return a Promise")))
    }
}

#[async_trait(?Send)]
impl RpcTransport for InjectedTransport {
    async fn request(&self, request: &EthereumRequest) -> Result<Value, ProviderError> {
        let method = request.method();
        let promise = self.send(method, &request.params())?;
        let result = JsFuture::from(promise)
            .await
            .map_err(|err| provider_error(method, err))?;

        serde_wasm_bindgen::from_value(result).map_err(|err| ProviderError::Decode {
            method,
            reason: err.to_string(),
        })
    }
}

/// Wallets reject with `{ code, message }`; anything else is a transport failure.
fn provider_error(method: &'static str, err: JsValue) -> ProviderError {
    let message = Reflect::get(&err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|c| c.as_f64());

    match code {
        Some(code) => ProviderError::Rpc {
            code: code as i64,
            message,
        },
        None => ProviderError::Transport(format!("{method}: {message}")),
    }
}
