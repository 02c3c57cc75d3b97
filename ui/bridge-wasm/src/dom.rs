//! DOM element bindings.
//!
//! All fields are resolved once at startup.

use wasm_bindgen::prelude::*;
use web_sys::{Element, HtmlButtonElement, HtmlElement, HtmlInputElement};

pub fn by_id(id: &str) -> Option<Element> {
    gloo_utils::document().get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn get_input_value(el: &HtmlInputElement) -> String {
    el.value().trim().to_string()
}

pub fn set_visible(el: &HtmlElement, visible: bool) {
    let _ = el
        .style()
        .set_property("display", if visible { "" } else { "none" });
}

pub fn toggle_class(el: &Element, cls: &str, force: bool) {
    let _ = el.class_list().toggle_with_force(cls, force);
}

/// Blocking alert, the page's only notice channel.
pub fn alert(text: &str) {
    let _ = gloo_utils::window().alert_with_message(text);
}

#[derive(Clone)]
pub struct Elements {
    pub connect_btn: HtmlButtonElement,
    pub connected_panel: HtmlElement,
    pub account_label: Element,
    pub message_label: Element,
    pub message_input: HtmlInputElement,
    pub set_message_btn: HtmlButtonElement,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

macro_rules! get_typed {
    ($ty:ty, $id:expr) => {
        by_id_typed::<$ty>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing {} #{}", stringify!($ty), $id)))?
    };
}

impl Elements {
    /// Resolve all DOM references. Call once after the document has loaded.
    pub fn bind() -> Result<Elements, JsValue> {
        Ok(Elements {
            connect_btn: get_typed!(HtmlButtonElement, "connectBtn"),
            connected_panel: get_typed!(HtmlElement, "connectedPanel"),
            account_label: get_el!("accountLabel"),
            message_label: get_el!("messageLabel"),
            message_input: get_typed!(HtmlInputElement, "messageInput"),
            set_message_btn: get_typed!(HtmlButtonElement, "setMessageBtn"),
        })
    }
}
