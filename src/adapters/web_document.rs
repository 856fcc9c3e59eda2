//! Browser backend: the ports implemented over `web-sys`.
//!
//! Built with `--features web` for `wasm32-unknown-unknown`. Selector syntax is
//! whatever the browser accepts, which is a superset of [`crate::html::Selector`].
use crate::domain::model::FormPayload;
use crate::domain::ports::{Confirm, Document, Notifier};
use crate::utils::error::{Result, UiError};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, FormData, HtmlElement, HtmlFormElement};

fn js_error(err: JsValue) -> UiError {
    UiError::DomError {
        message: err.as_string().unwrap_or_else(|| format!("{:?}", err)),
    }
}

fn log_js_error(operation: &str, result: std::result::Result<(), JsValue>) {
    if let Err(err) = result {
        tracing::warn!("{} failed: {}", operation, js_error(err));
    }
}

/// The live page document.
#[derive(Debug, Clone)]
pub struct WebDocument {
    window: web_sys::Window,
    document: web_sys::Document,
}

impl WebDocument {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| UiError::DomError {
            message: "no global window".to_string(),
        })?;
        let document = window.document().ok_or_else(|| UiError::DomError {
            message: "window has no document".to_string(),
        })?;
        Ok(Self { window, document })
    }
}

impl Document for WebDocument {
    type Node = Element;

    fn query_selector(&self, selector: &str) -> Option<Element> {
        match self.document.query_selector(selector) {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!("query_selector({}): {}", selector, js_error(err));
                None
            }
        }
    }

    fn query_selector_all(&self, scope: &Element, selector: &str) -> Vec<Element> {
        let list = match scope.query_selector_all(selector) {
            Ok(list) => list,
            Err(err) => {
                tracing::warn!("query_selector_all({}): {}", selector, js_error(err));
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn closest(&self, node: &Element, selector: &str) -> Option<Element> {
        node.closest(selector).ok().flatten()
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn children(&self, node: &Element) -> Vec<Element> {
        let children = node.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .collect()
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn inner_html(&self, node: &Element) -> String {
        node.inner_html()
    }

    fn set_inner_html(&self, node: &Element, html: &str) {
        node.set_inner_html(html);
    }

    fn append_html(&self, node: &Element, html: &str) {
        log_js_error("insertAdjacentHTML", node.insert_adjacent_html("beforeend", html));
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_class(&self, node: &Element, class: &str) {
        log_js_error("classList.add", node.class_list().add_1(class));
    }

    fn remove_class(&self, node: &Element, class: &str) {
        log_js_error("classList.remove", node.class_list().remove_1(class));
    }

    fn get_attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        log_js_error("setAttribute", node.set_attribute(name, value));
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) {
        match node.dyn_ref::<HtmlElement>() {
            Some(element) => log_js_error(
                "style.setProperty",
                element.style().set_property(property, value),
            ),
            None => tracing::warn!("<{}> has no inline style", node.tag_name()),
        }
    }

    fn create_element(&self, tag: &str) -> Result<Element> {
        self.document.create_element(tag).map_err(js_error)
    }

    fn append_child(&self, parent: &Element, child: &Element) {
        if let Err(err) = parent.append_child(child) {
            tracing::warn!("appendChild failed: {}", js_error(err));
        }
    }

    fn click(&self, node: &Element) {
        match node.dyn_ref::<HtmlElement>() {
            Some(element) => element.click(),
            None => tracing::warn!("<{}> is not clickable", node.tag_name()),
        }
    }

    fn form_data(&self, form: &Element) -> FormPayload {
        let mut payload = FormPayload::new();
        let Some(form) = form.dyn_ref::<HtmlFormElement>() else {
            tracing::warn!("<{}> is not a form", form.tag_name());
            return payload;
        };
        let entries = FormData::new_with_form(form)
            .map_err(js_error)
            .and_then(|data| js_sys::try_iter(&data).map_err(js_error));
        let entries = match entries {
            Ok(Some(entries)) => entries,
            Ok(None) => return payload,
            Err(err) => {
                tracing::warn!("Reading form data failed: {}", err);
                return payload;
            }
        };

        for entry in entries.flatten() {
            let pair = js_sys::Array::from(&entry);
            // 檔案欄位不是字串，略過
            if let (Some(name), Some(value)) = (pair.get(0).as_string(), pair.get(1).as_string()) {
                payload.append(name, value);
            }
        }
        payload
    }

    fn push_history(&self, url: &str) {
        let pushed = self
            .window
            .history()
            .and_then(|history| history.push_state_with_url(&JsValue::NULL, "", Some(url)));
        log_js_error("history.pushState", pushed);
    }
}

/// `window.confirm`. A missing window counts as a refusal.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserConfirm;

impl Confirm for BrowserConfirm {
    fn confirm(&self, message: &str) -> bool {
        web_sys::window()
            .and_then(|window| window.confirm_with_message(message).ok())
            .unwrap_or(false)
    }
}

/// Forwards to the page's global `UI.showToast` and `UI.updateSeverityColor`.
/// Falls back to the log when the page does not define them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageNotifier;

impl PageNotifier {
    fn ui_function(name: &str) -> Option<js_sys::Function> {
        let window = web_sys::window()?;
        let ui = js_sys::Reflect::get(&window, &JsValue::from_str("UI")).ok()?;
        if ui.is_undefined() || ui.is_null() {
            return None;
        }
        js_sys::Reflect::get(&ui, &JsValue::from_str(name))
            .ok()?
            .dyn_into::<js_sys::Function>()
            .ok()
    }
}

impl Notifier for PageNotifier {
    fn show_toast(&self, message: &str, is_error: bool) {
        let shown = Self::ui_function("showToast").map(|show| {
            show.call2(
                &JsValue::NULL,
                &JsValue::from_str(message),
                &JsValue::from_bool(is_error),
            )
        });
        match shown {
            Some(Ok(_)) => {}
            Some(Err(err)) => tracing::warn!("showToast failed: {}", js_error(err)),
            None => super::LogNotifier.show_toast(message, is_error),
        }
    }

    fn refresh_severity_colors(&self) {
        if let Some(refresh) = Self::ui_function("updateSeverityColor") {
            if let Err(err) = refresh.call0(&JsValue::NULL) {
                tracing::warn!("updateSeverityColor failed: {}", js_error(err));
            }
        }
    }
}
