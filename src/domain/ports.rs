use crate::domain::model::FormPayload;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Source of bearer tokens. Called once per request, never cached by the client.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Option<String>;
}

/// Toast sink plus the severity-color refresh hook of the page.
pub trait Notifier: Send + Sync {
    fn show_toast(&self, message: &str, is_error: bool);

    fn refresh_severity_colors(&self) {}
}

/// Interactive yes/no prompt.
pub trait Confirm: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// The subset of the DOM the client and the page controller touch.
///
/// Selector arguments use the compound syntax of [`crate::html::Selector`];
/// queries return the first match in document order.
pub trait Document {
    type Node: Clone + PartialEq + std::fmt::Debug;

    fn query_selector(&self, selector: &str) -> Option<Self::Node>;

    /// Descendants of `scope` matching `selector`, in document order.
    fn query_selector_all(&self, scope: &Self::Node, selector: &str) -> Vec<Self::Node>;

    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&self, node: &Self::Node, selector: &str) -> Option<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Element children only.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn body(&self) -> Option<Self::Node>;

    fn inner_html(&self, node: &Self::Node) -> String;

    fn set_inner_html(&self, node: &Self::Node, html: &str);

    /// `insertAdjacentHTML("beforeend", html)`.
    fn append_html(&self, node: &Self::Node, html: &str);

    fn remove(&self, node: &Self::Node);

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn add_class(&self, node: &Self::Node, class: &str);

    fn remove_class(&self, node: &Self::Node, class: &str);

    fn get_attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    fn set_style(&self, node: &Self::Node, property: &str, value: &str);

    fn create_element(&self, tag: &str) -> Result<Self::Node>;

    fn append_child(&self, parent: &Self::Node, child: &Self::Node);

    fn click(&self, node: &Self::Node);

    /// Successful controls of a form, as the browser would submit them.
    fn form_data(&self, form: &Self::Node) -> FormPayload;

    fn push_history(&self, url: &str);
}
