use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Ordered multi-map of form fields, the equivalent of a browser `FormData`.
/// Duplicate keys are allowed and insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormPayload {
    fields: Vec<(String, String)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl IntoIterator for FormPayload {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Body accepted by `update` / `patch`: either a ready form payload or plain fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormInput {
    Form(FormPayload),
    Fields(BTreeMap<String, String>),
}

impl FormInput {
    pub fn into_payload(self) -> FormPayload {
        match self {
            FormInput::Form(payload) => payload,
            FormInput::Fields(fields) => fields.into_iter().collect(),
        }
    }
}

impl Default for FormInput {
    fn default() -> Self {
        FormInput::Fields(BTreeMap::new())
    }
}

impl From<FormPayload> for FormInput {
    fn from(payload: FormPayload) -> Self {
        FormInput::Form(payload)
    }
}

impl From<BTreeMap<String, String>> for FormInput {
    fn from(fields: BTreeMap<String, String>) -> Self {
        FormInput::Fields(fields)
    }
}

impl From<HashMap<String, String>> for FormInput {
    fn from(fields: HashMap<String, String>) -> Self {
        FormInput::Fields(fields.into_iter().collect())
    }
}

/// Decoded response of an authenticated request.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text),
            ResponseBody::Json(_) => None,
        }
    }

    /// Markup to splice into the page. JSON strings are used unquoted,
    /// any other JSON value is written out as compact JSON.
    pub fn into_html(self) -> String {
        match self {
            ResponseBody::Text(text) => text,
            ResponseBody::Json(serde_json::Value::String(s)) => s,
            ResponseBody::Json(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HashMap<String, String>,
    pub body: Option<FormPayload>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn form(mut self, body: FormPayload) -> Self {
        self.body = Some(body);
        self
    }
}

/// A UI event as seen by the page controller.
#[derive(Debug, Clone)]
pub struct UiEvent<N> {
    target: Option<N>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl<N> UiEvent<N> {
    pub fn new(target: N) -> Self {
        Self {
            target: Some(target),
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn without_target() -> Self {
        Self {
            target: None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn target(&self) -> Option<&N> {
        self.target.as_ref()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Visual state of a rule row. Stored on the row as CSS classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Normal,
    Editing,
    Deleting,
}

impl RowState {
    pub const EDITING_CLASS: &'static str = "editing";
    pub const DELETING_CLASS: &'static str = "deleting";

    pub fn from_classes(editing: bool, deleting: bool) -> Self {
        match (editing, deleting) {
            (_, true) => RowState::Deleting,
            (true, false) => RowState::Editing,
            (false, false) => RowState::Normal,
        }
    }
}
