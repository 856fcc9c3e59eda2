use crate::domain::model::FormPayload;
use crate::domain::ports::Document;
use crate::html::{parse_fragment, serialize, Attribute, ElementView, HtmlElement, HtmlNode, Selector};
use crate::utils::error::Result;
use std::sync::{Mutex, PoisonError};

/// Handle to a node of a [`MemoryDocument`].
///
/// Removing a node, or replacing it through `set_inner_html`, frees its subtree and
/// recycles the slots. Handles to freed nodes no longer resolve and every operation
/// on them is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// A file download started by clicking an anchor with a `download` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub href: String,
    pub file_name: String,
}

#[derive(Debug)]
enum NodeKind {
    Root,
    Element { tag: String, attrs: Vec<Attribute> },
    Text(String),
    Comment(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

struct ElementRef<'a> {
    tag: &'a str,
    attrs: &'a [Attribute],
}

impl ElementView for ElementRef<'_> {
    fn tag_name(&self) -> &str {
        self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_deref().unwrap_or(""))
    }
}

const ROOT: usize = 0;
const BODY: usize = 1;

#[derive(Debug)]
struct Arena {
    slots: Vec<Slot>,
    free: Vec<usize>,
    history: Vec<String>,
    downloads: Vec<Download>,
}

impl Arena {
    fn new() -> Self {
        let mut arena = Self {
            slots: Vec::new(),
            free: Vec::new(),
            history: Vec::new(),
            downloads: Vec::new(),
        };
        arena.alloc(NodeKind::Root);
        arena.alloc(NodeKind::Element {
            tag: "body".to_string(),
            attrs: Vec::new(),
        });
        arena.attach(ROOT, BODY);
        arena
    }

    fn alloc(&mut self, kind: NodeKind) -> usize {
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        };
        match self.free.pop() {
            Some(index) => {
                self.slots[index].data = Some(data);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    data: Some(data),
                });
                self.slots.len() - 1
            }
        }
    }

    /// Frees `index` and its whole subtree. The node must already be detached.
    fn release(&mut self, index: usize) {
        let mut stack = vec![index];
        while let Some(next) = stack.pop() {
            let Some(slot) = self.slots.get_mut(next) else {
                continue;
            };
            if let Some(data) = slot.data.take() {
                slot.generation = slot.generation.wrapping_add(1);
                stack.extend(data.children);
                self.free.push(next);
            }
        }
    }

    fn node(&self, index: usize) -> Option<&NodeData> {
        self.slots.get(index)?.data.as_ref()
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut NodeData> {
        self.slots.get_mut(index)?.data.as_mut()
    }

    fn handle(&self, index: usize) -> NodeId {
        NodeId {
            index,
            generation: self.slots[index].generation,
        }
    }

    fn resolve(&self, id: &NodeId) -> Option<usize> {
        let slot = self.slots.get(id.index)?;
        (slot.generation == id.generation && slot.data.is_some()).then_some(id.index)
    }

    fn parent_of(&self, index: usize) -> Option<usize> {
        self.node(index)?.parent
    }

    fn children_of(&self, index: usize) -> &[usize] {
        self.node(index)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    fn is_inclusive_ancestor(&self, ancestor: usize, index: usize) -> bool {
        let mut current = Some(index);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent_of(id);
        }
        false
    }

    fn attach(&mut self, parent: usize, child: usize) {
        if self.is_inclusive_ancestor(child, parent) {
            tracing::warn!("Cannot insert a node into its own subtree");
            return;
        }
        self.detach(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    fn detach(&mut self, index: usize) {
        let parent = self.node_mut(index).and_then(|n| n.parent.take());
        if let Some(node) = parent.and_then(|p| self.node_mut(p)) {
            node.children.retain(|&c| c != index);
        }
    }

    fn clear_children(&mut self, index: usize) {
        let children = self
            .node_mut(index)
            .map(|n| std::mem::take(&mut n.children))
            .unwrap_or_default();
        for child in children {
            self.release(child);
        }
    }

    fn insert_fragment(&mut self, parent: usize, nodes: Vec<HtmlNode>) {
        for node in nodes {
            let id = match node {
                HtmlNode::Text(text) => self.alloc(NodeKind::Text(text)),
                HtmlNode::Comment(text) => self.alloc(NodeKind::Comment(text)),
                HtmlNode::Element(HtmlElement {
                    tag,
                    attrs,
                    children,
                }) => {
                    let id = self.alloc(NodeKind::Element { tag, attrs });
                    self.insert_fragment(id, children);
                    id
                }
            };
            self.attach(parent, id);
        }
    }

    fn element(&self, index: usize) -> Option<ElementRef<'_>> {
        match &self.node(index)?.kind {
            NodeKind::Element { tag, attrs } => Some(ElementRef { tag, attrs }),
            _ => None,
        }
    }

    fn attrs_mut(&mut self, index: usize) -> Option<&mut Vec<Attribute>> {
        match &mut self.node_mut(index)?.kind {
            NodeKind::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    fn attribute(&self, index: usize, name: &str) -> Option<String> {
        self.element(index)?.attribute(name).map(str::to_string)
    }

    fn set_attribute(&mut self, index: usize, name: &str, value: &str) {
        let Some(attrs) = self.attrs_mut(index) else {
            return;
        };
        match attrs.iter_mut().find(|a| a.name.eq_ignore_ascii_case(name)) {
            Some(attr) => attr.value = Some(value.to_string()),
            None => attrs.push(Attribute {
                name: name.to_ascii_lowercase(),
                value: Some(value.to_string()),
            }),
        }
    }

    fn remove_attribute(&mut self, index: usize, name: &str) {
        if let Some(attrs) = self.attrs_mut(index) {
            attrs.retain(|a| !a.name.eq_ignore_ascii_case(name));
        }
    }

    fn matches(&self, index: usize, selector: &Selector) -> bool {
        self.element(index).is_some_and(|el| selector.matches(&el))
    }

    /// Element descendants of `index` in document order, excluding `index` itself.
    fn descendants(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.children_of(index).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if self.element(next).is_some() {
                out.push(next);
            }
            stack.extend(self.children_of(next).iter().rev());
        }
        out
    }

    fn to_html_node(&self, index: usize) -> Option<HtmlNode> {
        match &self.node(index)?.kind {
            NodeKind::Root => None,
            NodeKind::Text(text) => Some(HtmlNode::Text(text.clone())),
            NodeKind::Comment(text) => Some(HtmlNode::Comment(text.clone())),
            NodeKind::Element { tag, attrs } => Some(HtmlNode::Element(HtmlElement {
                tag: tag.clone(),
                attrs: attrs.clone(),
                children: self.children_as_html(index),
            })),
        }
    }

    fn children_as_html(&self, index: usize) -> Vec<HtmlNode> {
        self.children_of(index)
            .iter()
            .filter_map(|&c| self.to_html_node(c))
            .collect()
    }

    fn text_content(&self, index: usize) -> String {
        let mut out = String::new();
        let mut stack = vec![index];
        while let Some(next) = stack.pop() {
            if let Some(NodeKind::Text(text)) = self.node(next).map(|n| &n.kind) {
                out.push_str(text);
            }
            stack.extend(self.children_of(next).iter().rev());
        }
        out
    }

    fn classes(&self, index: usize) -> Vec<String> {
        self.attribute(index, "class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn set_classes(&mut self, index: usize, classes: &[String]) {
        if classes.is_empty() {
            self.remove_attribute(index, "class");
        } else {
            self.set_attribute(index, "class", &classes.join(" "));
        }
    }

    fn form_data(&self, form: usize) -> FormPayload {
        let mut payload = FormPayload::new();
        for id in self.descendants(form) {
            let Some(el) = self.element(id) else {
                continue;
            };
            let Some(name) = el.attribute("name").filter(|n| !n.is_empty()) else {
                continue;
            };
            if el.attribute("disabled").is_some() {
                continue;
            }
            match el.tag {
                "input" => {
                    let kind = el.attribute("type").unwrap_or("text").to_ascii_lowercase();
                    match kind.as_str() {
                        "submit" | "button" | "reset" | "file" | "image" => {}
                        "checkbox" | "radio" => {
                            if el.attribute("checked").is_some() {
                                payload.append(name, el.attribute("value").unwrap_or("on"));
                            }
                        }
                        _ => payload.append(name, el.attribute("value").unwrap_or("")),
                    }
                }
                "textarea" => payload.append(name, self.text_content(id)),
                "select" => {
                    let options: Vec<usize> = self
                        .descendants(id)
                        .into_iter()
                        .filter(|&o| self.element(o).is_some_and(|e| e.tag == "option"))
                        .collect();
                    let selected: Vec<usize> = options
                        .iter()
                        .copied()
                        .filter(|&o| self.attribute(o, "selected").is_some())
                        .collect();
                    let chosen: Vec<usize> = if el.attribute("multiple").is_some() {
                        selected
                    } else {
                        selected.first().or(options.first()).copied().into_iter().collect()
                    };
                    for option in chosen {
                        let value = self
                            .attribute(option, "value")
                            .unwrap_or_else(|| self.text_content(option));
                        payload.append(name, value);
                    }
                }
                _ => {}
            }
        }
        payload
    }

    fn click(&mut self, index: usize) {
        let Some(el) = self.element(index) else {
            return;
        };
        if el.tag != "a" {
            return;
        }
        let href = el.attribute("href").map(str::to_string);
        let download = el.attribute("download").map(str::to_string);
        match (href, download) {
            (Some(href), Some(download)) => {
                let file_name = if download.is_empty() {
                    href.rsplit('/').next().unwrap_or_default().to_string()
                } else {
                    download
                };
                tracing::debug!("Download started: {} -> {}", href, file_name);
                self.downloads.push(Download { href, file_name });
            }
            (Some(href), None) => self.history.push(href),
            _ => {}
        }
    }

    #[cfg(test)]
    fn live_nodes(&self) -> usize {
        self.slots.iter().filter(|s| s.data.is_some()).count()
    }
}

/// In-memory page used by the CLI harness and the test-suite.
pub struct MemoryDocument {
    inner: Mutex<Arena>,
}

impl std::fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocument").field("body", &self.html()).finish()
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Arena::new()),
        }
    }

    /// Builds a page whose `<body>` holds `body_html`.
    pub fn from_html(body_html: &str) -> Self {
        let doc = Self::new();
        doc.with(|arena| arena.insert_fragment(BODY, parse_fragment(body_html)));
        doc
    }

    fn with<R>(&self, f: impl FnOnce(&mut Arena) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Runs `f` on the live node behind `node`; stale handles yield `R::default()`.
    fn with_node<R: Default>(&self, node: &NodeId, f: impl FnOnce(&mut Arena, usize) -> R) -> R {
        self.with(|arena| match arena.resolve(node) {
            Some(index) => f(arena, index),
            None => R::default(),
        })
    }

    fn selector(selector: &str) -> Option<Selector> {
        match Selector::parse(selector) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }

    /// Serialized content of `<body>`.
    pub fn html(&self) -> String {
        self.with(|arena| serialize(&arena.children_as_html(BODY)))
    }

    /// Inner HTML of the first element matching `selector`.
    pub fn inner_html_of(&self, selector: &str) -> Option<String> {
        let node = self.query_selector(selector)?;
        Some(self.inner_html(&node))
    }

    pub fn history(&self) -> Vec<String> {
        self.with(|arena| arena.history.clone())
    }

    /// Last URL pushed into the history, if any.
    pub fn location(&self) -> Option<String> {
        self.with(|arena| arena.history.last().cloned())
    }

    pub fn downloads(&self) -> Vec<Download> {
        self.with(|arena| arena.downloads.clone())
    }

    pub fn is_connected(&self, node: &NodeId) -> bool {
        self.with_node(node, |arena, index| arena.is_inclusive_ancestor(ROOT, index))
    }
}

impl Document for MemoryDocument {
    type Node = NodeId;

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        let selector = Self::selector(selector)?;
        self.with(|arena| {
            arena
                .descendants(ROOT)
                .into_iter()
                .find(|&id| arena.matches(id, &selector))
                .map(|id| arena.handle(id))
        })
    }

    fn query_selector_all(&self, scope: &NodeId, selector: &str) -> Vec<NodeId> {
        let Some(selector) = Self::selector(selector) else {
            return Vec::new();
        };
        self.with_node(scope, |arena, index| {
            arena
                .descendants(index)
                .into_iter()
                .filter(|&id| arena.matches(id, &selector))
                .map(|id| arena.handle(id))
                .collect()
        })
    }

    fn closest(&self, node: &NodeId, selector: &str) -> Option<NodeId> {
        let selector = Self::selector(selector)?;
        self.with_node(node, |arena, index| {
            let mut current = Some(index);
            while let Some(id) = current {
                if arena.matches(id, &selector) {
                    return Some(arena.handle(id));
                }
                current = arena.parent_of(id);
            }
            None
        })
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.with_node(node, |arena, index| {
            arena
                .parent_of(index)
                .filter(|&p| p != ROOT)
                .map(|p| arena.handle(p))
        })
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.with_node(node, |arena, index| {
            arena
                .children_of(index)
                .iter()
                .copied()
                .filter(|&c| arena.element(c).is_some())
                .map(|c| arena.handle(c))
                .collect()
        })
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.with(|arena| arena.handle(BODY)))
    }

    fn inner_html(&self, node: &NodeId) -> String {
        self.with_node(node, |arena, index| serialize(&arena.children_as_html(index)))
    }

    fn set_inner_html(&self, node: &NodeId, html: &str) {
        let fragment = parse_fragment(html);
        self.with_node(node, |arena, index| {
            arena.clear_children(index);
            arena.insert_fragment(index, fragment);
        });
    }

    fn append_html(&self, node: &NodeId, html: &str) {
        let fragment = parse_fragment(html);
        self.with_node(node, |arena, index| arena.insert_fragment(index, fragment));
    }

    fn remove(&self, node: &NodeId) {
        self.with_node(node, |arena, index| {
            if index == ROOT || index == BODY {
                return;
            }
            arena.detach(index);
            arena.release(index);
        });
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.with_node(node, |arena, index| {
            arena.classes(index).iter().any(|c| c == class)
        })
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        self.with_node(node, |arena, index| {
            let mut classes = arena.classes(index);
            if !classes.iter().any(|c| c == class) {
                classes.push(class.to_string());
                arena.set_classes(index, &classes);
            }
        });
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        self.with_node(node, |arena, index| {
            let mut classes = arena.classes(index);
            let before = classes.len();
            classes.retain(|c| c != class);
            if classes.len() != before {
                arena.set_classes(index, &classes);
            }
        });
    }

    fn get_attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.with_node(node, |arena, index| arena.attribute(index, name))
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.with_node(node, |arena, index| arena.set_attribute(index, name, value));
    }

    fn set_style(&self, node: &NodeId, property: &str, value: &str) {
        self.with_node(node, |arena, index| {
            let current = arena.attribute(index, "style").unwrap_or_default();
            let mut declarations: Vec<String> = current
                .split(';')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .filter(|d| {
                    d.split(':')
                        .next()
                        .is_some_and(|p| !p.trim().eq_ignore_ascii_case(property))
                })
                .map(str::to_string)
                .collect();
            declarations.push(format!("{}: {}", property, value));
            arena.set_attribute(index, "style", &format!("{};", declarations.join("; ")));
        });
    }

    fn create_element(&self, tag: &str) -> Result<NodeId> {
        Ok(self.with(|arena| {
            let index = arena.alloc(NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
                attrs: Vec::new(),
            });
            arena.handle(index)
        }))
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) {
        self.with(|arena| {
            if let (Some(parent), Some(child)) = (arena.resolve(parent), arena.resolve(child)) {
                arena.attach(parent, child);
            }
        });
    }

    fn click(&self, node: &NodeId) {
        self.with_node(node, |arena, index| arena.click(index));
    }

    fn form_data(&self, form: &NodeId) -> FormPayload {
        self.with_node(form, |arena, index| arena.form_data(index))
    }

    fn push_history(&self, url: &str) {
        self.with(|arena| arena.history.push(url.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<main id="main-content"><table><tbody id="rules"><tr id="r1" class="rule-row"><td><button class="edit">Edit</button></td></tr><tr id="r2" class="rule-row editing"><td>two</td></tr></tbody></table></main>"#;

    #[test]
    fn test_round_trips_body_markup() {
        let doc = MemoryDocument::from_html(PAGE);
        assert_eq!(doc.html(), PAGE);
    }

    #[test]
    fn test_query_and_closest() {
        let doc = MemoryDocument::from_html(PAGE);
        let button = doc.query_selector("button.edit").unwrap();
        let row = doc.closest(&button, "tr").unwrap();
        assert_eq!(doc.get_attribute(&row, "id").as_deref(), Some("r1"));

        let tbody = doc.parent(&row).unwrap();
        assert_eq!(doc.children(&tbody).len(), 2);
        assert_eq!(doc.query_selector_all(&tbody, ".rule-row").len(), 2);
        assert!(doc.query_selector("#missing").is_none());
        assert!(doc.query_selector("div span").is_none());
    }

    #[test]
    fn test_set_inner_html_detaches_old_children() {
        let doc = MemoryDocument::from_html(PAGE);
        let row = doc.query_selector("#r1").unwrap();
        let main = doc.query_selector("#main-content").unwrap();

        doc.set_inner_html(&main, "<div>replaced</div>");
        assert_eq!(doc.inner_html_of("#main-content").as_deref(), Some("<div>replaced</div>"));
        assert!(!doc.is_connected(&row));
        assert!(doc.query_selector("#r1").is_none());
    }

    #[test]
    fn test_rendered_row_with_glued_attributes_is_queryable() {
        let doc = MemoryDocument::from_html(r#"<table><tbody id="rules"></tbody></table>"#);
        let rules = doc.query_selector("#rules").unwrap();

        doc.set_inner_html(&rules, r#"<tr class="rule"id="row-9"><td>x</td></tr>"#);
        let row = doc.query_selector("#row-9").unwrap();
        assert!(doc.has_class(&row, "rule"));
        assert_eq!(
            doc.inner_html(&rules),
            r#"<tr class="rule" id="row-9"><td>x</td></tr>"#
        );
    }

    #[test]
    fn test_class_list_operations() {
        let doc = MemoryDocument::from_html(PAGE);
        let row = doc.query_selector("#r2").unwrap();
        assert!(doc.has_class(&row, "editing"));

        doc.remove_class(&row, "editing");
        doc.add_class(&row, "deleting");
        doc.add_class(&row, "deleting");
        assert_eq!(doc.get_attribute(&row, "class").as_deref(), Some("rule-row deleting"));
    }

    #[test]
    fn test_set_style_replaces_property() {
        let doc = MemoryDocument::from_html(r#"<button style="color: red; display: block">New</button>"#);
        let button = doc.query_selector("button").unwrap();
        doc.set_style(&button, "display", "none");
        assert_eq!(
            doc.get_attribute(&button, "style").as_deref(),
            Some("color: red; display: none;")
        );
    }

    #[test]
    fn test_append_html_and_remove() {
        let doc = MemoryDocument::from_html(r#"<div id="conditions-container"></div>"#);
        let container = doc.query_selector("#conditions-container").unwrap();
        doc.append_html(&container, r#"<div class="condition-row">0</div>"#);
        doc.append_html(&container, r#"<div class="condition-row">1</div>"#);
        assert_eq!(doc.query_selector_all(&container, ".condition-row").len(), 2);

        let first = doc.query_selector(".condition-row").unwrap();
        doc.remove(&first);
        assert_eq!(
            doc.inner_html(&container),
            r#"<div class="condition-row">1</div>"#
        );
    }

    #[test]
    fn test_anchor_click_records_download() {
        let doc = MemoryDocument::new();
        let a = doc.create_element("a").unwrap();
        doc.set_attribute(&a, "href", "/api/rulesets/5/export");
        doc.set_attribute(&a, "download", "ruleset-5.tsv");
        let body = doc.body().unwrap();
        doc.append_child(&body, &a);
        doc.click(&a);
        doc.remove(&a);

        assert_eq!(
            doc.downloads(),
            vec![Download {
                href: "/api/rulesets/5/export".to_string(),
                file_name: "ruleset-5.tsv".to_string(),
            }]
        );
        assert_eq!(doc.html(), "");
    }

    #[test]
    fn test_form_data_collects_successful_controls() {
        let doc = MemoryDocument::from_html(
            r#"<form id="rule-form">
<input type="text" name="name" value="Wall height">
<input type="hidden" name="rule_id" value="9">
<input type="checkbox" name="enabled" checked>
<input type="checkbox" name="archived" value="yes">
<input type="text" name="locked" value="x" disabled>
<select name="severity"><option value="Info">Info</option><option value="Error" selected>Error</option></select>
<select name="property"><option>Height</option><option>Width</option></select>
<textarea name="message">Too tall</textarea>
<button type="submit" name="go">Save</button>
</form>"#,
        );
        let form = doc.query_selector("#rule-form").unwrap();
        let data = doc.form_data(&form);

        let pairs: Vec<_> = data.iter().collect();
        assert_eq!(
            pairs,
            vec![
                ("name", "Wall height"),
                ("rule_id", "9"),
                ("enabled", "on"),
                ("severity", "Error"),
                ("property", "Height"),
                ("message", "Too tall"),
            ]
        );
    }

    #[test]
    fn test_rerender_recycles_slots() {
        let doc = MemoryDocument::from_html(r#"<table><tbody id="rules-container"></tbody></table>"#);
        let container = doc.query_selector("#rules-container").unwrap();
        let baseline = doc.with(|arena| arena.live_nodes());

        for _ in 0..1000 {
            doc.set_inner_html(&container, "<tr><td>a</td><td>b</td></tr>");
        }

        // 一列 tr、兩個 td、兩段文字
        assert_eq!(doc.with(|arena| arena.live_nodes()), baseline + 5);
        assert!(doc.with(|arena| arena.slots.len()) < 100);
    }

    #[test]
    fn test_removed_node_frees_subtree() {
        let doc = MemoryDocument::from_html(r#"<div id="conditions-container"></div>"#);
        let container = doc.query_selector("#conditions-container").unwrap();
        let baseline = doc.with(|arena| arena.live_nodes());

        doc.append_html(&container, r#"<div class="condition-row"><input name="v"></div>"#);
        let row = doc.query_selector(".condition-row").unwrap();
        doc.remove(&row);

        assert_eq!(doc.with(|arena| arena.live_nodes()), baseline);
        assert_eq!(doc.inner_html(&container), "");
    }

    #[test]
    fn test_stale_handle_does_not_touch_recycled_slot() {
        let doc = MemoryDocument::from_html(r#"<div id="box"><span id="old">x</span></div>"#);
        let boxed = doc.query_selector("#box").unwrap();
        let old = doc.query_selector("#old").unwrap();

        doc.set_inner_html(&boxed, r#"<span id="new">y</span>"#);
        doc.add_class(&old, "editing");
        doc.set_attribute(&old, "id", "hijacked");

        assert!(!doc.is_connected(&old));
        assert!(doc.get_attribute(&old, "id").is_none());
        assert_eq!(doc.inner_html(&boxed), r#"<span id="new">y</span>"#);
    }

    #[test]
    fn test_cannot_append_ancestor_into_descendant() {
        let doc = MemoryDocument::from_html(r#"<div id="outer"><p id="inner"></p></div>"#);
        let outer = doc.query_selector("#outer").unwrap();
        let inner = doc.query_selector("#inner").unwrap();

        doc.append_child(&inner, &outer);
        assert_eq!(doc.html(), r#"<div id="outer"><p id="inner"></p></div>"#);
    }
}
