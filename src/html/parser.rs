use crate::html::selector::{ElementView, Selector};
use regex::Regex;
use std::sync::OnceLock;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

// 內容不解析成子節點，原樣保留到對應的結束標籤
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HtmlElement {
    pub tag: String,
    pub attrs: Vec<Attribute>,
    pub children: Vec<HtmlNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HtmlNode {
    Element(HtmlElement),
    Text(String),
    Comment(String),
}

impl HtmlElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    #[cfg(test)]
    fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    pub fn is_void(&self) -> bool {
        is_void(&self.tag)
    }
}

impl ElementView for HtmlElement {
    fn tag_name(&self) -> &str {
        &self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        HtmlElement::attribute(self, name)
    }
}

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(
            r#"<!--(?s:(.*?))-->|<(/)?([A-Za-z][A-Za-z0-9:-]*)((?:\s*[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*(/)?>"#,
        )
        .expect("tag pattern is valid")
    })
}

fn attr_pattern() -> &'static Regex {
    static ATTR: OnceLock<Regex> = OnceLock::new();
    ATTR.get_or_init(|| {
        Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("attribute pattern is valid")
    })
}

fn parse_attributes(source: &str) -> Vec<Attribute> {
    attr_pattern()
        .captures_iter(source)
        .map(|caps| Attribute {
            name: caps[1].to_ascii_lowercase(),
            value: caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string()),
        })
        .collect()
}

fn append(root: &mut Vec<HtmlNode>, stack: &mut [HtmlElement], node: HtmlNode) {
    match stack.last_mut() {
        Some(open) => open.children.push(node),
        None => root.push(node),
    }
}

fn close_top(root: &mut Vec<HtmlNode>, stack: &mut Vec<HtmlElement>) {
    if let Some(element) = stack.pop() {
        append(root, stack, HtmlNode::Element(element));
    }
}

/// 解析 HTML 片段。不做實體解碼，文字與屬性值原樣保留，
/// 未閉合的元素在片段結尾自動閉合，多餘的結束標籤直接忽略。
pub fn parse_fragment(html: &str) -> Vec<HtmlNode> {
    let mut root = Vec::new();
    let mut stack: Vec<HtmlElement> = Vec::new();
    let mut pos = 0;

    while let Some(caps) = tag_pattern().captures_at(html, pos) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => break,
        };

        if whole.start() > pos {
            append(&mut root, &mut stack, HtmlNode::Text(html[pos..whole.start()].to_string()));
        }
        pos = whole.end();

        if let Some(comment) = caps.get(1) {
            append(&mut root, &mut stack, HtmlNode::Comment(comment.as_str().to_string()));
            continue;
        }

        let tag = caps[3].to_ascii_lowercase();

        if caps.get(2).is_some() {
            if let Some(index) = stack.iter().rposition(|open| open.tag == tag) {
                while stack.len() > index {
                    close_top(&mut root, &mut stack);
                }
            }
            continue;
        }

        let mut element = HtmlElement::new(&tag);
        element.attrs = parse_attributes(caps.get(4).map_or("", |m| m.as_str()));
        let self_closing = caps.get(5).is_some();

        if self_closing || is_void(&tag) {
            append(&mut root, &mut stack, HtmlNode::Element(element));
            continue;
        }

        if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
            let rest = &html[pos..];
            let closing = format!("</{}", tag);
            let (raw, next) = match rest.to_ascii_lowercase().find(&closing) {
                Some(end) => {
                    let after = rest[end..].find('>').map_or(rest.len(), |gt| end + gt + 1);
                    (&rest[..end], pos + after)
                }
                None => (rest, html.len()),
            };
            if !raw.is_empty() {
                element.children.push(HtmlNode::Text(raw.to_string()));
            }
            append(&mut root, &mut stack, HtmlNode::Element(element));
            pos = next;
            continue;
        }

        stack.push(element);
    }

    if pos < html.len() {
        append(&mut root, &mut stack, HtmlNode::Text(html[pos..].to_string()));
    }
    while !stack.is_empty() {
        close_top(&mut root, &mut stack);
    }

    root
}

pub fn serialize(nodes: &[HtmlNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

pub(crate) fn write_start_tag(tag: &str, attrs: &[Attribute], out: &mut String) {
    out.push('<');
    out.push_str(tag);
    for attr in attrs {
        out.push(' ');
        out.push_str(&attr.name);
        if let Some(value) = &attr.value {
            out.push_str("=\"");
            out.push_str(&value.replace('"', "&quot;"));
            out.push('"');
        }
    }
    out.push('>');
}

fn write_node(node: &HtmlNode, out: &mut String) {
    match node {
        HtmlNode::Text(text) => out.push_str(text),
        HtmlNode::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        HtmlNode::Element(element) => {
            write_start_tag(&element.tag, &element.attrs, out);
            if element.is_void() {
                return;
            }
            for child in &element.children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
fn collect_text(nodes: &[HtmlNode], out: &mut String) {
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.push_str(text),
            HtmlNode::Element(element) => collect_text(&element.children, out),
            HtmlNode::Comment(_) => {}
        }
    }
}

/// First element in document order that matches `selector`.
pub fn find_first<'a>(nodes: &'a [HtmlNode], selector: &Selector) -> Option<&'a HtmlElement> {
    for node in nodes {
        if let HtmlNode::Element(element) = node {
            if selector.matches(element) {
                return Some(element);
            }
            if let Some(found) = find_first(&element.children, selector) {
                return Some(found);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_markup_round_trips() {
        let html = r#"<div id="ruleset-card-7" class="card shared"><h3>Walls</h3><span data-shared="True">Shared</span></div>"#;
        assert_eq!(serialize(&parse_fragment(html)), html);
    }

    #[test]
    fn test_void_and_self_closing_elements_have_no_children() {
        let nodes = parse_fragment(r#"<p>a<br>b<img src="x.png"/>c</p>"#);
        let HtmlNode::Element(p) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(p.children.len(), 5);
        assert_eq!(p.text_content(), "abc");
        assert_eq!(serialize(&nodes), r#"<p>a<br>b<img src="x.png">c</p>"#);
    }

    #[test]
    fn test_attribute_forms() {
        let nodes = parse_fragment(r#"<input name='severity' value=Error disabled data-x = "1">"#);
        let HtmlNode::Element(input) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(input.attribute("name"), Some("severity"));
        assert_eq!(input.attribute("value"), Some("Error"));
        assert_eq!(input.attribute("disabled"), Some(""));
        assert_eq!(input.attribute("data-x"), Some("1"));
        assert_eq!(input.attribute("missing"), None);
    }

    #[test]
    fn test_attributes_without_separating_whitespace() {
        let nodes = parse_fragment(r#"<tr class="rule"id="row-9"><td>x</td></tr>"#);
        let HtmlNode::Element(row) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(row.tag, "tr");
        assert_eq!(row.attribute("class"), Some("rule"));
        assert_eq!(row.attribute("id"), Some("row-9"));
        assert_eq!(
            serialize(&nodes),
            r#"<tr class="rule" id="row-9"><td>x</td></tr>"#
        );
    }

    #[test]
    fn test_unclosed_and_stray_tags() {
        let nodes = parse_fragment("<div><span>open</div></section>tail");
        assert_eq!(serialize(&nodes), "<div><span>open</span></div>tail");
    }

    #[test]
    fn test_raw_text_elements_keep_markup_as_text() {
        let nodes = parse_fragment("<textarea name=\"note\"><b>not bold</b></textarea><b>x</b>");
        let HtmlNode::Element(textarea) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(textarea.text_content(), "<b>not bold</b>");
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_comments_are_preserved() {
        let html = "<!-- rules --><ul><li>one</li></ul>";
        let nodes = parse_fragment(html);
        assert!(matches!(&nodes[0], HtmlNode::Comment(c) if c == " rules "));
        assert_eq!(serialize(&nodes), html);
    }

    #[test]
    fn test_find_first_in_document_order() {
        let nodes = parse_fragment(
            r#"<div><p data-shared="False">a</p></div><p data-shared="True">b</p>"#,
        );
        let selector = Selector::parse("[data-shared]").unwrap();
        let found = find_first(&nodes, &selector).unwrap();
        assert_eq!(found.attribute("data-shared"), Some("False"));
    }
}
