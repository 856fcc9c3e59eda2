use crate::utils::error::{Result, UiError};

/// Read access to an element, enough to evaluate a [`Selector`] against it.
pub trait ElementView {
    fn tag_name(&self) -> &str;
    /// Boolean attributes report `Some("")`.
    fn attribute(&self, name: &str) -> Option<&str>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SimpleSelector {
    Universal,
    Tag(String),
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
}

impl SimpleSelector {
    fn matches<E: ElementView + ?Sized>(&self, element: &E) -> bool {
        match self {
            SimpleSelector::Universal => true,
            SimpleSelector::Tag(tag) => element.tag_name().eq_ignore_ascii_case(tag),
            SimpleSelector::Id(id) => element.attribute("id") == Some(id.as_str()),
            SimpleSelector::Class(class) => element
                .attribute("class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == class)),
            SimpleSelector::Attribute { name, value } => match (element.attribute(name), value) {
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
                (None, _) => false,
            },
        }
    }
}

/// Compound CSS selectors (`tr`, `#main-content`, `.condition-row`, `tr.editing`,
/// `[data-shared]`, `[data-shared="True"]`) and comma-separated lists of them.
/// Combinators are not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Vec<SimpleSelector>>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self> {
        let alternatives = input
            .split(',')
            .map(|part| parse_compound(input, part.trim()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { alternatives })
    }

    pub fn matches<E: ElementView + ?Sized>(&self, element: &E) -> bool {
        self.alternatives
            .iter()
            .any(|compound| compound.iter().all(|simple| simple.matches(element)))
    }
}

impl std::str::FromStr for Selector {
    type Err = UiError;

    fn from_str(s: &str) -> Result<Self> {
        Selector::parse(s)
    }
}

fn invalid(selector: &str, reason: impl Into<String>) -> UiError {
    UiError::InvalidSelector {
        selector: selector.to_string(),
        reason: reason.into(),
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn take_ident<'a>(full: &str, rest: &'a str) -> Result<(&'a str, &'a str)> {
    let end = rest
        .char_indices()
        .find(|(_, c)| !is_ident_char(*c))
        .map_or(rest.len(), |(i, _)| i);
    if end == 0 {
        return Err(invalid(full, "expected an identifier"));
    }
    Ok((&rest[..end], &rest[end..]))
}

fn parse_compound(full: &str, part: &str) -> Result<Vec<SimpleSelector>> {
    if part.is_empty() {
        return Err(invalid(full, "empty selector"));
    }

    let mut simples = Vec::new();
    let mut rest = part;

    while let Some(c) = rest.chars().next() {
        match c {
            '*' => {
                simples.push(SimpleSelector::Universal);
                rest = &rest[1..];
            }
            '#' => {
                let (ident, tail) = take_ident(full, &rest[1..])?;
                simples.push(SimpleSelector::Id(ident.to_string()));
                rest = tail;
            }
            '.' => {
                let (ident, tail) = take_ident(full, &rest[1..])?;
                simples.push(SimpleSelector::Class(ident.to_string()));
                rest = tail;
            }
            '[' => {
                let close = rest
                    .find(']')
                    .ok_or_else(|| invalid(full, "unterminated attribute selector"))?;
                simples.push(parse_attribute(full, &rest[1..close])?);
                rest = &rest[close + 1..];
            }
            c if is_ident_char(c) && simples.is_empty() => {
                let (ident, tail) = take_ident(full, rest)?;
                simples.push(SimpleSelector::Tag(ident.to_ascii_lowercase()));
                rest = tail;
            }
            c if c.is_whitespace() || matches!(c, '>' | '+' | '~') => {
                return Err(invalid(full, "combinators are not supported"));
            }
            other => return Err(invalid(full, format!("unexpected character '{}'", other))),
        }
    }

    Ok(simples)
}

fn parse_attribute(full: &str, body: &str) -> Result<SimpleSelector> {
    let body = body.trim();
    match body.split_once('=') {
        None => {
            let (name, tail) = take_ident(full, body)?;
            if !tail.is_empty() {
                return Err(invalid(full, "unsupported attribute operator"));
            }
            Ok(SimpleSelector::Attribute {
                name: name.to_ascii_lowercase(),
                value: None,
            })
        }
        Some((name, value)) => {
            let name = name.trim();
            if name.is_empty() || !name.chars().all(is_ident_char) {
                return Err(invalid(full, "unsupported attribute operator"));
            }
            let value = value.trim();
            let unquoted = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            Ok(SimpleSelector::Attribute {
                name: name.to_ascii_lowercase(),
                value: Some(unquoted.to_string()),
            })
        }
    }
}
