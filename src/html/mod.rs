// HTML 片段處理：解析、序列化與簡易選擇器

pub mod parser;
pub mod selector;

pub use parser::{find_first, parse_fragment, serialize, Attribute, HtmlElement, HtmlNode};
pub use selector::{ElementView, Selector};
