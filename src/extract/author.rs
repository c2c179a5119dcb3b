//! Author resolution: JSON-LD, then `<meta name="author">`, then bylines.

use super::page::Page;
use super::text::{clean, element_text};
use once_cell::sync::Lazy;
use scraper::Selector;
use serde_json::Value;

static META_AUTHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="author"]"#).unwrap());
static BYLINE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.byline, span.author, div.author").unwrap());

pub type AuthorStrategy = fn(&Page) -> Option<String>;

pub const AUTHOR_STRATEGIES: &[AuthorStrategy] = &[from_json_ld, from_meta, from_byline];

pub fn resolve_author(page: &Page) -> Option<String> {
    AUTHOR_STRATEGIES.iter().find_map(|strategy| strategy(page))
}

fn from_json_ld(page: &Page) -> Option<String> {
    page.json_ld()
        .iter()
        .filter_map(|node| node.get("author"))
        .find_map(author_name)
}

/// `"Jane"`, `{"name": "Jane"}` or `[{"name": "Jane"}, ...]`.
fn author_name(author: &Value) -> Option<String> {
    let raw = match author {
        Value::String(name) => name.as_str(),
        Value::Object(_) => author.get("name")?.as_str()?,
        Value::Array(items) => return items.first().and_then(author_name),
        _ => return None,
    };
    let name = clean(raw);
    (!name.is_empty()).then_some(name)
}

fn from_meta(page: &Page) -> Option<String> {
    let name = clean(page.meta_content(&META_AUTHOR)?);
    (!name.is_empty()).then_some(name)
}

fn from_byline(page: &Page) -> Option<String> {
    page.select(&BYLINE)
        .map(element_text)
        .find(|name| !name.is_empty())
}
