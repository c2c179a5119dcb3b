//! A fetched page parsed once and shared by every extraction strategy.

use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;

static JSON_LD: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

/// Parsed HTML plus its decoded JSON-LD entries.
pub struct Page {
    url: String,
    document: Html,
    json_ld: Vec<Value>,
}

impl Page {
    pub fn parse(url: &str, html: &str) -> Self {
        let document = Html::parse_document(html);
        let json_ld = collect_json_ld(&document);
        Self {
            url: url.to_string(),
            document,
            json_ld,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Every JSON-LD entry on the page, flattened out of arrays and `@graph`.
    pub fn json_ld(&self) -> &[Value] {
        &self.json_ld
    }

    /// JSON-LD entries typed `NewsArticle` or `Article`.
    pub fn json_ld_articles(&self) -> impl Iterator<Item = &Value> {
        self.json_ld.iter().filter(|node| is_article_type(node))
    }

    pub fn select<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.document.select(selector)
    }

    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.document.select(selector).next()
    }

    /// Raw `<title>` text.
    pub fn title(&self) -> String {
        self.select_first(&TITLE)
            .map(|t| t.text().collect::<String>())
            .unwrap_or_default()
    }

    /// `content` attribute of the first `<meta>` matching `selector`.
    pub fn meta_content(&self, selector: &Selector) -> Option<&str> {
        self.select_first(selector)
            .and_then(|m| m.value().attr("content"))
    }
}

/// Parse every structured-data block. A block that is not valid JSON is
/// skipped; the others still count.
fn collect_json_ld(document: &Html) -> Vec<Value> {
    let mut nodes = Vec::new();
    for script in document.select(&JSON_LD) {
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(root) => flatten_into(root, &mut nodes),
            Err(e) => debug!(
                error = %e,
                block = %truncate_for_log(raw.trim(), 120),
                "Skipping malformed JSON-LD block"
            ),
        }
    }
    nodes
}

fn flatten_into(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        Value::Object(mut map) => {
            if let Some(Value::Array(graph)) = map.remove("@graph") {
                for item in graph {
                    flatten_into(item, out);
                }
            }
            if !map.is_empty() {
                out.push(Value::Object(map));
            }
        }
        _ => {}
    }
}

fn is_article_type(node: &Value) -> bool {
    let is_article =
        |t: &str| t.eq_ignore_ascii_case("NewsArticle") || t.eq_ignore_ascii_case("Article");
    match node.get("@type") {
        Some(Value::String(t)) => is_article(t.as_str()),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(is_article),
        _ => false,
    }
}

/// String value of `key`, or `None` when absent or not a string.
pub fn json_str<'a>(node: &'a Value, key: &str) -> Option<&'a str> {
    node.get(key).and_then(Value::as_str)
}
