//! Content resolution: title, description and body.

use super::boilerplate;
use super::page::{Page, json_str};
use super::text::{char_len, clean, element_text};
use crate::models::ContentSource;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

static META_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static ARTICLE_CONTAINERS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "article, div.article, div.content, div.post, div.entry-content, div.article-body",
    )
    .unwrap()
});
static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static TAG_SCAN: Lazy<Selector> = Lazy::new(|| Selector::parse("h1, h2, h3, p, span").unwrap());

/// Length thresholds shared by the content layers.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    /// Minimum characters for a body to count.
    pub min_body_len: usize,
    /// Minimum characters for one text fragment to be kept.
    pub min_tag_len: usize,
}

/// Title, description and body produced by one content layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContent {
    pub source: ContentSource,
    pub title: String,
    pub description: String,
    pub content: String,
}

/// One way of producing article content from a page.
pub type ContentLayer = fn(&Page, Thresholds) -> Option<ResolvedContent>;

/// Content layers in priority order.
pub const CONTENT_LAYERS: &[ContentLayer] = &[from_json_ld, from_meta, from_boilerplate];

/// Run [`CONTENT_LAYERS`]; the first layer that accepts the page wins.
pub fn resolve(page: &Page, limits: Thresholds) -> Option<ResolvedContent> {
    CONTENT_LAYERS.iter().find_map(|layer| layer(page, limits))
}

/// Structured data: the first JSON-LD entry typed as an article.
///
/// Accepted even with an empty body; augmentation may fill it in later.
fn from_json_ld(page: &Page, _limits: Thresholds) -> Option<ResolvedContent> {
    let node = page.json_ld_articles().next()?;
    let field = |key: &str| json_str(node, key).map(clean).unwrap_or_default();
    Some(ResolvedContent {
        source: ContentSource::JsonLd,
        title: field("headline"),
        description: field("description"),
        content: field("articleBody"),
    })
}

/// Page metadata: requires a `<title>`; body from an article container.
fn from_meta(page: &Page, limits: Thresholds) -> Option<ResolvedContent> {
    let title = clean(&page.title());
    if title.is_empty() {
        return None;
    }
    let description = page
        .meta_content(&META_DESCRIPTION)
        .map(clean)
        .unwrap_or_default();
    Some(ResolvedContent {
        source: ContentSource::Meta,
        title,
        description,
        content: container_text(page, limits).unwrap_or_default(),
    })
}

/// Generic main-content heuristic over the whole document.
fn from_boilerplate(page: &Page, limits: Thresholds) -> Option<ResolvedContent> {
    let text = boilerplate::main_text(page.document())?;
    if char_len(&text) < limits.min_body_len {
        return None;
    }
    let mut title = clean(&page.title());
    if title.is_empty() {
        title = text.lines().next().map(clean).unwrap_or_default();
    }
    Some(ResolvedContent {
        source: ContentSource::Boilerplate,
        title,
        description: String::new(),
        content: text,
    })
}

/// Paragraph text of the first article container long enough to count.
fn container_text(page: &Page, limits: Thresholds) -> Option<String> {
    page.select(&ARTICLE_CONTAINERS).find_map(|container| {
        let body = container
            .select(&PARAGRAPHS)
            .map(element_text)
            .filter(|t| char_len(t) >= limits.min_tag_len)
            .join("\n");
        (char_len(&body) >= limits.min_body_len).then_some(body)
    })
}

/// Broad scan over headings, paragraphs and spans, used when the resolved
/// body is too short.
///
/// An element nested inside another scanned element (a `<span>` inside a
/// `<p>`) is skipped since its text is already part of the outer one.
/// Identical sibling paragraphs are all kept.
pub fn tag_scan(page: &Page, limits: Thresholds) -> String {
    page.select(&TAG_SCAN)
        .filter(|el| !el.ancestors().filter_map(ElementRef::wrap).any(|a| TAG_SCAN.matches(&a)))
        .map(element_text)
        .filter(|t| char_len(t) >= limits.min_tag_len)
        .join("\n")
}
