//! The extraction pipeline: one fetched page in, at most one [`Article`] out.
//!
//! Every field is resolved by an ordered list of independent strategies and
//! the first one that produces a value wins:
//!
//! - [`content`]: JSON-LD, then page metadata, then a boilerplate heuristic,
//!   with a broad tag scan to top up bodies that come out too short
//! - [`dates`]: JSON-LD, `<time>`, `<meta>`, labelled text
//! - [`author`]: JSON-LD, `<meta name="author">`, byline elements
//! - [`category`]: breadcrumb, section meta, URL path
//!
//! [`page::Page`] parses the HTML once; the strategies only borrow it.

pub mod author;
pub mod boilerplate;
pub mod category;
pub mod content;
pub mod dates;
pub mod page;
pub mod text;

use crate::config::CrawlerConfig;
use crate::models::{Article, ParseLayer};
use content::Thresholds;
use dates::DateParser;
use page::Page;
use text::char_len;
use tracing::debug;

/// Stateless article extractor configured with length thresholds and the
/// offset assumed for zone-less dates.
#[derive(Debug, Clone, Copy)]
pub struct ArticleExtractor {
    limits: Thresholds,
    dates: DateParser,
}

impl ArticleExtractor {
    pub fn new(limits: Thresholds, dates: DateParser) -> Self {
        Self { limits, dates }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            Thresholds {
                min_body_len: config.min_body_length,
                min_tag_len: config.min_tag_length,
            },
            DateParser::new(config.default_offset()),
        )
    }

    /// Run the full pipeline; `None` means the page is not an article.
    pub fn extract_page(&self, page: &Page) -> Option<Article> {
        let resolved = content::resolve(page, self.limits)?;
        let mut parse_layer = ParseLayer::new(resolved.source);
        let mut body = resolved.content;

        if char_len(&body) < self.limits.min_body_len {
            let scanned = content::tag_scan(page, self.limits);
            if char_len(&scanned) >= self.limits.min_body_len {
                debug!(url = %page.url(), layer = %parse_layer, "Body replaced by tag scan");
                body = scanned;
                parse_layer = parse_layer.with_augmentation();
            }
        }

        Some(Article {
            url: page.url().to_string(),
            title: resolved.title,
            description: resolved.description,
            content: body,
            publish_time: dates::resolve_publish_time(page, &self.dates),
            author: author::resolve_author(page),
            category: category::resolve_category(page),
            parse_layer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentSource;
    use chrono::Datelike;

    fn extract(url: &str, html: &str) -> Option<Article> {
        ArticleExtractor::from_config(&CrawlerConfig::default()).extract_page(&Page::parse(url, html))
    }

    fn paragraphs() -> String {
        (1..=3)
            .map(|n| format!("<p>Paragraph {n} covers the harbour expansion and what it means for local fishermen.</p>"))
            .collect()
    }

    #[test]
    fn test_structured_data_beats_meta() {
        let html = format!(
            r#"<html><head>
              <title>Meta title</title>
              <meta name="description" content="Meta description">
              <meta name="author" content="Meta Author">
              <script type="application/ld+json">{{
                "@type": "NewsArticle",
                "headline": "Harbour expansion approved",
                "description": "The port grows.",
                "articleBody": "{body}",
                "datePublished": "2024-03-05T08:00:00+07:00",
                "author": {{"@type": "Person", "name": "Lan Pham"}}
              }}</script>
            </head><body><div class="content">{paras}</div></body></html>"#,
            body = "x".repeat(200),
            paras = paragraphs()
        );
        let article = extract("https://news.example/kinh-te/harbour.htm", &html).expect("article");
        assert_eq!(article.parse_layer, ParseLayer::new(ContentSource::JsonLd));
        assert_eq!(article.title, "Harbour expansion approved");
        assert_eq!(article.author.as_deref(), Some("Lan Pham"));
        assert_eq!(article.category, "kinh-te");
        assert_eq!(article.publish_time.unwrap().day(), 5);
    }

    #[test]
    fn test_short_structured_body_is_augmented() {
        let html = format!(
            r#"<html><head>
              <script type="application/ld+json">{{"@type":"Article","headline":"H","articleBody":"Too short."}}</script>
            </head><body>{}</body></html>"#,
            paragraphs()
        );
        let article = extract("https://news.example/a.htm", &html).expect("article");
        assert!(article.parse_layer.to_string().ends_with("+Tags"));
        assert_eq!(article.parse_layer.source, ContentSource::JsonLd);
        assert_ne!(article.content, "Too short.");
        assert_eq!(article.content.lines().count(), 3);
    }

    #[test]
    fn test_short_body_kept_when_tag_scan_also_short() {
        let html = r#"<html><head><title>Tag: weather</title></head><body><p>Nothing much here today.</p></body></html>"#;
        let article = extract("https://news.example/tag/weather", html).expect("title alone satisfies the meta layer");
        assert_eq!(article.parse_layer.to_string(), "Meta");
        assert!(article.content.is_empty());
        assert!(article.publish_time.is_none());
    }

    #[test]
    fn test_not_an_article() {
        assert!(extract("https://news.example/", "<html><body></body></html>").is_none());
    }
}
