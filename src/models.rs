//! Data models shared by the frontier, the extraction pipeline and the sink.
//!
//! - [`UrlTask`]: one unit of crawl work, a URL plus its BFS depth
//! - [`Article`]: the structured result of a successful extraction
//! - [`ParseLayer`]: which content strategy produced an article body

use chrono::{DateTime, FixedOffset};
use serde::{Serialize, Serializer};
use std::fmt;

/// A URL waiting in the frontier, tagged with its distance from a seed.
///
/// Seeds enter at depth 0; every discovered outlink is queued at its
/// parent's depth plus one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTask {
    url: String,
    depth: u32,
}

impl UrlTask {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }
}

/// The content strategy that produced an article body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    /// `application/ld+json` structured data.
    JsonLd,
    /// `<title>`, meta description and an article-container scan.
    Meta,
    /// Text-density main-content heuristic over the whole page.
    Boilerplate,
}

impl ContentSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentSource::JsonLd => "JSON-LD",
            ContentSource::Meta => "Meta",
            ContentSource::Boilerplate => "Boilerplate",
        }
    }
}

/// Diagnostic tag recording how an article's content was obtained.
///
/// Renders as the source name, with a `+Tags` suffix when the body was
/// replaced by the broad tag scan (e.g. `JSON-LD+Tags`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLayer {
    pub source: ContentSource,
    pub augmented: bool,
}

impl ParseLayer {
    pub const AUGMENTATION_MARKER: &'static str = "+Tags";

    pub fn new(source: ContentSource) -> Self {
        Self {
            source,
            augmented: false,
        }
    }

    pub fn with_augmentation(self) -> Self {
        Self {
            augmented: true,
            ..self
        }
    }
}

impl fmt::Display for ParseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source.as_str())?;
        if self.augmented {
            f.write_str(Self::AUGMENTATION_MARKER)?;
        }
        Ok(())
    }
}

impl Serialize for ParseLayer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A news article extracted from one fetch of one page.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub url: String,
    pub title: String,
    pub description: String,
    pub content: String,
    /// Publication instant, kept in the offset it was published with.
    pub publish_time: Option<DateTime<FixedOffset>>,
    pub author: Option<String>,
    pub category: String,
    pub parse_layer: ParseLayer,
}

impl Article {
    /// Host part of the article URL, used to group saved files.
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}
