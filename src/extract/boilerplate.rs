//! Generic main-content detection for pages without usable markup.
//!
//! Every block container is scored by the paragraph text it holds. Containers
//! that look like navigation, footers, comments and the like are ignored, as
//! are link farms (more than half the text inside anchors). The tightest
//! container still holding most of the best score wins, which keeps `<body>`
//! wrappers from swallowing sidebars.

use super::text::{char_len, element_text};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static CANDIDATES: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article, main, section, div, td").unwrap());
static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static BLOCKS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1, h2, h3, h4, p, li, blockquote, pre").unwrap());
static LINKS: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static BOILERPLATE_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)nav|menu|footer|header|sidebar|comment|share|social|related|advert|\bads?\b|banner|cookie|breadcrumb|promo|widget|subscribe",
    )
    .unwrap()
});

const MAX_LINK_DENSITY: f64 = 0.5;
/// A container within this share of the best score counts as equivalent.
const SCORE_TOLERANCE: f64 = 0.9;
/// Paragraphs shorter than this are treated as UI chrome, not prose.
const MIN_PARAGRAPH_CHARS: usize = 25;

struct Candidate<'a> {
    element: ElementRef<'a>,
    score: usize,
    total_chars: usize,
}

/// Main text of `document`, one block per line, or `None` if nothing on the
/// page looks like prose.
pub fn main_text(document: &Html) -> Option<String> {
    let candidates: Vec<Candidate<'_>> = document
        .select(&CANDIDATES)
        .filter(|el| !looks_like_boilerplate(*el))
        .filter_map(score)
        .collect();

    let best = candidates.iter().map(|c| c.score).max()?;
    if best == 0 {
        return None;
    }
    let threshold = (best as f64 * SCORE_TOLERANCE).ceil() as usize;
    let chosen = candidates
        .iter()
        .filter(|c| c.score >= threshold)
        .min_by_key(|c| c.total_chars)?;

    let lines: Vec<String> = chosen
        .element
        .select(&BLOCKS)
        .filter(|block| !has_block_ancestor_within(*block, chosen.element))
        .filter(|block| !inside_boilerplate(*block, chosen.element))
        .map(element_text)
        .filter(|line| !line.is_empty())
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn looks_like_boilerplate(element: ElementRef<'_>) -> bool {
    let attrs = element.value();
    attrs
        .attr("class")
        .into_iter()
        .chain(attrs.attr("id"))
        .chain(attrs.attr("role"))
        .any(|value| BOILERPLATE_HINT.is_match(value))
}

fn score(element: ElementRef<'_>) -> Option<Candidate<'_>> {
    let total_text = element_text(element);
    let total_chars = char_len(&total_text);
    if total_chars == 0 {
        return None;
    }
    let link_chars: usize = element.select(&LINKS).map(|a| char_len(&element_text(a))).sum();
    if link_chars as f64 / total_chars as f64 > MAX_LINK_DENSITY {
        return None;
    }
    let score = element
        .select(&PARAGRAPHS)
        .filter(|p| !inside_boilerplate(*p, element))
        .map(|p| char_len(&element_text(p)))
        .filter(|len| *len >= MIN_PARAGRAPH_CHARS)
        .sum();
    Some(Candidate {
        element,
        score,
        total_chars,
    })
}

/// True when a container between `node` and `root` looks like boilerplate.
fn inside_boilerplate(node: ElementRef<'_>, root: ElementRef<'_>) -> bool {
    node.ancestors()
        .take_while(|ancestor| ancestor.id() != root.id())
        .filter_map(ElementRef::wrap)
        .any(looks_like_boilerplate)
}

/// True when `block` sits inside another block element below `root`, so
/// nested `<p>` in `<li>` or `<blockquote>` is not emitted twice.
fn has_block_ancestor_within(block: ElementRef<'_>, root: ElementRef<'_>) -> bool {
    block
        .ancestors()
        .take_while(|node| node.id() != root.id())
        .filter_map(ElementRef::wrap)
        .any(|el| BLOCKS.matches(&el))
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORY: &str = "The city council approved the new transit budget on Tuesday after months of debate.";

    #[test]
    fn test_picks_story_over_navigation_and_footer() {
        let html = format!(
            r#"<html><body>
              <div class="top-nav"><p>Home About Contact Sections Search Login Register Now</p></div>
              <div id="wrapper">
                <div class="story">
                  <h1>Transit budget passes</h1>
                  <p>{STORY}</p>
                  <p>{STORY} Opponents said fares would rise.</p>
                </div>
                <div class="sidebar"><p>Most read stories of the week and other popular links.</p></div>
              </div>
              <div class="footer"><p>Copyright 2024 Example News Corporation, all rights reserved.</p></div>
            </body></html>"#
        );
        let doc = Html::parse_document(&html);
        let text = main_text(&doc).expect("content found");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Transit budget passes");
        assert_eq!(lines.len(), 3);
        assert!(!text.contains("Copyright"));
        assert!(!text.contains("Most read"));
    }

    #[test]
    fn test_link_farm_rejected() {
        let html = r#"<html><body><div>
            <p><a href="/a">A very long link text that dominates the whole block</a></p>
            <p><a href="/b">Another very long link text that dominates too</a></p>
        </div></body></html>"#;
        let doc = Html::parse_document(html);
        assert!(main_text(&doc).is_none());
    }

    #[test]
    fn test_empty_document() {
        let doc = Html::parse_document("<html><body></body></html>");
        assert!(main_text(&doc).is_none());
    }
}
