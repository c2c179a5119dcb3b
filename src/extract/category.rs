//! Category resolution: breadcrumb, then section meta, then the URL path.

use super::page::Page;
use super::text::{clean, element_text};
use once_cell::sync::Lazy;
use scraper::Selector;
use url::Url;

static BREADCRUMB: Lazy<Selector> =
    Lazy::new(|| Selector::parse("nav.breadcrumb li a, ul.breadcrumb li a").unwrap());
static META_SECTION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[name="category"], meta[property="article:section"]"#).unwrap()
});

pub type CategoryStrategy = fn(&Page) -> Option<String>;

pub const CATEGORY_STRATEGIES: &[CategoryStrategy] = &[from_breadcrumb, from_meta, from_url_path];

/// Resolved category, or an empty string when nothing matches.
pub fn resolve_category(page: &Page) -> String {
    CATEGORY_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(page))
        .unwrap_or_default()
}

fn from_breadcrumb(page: &Page) -> Option<String> {
    let last = page.select(&BREADCRUMB).last()?;
    let text = element_text(last);
    (!text.is_empty()).then_some(text)
}

fn from_meta(page: &Page) -> Option<String> {
    let section = clean(page.meta_content(&META_SECTION)?);
    (!section.is_empty()).then_some(section)
}

fn from_url_path(page: &Page) -> Option<String> {
    let url = Url::parse(page.url()).ok()?;
    let segment = url.path_segments()?.find(|s| !s.is_empty())?;
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    let category = clean(&decoded);
    (!category.is_empty()).then_some(category)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category_of(url: &str, html: &str) -> String {
        resolve_category(&Page::parse(url, html))
    }

    #[test]
    fn test_breadcrumb_last_item() {
        let html = r#"<nav class="breadcrumb"><ul><li><a href="/">Home</a></li><li><a href="/kinh-doanh">Kinh doanh</a></li></ul></nav>
            <meta name="category" content="Ignored">"#;
        assert_eq!(category_of("https://a.test/x/y", html), "Kinh doanh");
    }

    #[test]
    fn test_meta_section() {
        let html = r#"<html><head><meta property="article:section" content="Thể thao"></head></html>"#;
        assert_eq!(category_of("https://a.test/x/y", html), "Thể thao");
    }

    #[test]
    fn test_url_path_segment() {
        assert_eq!(category_of("https://a.test//the-gioi/story-1.htm", ""), "the-gioi");
        assert_eq!(category_of("https://a.test/s%E1%BB%A9c-kh%E1%BB%8Fe/a.htm", ""), "sức-khỏe");
        assert_eq!(category_of("https://a.test/", ""), "");
    }
}
