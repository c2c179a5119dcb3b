//! Outlink discovery for breadth-first expansion.

use crate::extract::page::Page;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::Selector;
use url::Url;

static ANCHORS: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Distinct absolute links on `page` that stay on the page's own host.
///
/// Relative hrefs are resolved against the page URL and fragments are
/// stripped, so `/a#top` and `/a#comments` collapse into one link. Only
/// `http` and `https` targets are kept.
///
/// # Arguments
///
/// * `page` - Parsed page; its URL is the base for relative hrefs and
///   supplies the host to match
///
/// # Returns
///
/// Links in document order, first occurrence wins. Empty when the page URL
/// has no host.
///
/// # Examples
///
/// ```ignore
/// let page = Page::parse("https://news.example/a/", r#"<a href="b.htm#c">b</a>"#);
/// assert_eq!(same_host_links(&page), vec!["https://news.example/a/b.htm"]);
/// ```
pub fn same_host_links(page: &Page) -> Vec<String> {
    let Ok(base) = Url::parse(page.url()) else {
        return Vec::new();
    };
    let Some(host) = base.host_str() else {
        return Vec::new();
    };

    page.select(&ANCHORS)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .filter_map(|href| base.join(href).ok())
        .filter(|link| matches!(link.scheme(), "http" | "https"))
        .filter(|link| link.host_str() == Some(host))
        .map(|mut link| {
            link.set_fragment(None);
            link.to_string()
        })
        .unique()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_filters_and_dedupes() {
        let html = r##"<html><body>
            <a href="/thoi-su/a.htm">A</a>
            <a href="/thoi-su/a.htm#comments">A again</a>
            <a href="https://news.example/b.htm">B</a>
            <a href="c.htm">C</a>
            <a href="https://other.example/x">elsewhere</a>
            <a href="mailto:desk@news.example">mail</a>
            <a href="javascript:void(0)">js</a>
            <a href="#top">top</a>
            <a href="  ">blank</a>
        </body></html>"##;
        let page = Page::parse("https://news.example/section/index.htm", html);
        assert_eq!(
            same_host_links(&page),
            vec![
                "https://news.example/thoi-su/a.htm",
                "https://news.example/b.htm",
                "https://news.example/section/c.htm",
                "https://news.example/section/index.htm",
            ]
        );
    }

    #[test]
    fn test_unparseable_page_url_yields_nothing() {
        let page = Page::parse("not a url", r#"<a href="/x">x</a>"#);
        assert!(same_host_links(&page).is_empty());
    }
}
