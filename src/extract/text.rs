//! Text cleaning applied to every string the pipeline extracts.

use scraper::{ElementRef, Node};

/// Collapse runs of whitespace to one space, trim, and decode HTML entities.
pub fn clean(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    html_escape::decode_html_entities(&collapsed).into_owned()
}

/// Cleaned text content of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    clean(&element.text().collect::<Vec<_>>().join(" "))
}

/// Visible text under `root`, skipping `script`, `style` and `noscript`.
pub fn visible_text(root: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_visible(root, &mut parts);
    clean(&parts.join(" "))
}

fn collect_visible<'a>(element: ElementRef<'a>, parts: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => parts.push(&**text),
            Node::Element(el) if matches!(el.name(), "script" | "style" | "noscript") => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_visible(child, parts);
                }
            }
            _ => {}
        }
    }
}

/// Length in characters, which is what every threshold is measured in.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
