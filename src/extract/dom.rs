//! Small DOM helpers shared by the field extractors

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// All elements matching `css`, in document order
///
/// An unparseable selector matches nothing.
pub fn select<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Descendants of `element` matching `css`, in document order
pub fn select_within<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => element.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Collapses whitespace runs (NBSP included) to single spaces and trims
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text content of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_text(&element.text().collect::<String>())
}

/// The text node immediately after `element`, if that sibling is text
pub fn following_text(element: ElementRef<'_>) -> Option<String> {
    match element.next_sibling()?.value() {
        Node::Text(text) => Some(text.text.to_string()),
        _ => None,
    }
}

/// First following sibling element named `name`
pub fn next_sibling_element<'a>(element: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == name)
}

/// First element named `name` after `anchor` in document order
///
/// The anchor's own descendants count as following it.
pub fn find_next<'a>(document: &'a Html, anchor: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    let anchor_node = *anchor;

    document
        .root_element()
        .descendants()
        .skip_while(|node| *node != anchor_node)
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == name)
}

/// True if `text` contains any of `needles` (case-insensitive)
pub fn contains_any(text: &str, needles: &[&str]) -> bool {
    let lower = text.to_lowercase();
    needles.iter().any(|needle| lower.contains(needle))
}
