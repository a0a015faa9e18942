//! Description (book summary) extraction chain

use crate::extract::dom::{contains_any, element_text, next_sibling_element, select};
use crate::extract::{PageContext, Strategy};

const SUMMARY_MARKERS: &[&str] = &["resumen de libro", "resumen"];

pub const DESCRIPTION_CHAIN: &[Strategy<String>] = &[marked_summary, summary_heading];

/// `<h3 class="tit-h3">Resumen de libro</h3>` followed by a paragraph
pub fn marked_summary(ctx: &PageContext<'_>) -> Option<String> {
    paragraph_after_heading(ctx, "h3.tit-h3", &SUMMARY_MARKERS[..1])
}

/// Any `<h2>`-`<h4>` mentioning a summary, followed by a paragraph
pub fn summary_heading(ctx: &PageContext<'_>) -> Option<String> {
    paragraph_after_heading(ctx, "h2, h3, h4", SUMMARY_MARKERS)
}

fn paragraph_after_heading(ctx: &PageContext<'_>, css: &str, markers: &[&str]) -> Option<String> {
    select(ctx.document, css)
        .into_iter()
        .filter(|heading| contains_any(&element_text(*heading), markers))
        .filter_map(|heading| next_sibling_element(heading, "p"))
        .map(element_text)
        .find(|text| !text.is_empty())
}
