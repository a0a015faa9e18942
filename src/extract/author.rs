//! Author extraction chain

use crate::extract::dom::{contains_any, element_text, following_text, normalize_text, select};
use crate::extract::{PageContext, Strategy};

/// Sub-headings that label page sections rather than name an author
const NON_AUTHOR_HEADINGS: &[&str] = &["ubicación", "ubicacion", "comentarios"];

const AUTHOR_LABELS: &[&str] = &["autor"];

pub const AUTHOR_CHAIN: &[Strategy<String>] = &[author_subheading, labelled_author];

/// First `<h4>` that is not a section label
pub fn author_subheading(ctx: &PageContext<'_>) -> Option<String> {
    select(ctx.document, "h4")
        .into_iter()
        .map(element_text)
        .find(|text| !text.is_empty() && !contains_any(text, NON_AUTHOR_HEADINGS))
}

/// `<strong>Autor: Name</strong>` or `<strong>Autor</strong> Name`
pub fn labelled_author(ctx: &PageContext<'_>) -> Option<String> {
    select(ctx.document, "strong, b, span")
        .into_iter()
        .filter(|label| contains_any(&element_text(*label), AUTHOR_LABELS))
        .find_map(|label| {
            let raw = label.text().collect::<String>();
            let candidate = match raw.split_once(':') {
                Some((_, after)) => normalize_text(after),
                None => normalize_text(&following_text(label)?),
            };
            (!candidate.is_empty()).then_some(candidate)
        })
}
