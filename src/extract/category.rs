//! Category (subject) extraction chain

use crate::extract::dom::{element_text, select, select_within};
use crate::extract::{PageContext, Strategy};

const SUBJECT_MARKER: &str = "Tema - Materia";

pub const CATEGORY_CHAIN: &[Strategy<String>] = &[labelled_subject, subject_list_item];

/// `<li><strong>Tema - Materia:</strong> Novela chilena</li>`
pub fn labelled_subject(ctx: &PageContext<'_>) -> Option<String> {
    select(ctx.document, "strong, b, label")
        .into_iter()
        .filter(|label| element_text(*label).contains(SUBJECT_MARKER))
        .filter_map(|label| label.parent().and_then(scraper::ElementRef::wrap))
        .find_map(|container| strip_marker(&element_text(container)))
}

/// Innermost `<li>` whose text carries the subject marker
pub fn subject_list_item(ctx: &PageContext<'_>) -> Option<String> {
    select(ctx.document, "li")
        .into_iter()
        .filter(|item| element_text(*item).contains(SUBJECT_MARKER))
        .filter(|item| {
            !select_within(*item, "li")
                .into_iter()
                .any(|nested| element_text(nested).contains(SUBJECT_MARKER))
        })
        .find_map(|item| strip_marker(&element_text(item)))
}

/// Text after the marker (and its colon), if any remains
fn strip_marker(text: &str) -> Option<String> {
    let (_, rest) = text.split_once(SUBJECT_MARKER)?;
    let rest = rest.trim_start_matches(':').trim();
    (!rest.is_empty()).then(|| rest.to_string())
}
