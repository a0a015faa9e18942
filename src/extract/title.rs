//! Title extraction chain

use crate::extract::dom::{contains_any, element_text, select};
use crate::extract::{PageContext, Strategy};

/// Headings that are layout furniture, never a book title
const NON_TITLE_PHRASES: &[&str] = &[
    "resumen de libro",
    "deja una respuesta",
    "navegación de entradas",
    "buscar",
];

/// Title strategies, most specific first
pub const TITLE_CHAIN: &[Strategy<String>] = &[
    marked_title,
    first_top_heading,
    heading_candidates,
    page_title_without_suffix,
];

/// `<h1 class="entry-title">`
pub fn marked_title(ctx: &PageContext<'_>) -> Option<String> {
    select(ctx.document, "h1.entry-title")
        .into_iter()
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// First non-empty `<h1>`
pub fn first_top_heading(ctx: &PageContext<'_>) -> Option<String> {
    select(ctx.document, "h1")
        .into_iter()
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// First `<h1>`/`<h3>` not matching a known non-title phrase
///
/// A top-level heading wins over a sub-level one found earlier.
pub fn heading_candidates(ctx: &PageContext<'_>) -> Option<String> {
    let mut fallback = None;

    for heading in select(ctx.document, "h1, h3") {
        let text = element_text(heading);
        if text.is_empty() || contains_any(&text, NON_TITLE_PHRASES) {
            continue;
        }

        if heading.value().name() == "h1" {
            return Some(text);
        }
        if fallback.is_none() {
            fallback = Some(text);
        }
    }

    fallback
}

/// `<title>` with the site-name suffix removed; only used when the suffix is present
pub fn page_title_without_suffix(ctx: &PageContext<'_>) -> Option<String> {
    let raw = select(ctx.document, "title").into_iter().next().map(element_text)?;

    if !raw.contains(ctx.profile.title_suffix) {
        return None;
    }

    let stripped = raw.replace(ctx.profile.title_suffix, "");
    let stripped = stripped.trim();
    (!stripped.is_empty()).then(|| stripped.to_string())
}
