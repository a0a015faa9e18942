//! Page-count extraction

use crate::extract::dom::{contains_any, element_text, following_text, select};
use crate::extract::{PageContext, Strategy};

const PAGES_LABELS: &[&str] = &["páginas", "paginas"];

pub const PAGES_CHAIN: &[Strategy<u32>] = &[labelled_pages];

/// `<strong>Páginas:</strong> 353 páginas ;18 cm.-`
pub fn labelled_pages(ctx: &PageContext<'_>) -> Option<u32> {
    select(ctx.document, "strong, b, em")
        .into_iter()
        .filter(|label| contains_any(&element_text(*label), PAGES_LABELS))
        .find_map(|label| first_number(&following_text(label)?))
}

/// First run of ASCII digits in `text`
fn first_number(text: &str) -> Option<u32> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|run| !run.is_empty())?
        .parse()
        .ok()
}
