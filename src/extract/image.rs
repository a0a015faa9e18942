//! Cover image extraction chain

use crate::extract::dom::select;
use crate::extract::{PageContext, Strategy};
use crate::url::canonicalize;

pub const IMAGE_CHAIN: &[Strategy<String>] = &[cover_container_image, thumbnail_image];

/// `<div class="book-cover"><img src=...></div>`
pub fn cover_container_image(ctx: &PageContext<'_>) -> Option<String> {
    image_source(ctx, "div.book-cover img[src]")
}

/// `<img class="attachment-post-thumbnail" src=...>`
pub fn thumbnail_image(ctx: &PageContext<'_>) -> Option<String> {
    image_source(ctx, "img.attachment-post-thumbnail[src]")
}

fn image_source(ctx: &PageContext<'_>, css: &str) -> Option<String> {
    select(ctx.document, css)
        .into_iter()
        .filter_map(|img| img.value().attr("src"))
        .find_map(|src| canonicalize(src, ctx.url))
        .map(String::from)
}
