//! Field extraction for detail pages
//!
//! Every field is extracted by an ordered chain of strategies. A strategy is a
//! plain function from a parsed page to an optional value; the chain yields the
//! first value any strategy produces. A miss is never an error: the record
//! falls back to the field's default.

mod author;
mod availability;
mod category;
mod description;
mod dom;
mod image;
mod pages;
mod title;

pub use author::AUTHOR_CHAIN;
pub use availability::{extract_locations, parse_location_item};
pub use category::CATEGORY_CHAIN;
pub use description::DESCRIPTION_CHAIN;
pub use dom::normalize_text;
pub use image::IMAGE_CHAIN;
pub use pages::PAGES_CHAIN;
pub use title::TITLE_CHAIN;

use crate::record::{BookRecord, Location, SiteProfile};
use scraper::Html;
use url::Url;

/// A parsed detail page plus what is known about where it came from
pub struct PageContext<'a> {
    pub document: &'a Html,
    pub url: &'a Url,
    pub profile: &'a SiteProfile,
}

/// One extraction heuristic for a field
pub type Strategy<T> = fn(&PageContext<'_>) -> Option<T>;

/// Runs `chain` in order and returns the first value produced
pub fn first_success<T>(ctx: &PageContext<'_>, chain: &[Strategy<T>]) -> Option<T> {
    chain.iter().find_map(|strategy| strategy(ctx))
}

/// Raw field values before defaults are applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub title: Option<String>,
    pub author: Option<String>,
    pub pages: Option<u32>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub locations: Vec<Location>,
}

/// Runs every field chain and the availability parser against a page
pub fn extract_fields(ctx: &PageContext<'_>) -> ExtractedFields {
    let fields = ExtractedFields {
        title: first_success(ctx, TITLE_CHAIN),
        author: first_success(ctx, AUTHOR_CHAIN),
        pages: first_success(ctx, PAGES_CHAIN),
        category: first_success(ctx, CATEGORY_CHAIN),
        description: first_success(ctx, DESCRIPTION_CHAIN),
        image_url: first_success(ctx, IMAGE_CHAIN),
        locations: extract_locations(ctx),
    };

    tracing::debug!(
        "Fields for {}: title={} author={} pages={} category={} description={} image={} locations={}",
        ctx.url,
        fields.title.is_some(),
        fields.author.is_some(),
        fields.pages.is_some(),
        fields.category.is_some(),
        fields.description.is_some(),
        fields.image_url.is_some(),
        fields.locations.len()
    );

    fields
}

/// Assembles a record from extracted fields, applying the site's defaults
///
/// # Returns
///
/// * `Some(BookRecord)` - The page yielded a title
/// * `None` - No title strategy succeeded; the page is not a usable record
pub fn build_record(ctx: &PageContext<'_>, fields: ExtractedFields) -> Option<BookRecord> {
    let title = fields.title?;

    let mut record = BookRecord::new(
        ctx.profile.source,
        &title,
        ctx.url.as_str(),
        ctx.profile.default_author,
    );

    if let Some(author) = fields.author {
        record.set_author(&author);
    }
    record.pages = fields.pages;
    record.category = fields.category;
    record.set_description(fields.description);
    record.image_url = fields.image_url;
    record.tags = ctx.profile.tags_for(ctx.url);
    record.merge_locations(&fields.locations);

    Some(record)
}

/// Parses `html` and extracts a record for the page at `url`
///
/// Parsing and extraction happen together because the parsed document is not
/// `Send` and must not be held across an await point.
pub fn extract_record(html: &str, url: &Url, profile: &SiteProfile) -> Option<BookRecord> {
    let document = Html::parse_document(html);
    let ctx = PageContext {
        document: &document,
        url,
        profile,
    };

    let fields = extract_fields(&ctx);
    build_record(&ctx, fields)
}
