//! HTML parser for extracting links from listing pages
//!
//! Discovery only needs the outgoing links of a category page, and of those
//! only the ones that point at detail pages of the site being harvested.

use crate::record::SiteProfile;
use crate::url::canonicalize;
use scraper::{Html, Selector};
use url::Url;

/// Extracts all followable links from an HTML document
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only anchors
///
/// Links are returned canonicalized (absolute, fragment stripped) in document
/// order; duplicates are kept.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The base URL for resolving relative links
///
/// # Example
///
/// ```no_run
/// use bookwise_harvest::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/libros/rayuela/#comentarios">Rayuela</a>"#;
/// let base_url = Url::parse("https://bibliometro.cl/catalogo/").unwrap();
/// let links = extract_links(html, &base_url);
/// assert_eq!(links[0].as_str(), "https://bibliometro.cl/libros/rayuela/");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = canonicalize(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Extracts the links of a page that point at detail pages of `profile`'s site
///
/// # Arguments
///
/// * `html` - The listing page content
/// * `base_url` - The URL the listing page was served from
/// * `profile` - The site whose detail-path markers decide what matches
///
/// # Returns
///
/// Canonical detail URLs as strings, in document order (duplicates kept)
pub fn extract_detail_links(html: &str, base_url: &Url, profile: &SiteProfile) -> Vec<String> {
    extract_links(html, base_url)
        .into_iter()
        .filter(|link| profile.is_detail_url(link))
        .map(String::from)
        .collect()
}
