use crate::{UrlError, UrlResult};
use url::Url;

/// Resolves a link href into a canonical absolute URL
///
/// # Canonicalization Steps
///
/// 1. Trim whitespace; reject empty hrefs
/// 2. Reject `javascript:`, `mailto:`, `tel:` and `data:` links
/// 3. Reject fragment-only links (same-page anchors)
/// 4. Resolve relative to `base_url`
/// 5. Keep only HTTP(S) results
/// 6. Remove the fragment
///
/// # Arguments
///
/// * `href` - Raw href attribute value
/// * `base_url` - URL of the page the link was found on
///
/// # Returns
///
/// The canonical URL, or `None` if the link should be ignored
///
/// # Examples
///
/// ```
/// use bookwise_harvest::url::canonicalize;
/// use url::Url;
///
/// let base = Url::parse("https://bibliometro.cl/catalogo/").unwrap();
/// let url = canonicalize("/libros/rayuela/#comentarios", &base).unwrap();
/// assert_eq!(url.as_str(), "https://bibliometro.cl/libros/rayuela/");
/// ```
pub fn canonicalize(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    absolute.set_fragment(None);
    Some(absolute)
}

/// Canonicalizes an already-absolute URL (e.g. a sitemap `<loc>`)
///
/// # Returns
///
/// * `Ok(Url)` - HTTP(S) URL without fragment
/// * `Err(UrlError)` - Unparseable, relative, or non-HTTP(S) input
pub fn canonicalize_absolute(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(url_str.to_string()));
    }

    url.set_fragment(None);
    Ok(url)
}
