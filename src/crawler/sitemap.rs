//! Sitemap parsing
//!
//! Both `<urlset>` files and `<sitemapindex>` files are accepted; every `<loc>`
//! value is returned and the caller decides which ones are detail pages.

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// Why a sitemap body was rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SitemapError {
    #[error("malformed sitemap: {0}")]
    Malformed(&'static str),

    #[error("XML parse error: {0}")]
    Xml(String),
}

/// Collects the text of every `<loc>` element in a sitemap document
///
/// # Arguments
///
/// * `xml` - The sitemap body
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Trimmed, non-empty `<loc>` values in document order
/// * `Err(SitemapError)` - The body is not a well-formed XML document
pub fn parse_sitemap_locs(xml: &str) -> Result<Vec<String>, SitemapError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut locs = Vec::new();
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut in_loc = false;
    let mut current_loc = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if depth == 0 && saw_root {
                    return Err(SitemapError::Malformed("multiple root elements"));
                }
                depth += 1;
                saw_root = true;

                if e.local_name().as_ref() == b"loc" {
                    in_loc = true;
                    current_loc.clear();
                }
            }
            Ok(Event::Empty(_)) => {
                if depth == 0 {
                    if saw_root {
                        return Err(SitemapError::Malformed("multiple root elements"));
                    }
                    saw_root = true;
                }
            }
            Ok(Event::End(e)) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(SitemapError::Malformed("unexpected closing tag"))?;

                if e.local_name().as_ref() == b"loc" && in_loc {
                    let loc = current_loc.trim();
                    if !loc.is_empty() {
                        locs.push(loc.to_string());
                    }
                    in_loc = false;
                }
            }
            Ok(Event::Text(e)) => {
                if depth == 0 {
                    return Err(SitemapError::Malformed("text outside the root element"));
                }
                if in_loc {
                    let text = e
                        .unescape()
                        .map_err(|e| SitemapError::Xml(e.to_string()))?;
                    current_loc.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if in_loc {
                    current_loc.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SitemapError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(SitemapError::Malformed("no root element"));
    }
    if depth != 0 {
        return Err(SitemapError::Malformed("unclosed element at end of document"));
    }

    Ok(locs)
}
