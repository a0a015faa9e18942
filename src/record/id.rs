//! Deterministic record identity
//!
//! A record's id depends only on its source and title, so re-scraping the same
//! book (from any URL) yields the same id and the sink can upsert by it.

use crate::record::Source;
use md5::{Digest, Md5};

/// Number of hex characters kept from the digest
pub const ID_HASH_LEN: usize = 12;

/// Derives the record id for a `(source, title)` pair
///
/// The key `"<source>-<title>"` is lowercased and spaces become hyphens before
/// hashing; the first [`ID_HASH_LEN`] hex characters of the MD5 digest are
/// tagged with the source prefix (`bib_`, `bnc_`).
///
/// # Examples
///
/// ```
/// use bookwise_harvest::{book_id, Source};
///
/// let id = book_id(Source::Bibliometro, "1984");
/// assert!(id.starts_with("bib_"));
/// assert_eq!(id, book_id(Source::Bibliometro, "1984"));
/// ```
pub fn book_id(source: Source, title: &str) -> String {
    let key = format!("{}-{}", source.id_key(), title)
        .to_lowercase()
        .replace(' ', "-");

    let digest = hex::encode(Md5::digest(key.as_bytes()));
    format!("{}{}", source.id_prefix(), &digest[..ID_HASH_LEN])
}
