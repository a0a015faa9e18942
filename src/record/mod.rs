//! Canonical book record
//!
//! This module defines the unit of output of the harvester, together with the
//! site profiles that drive discovery and extraction for each source.

mod id;
mod site;

pub use id::{book_id, ID_HASH_LEN};
pub use site::{ListingScheme, SiteProfile};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Maximum length of title and author, in characters
pub const MAX_TEXT_LEN: usize = 255;

/// Difficulty assigned to every harvested record
pub const DEFAULT_DIFFICULTY: u8 = 3;

/// Library site a record was harvested from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Bibliometro,
    BibliotecaNacional,
}

impl Source {
    /// Value stored in the record's `source` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bibliometro => "bibliometro",
            Self::BibliotecaNacional => "biblioteca_nacional",
        }
    }

    /// Short key hashed into the record id
    pub fn id_key(&self) -> &'static str {
        match self {
            Self::Bibliometro => "bibliometro",
            Self::BibliotecaNacional => "bnc",
        }
    }

    /// Literal prefix of every record id from this source
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Bibliometro => "bib_",
            Self::BibliotecaNacional => "bnc_",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "bibliometro" => Some(Self::Bibliometro),
            "biblioteca_nacional" => Some(Self::BibliotecaNacional),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock of a title at one branch; `stock` is always positive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub branch: String,
    pub stock: u64,
}

/// One harvested book, as delivered to the ingestion sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub pages: Option<u32>,
    pub difficulty: u8,
    pub category: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub source: Source,
    pub url: String,
    pub tags: BTreeSet<String>,
    pub image_url: Option<String>,
    pub locations: Vec<Location>,
}

impl BookRecord {
    /// Creates a record with its id derived from `(source, title)`
    ///
    /// The id is computed from the full title; the stored title is truncated
    /// to [`MAX_TEXT_LEN`] characters. All optional fields start absent and the
    /// author starts at `default_author`.
    pub fn new(source: Source, title: &str, url: &str, default_author: &str) -> Self {
        Self {
            id: book_id(source, title),
            title: truncate_chars(title, MAX_TEXT_LEN),
            author: truncate_chars(default_author, MAX_TEXT_LEN),
            pages: None,
            difficulty: DEFAULT_DIFFICULTY,
            category: None,
            description: None,
            summary: None,
            source,
            url: url.to_string(),
            tags: BTreeSet::new(),
            image_url: None,
            locations: Vec::new(),
        }
    }

    pub fn set_author(&mut self, author: &str) {
        self.author = truncate_chars(author, MAX_TEXT_LEN);
    }

    /// Sets the description and its `summary` mirror
    pub fn set_description(&mut self, description: Option<String>) {
        self.summary = description.clone();
        self.description = description;
    }

    /// Appends locations whose branch is not yet present
    ///
    /// The first occurrence of a branch wins; later entries for the same branch
    /// are discarded, never overwritten. Non-positive stock is never recorded.
    pub fn merge_locations(&mut self, incoming: &[Location]) {
        let mut seen: HashSet<String> = self.locations.iter().map(|l| l.branch.clone()).collect();

        for location in incoming {
            if location.stock == 0 {
                continue;
            }
            if seen.insert(location.branch.clone()) {
                self.locations.push(location.clone());
            }
        }
    }
}

/// Truncates to at most `max` characters without splitting a character
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
