//! URL handling module for Bookwise-Harvest
//!
//! This module provides link canonicalization (resolve to absolute, strip the
//! fragment) and persistence of the discovered URL corpus.

mod corpus;
mod normalize;

// Re-export main functions
pub use corpus::{read_corpus, write_corpus};
pub use normalize::{canonicalize, canonicalize_absolute};
