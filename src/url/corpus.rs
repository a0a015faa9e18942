//! URL corpus persistence
//!
//! The corpus is the checkpoint between discovery and extraction: a UTF-8,
//! newline-delimited, lexicographically sorted list of absolute URLs.

use crate::HarvestError;
use std::collections::BTreeSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the corpus, one URL per line in sorted order
///
/// Existing content at `path` is replaced.
pub fn write_corpus(path: &Path, urls: &BTreeSet<String>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(fs::File::create(path)?);
    for url in urls {
        writeln!(writer, "{}", url)?;
    }
    writer.flush()
}

/// Reads the corpus, skipping blank lines
///
/// # Returns
///
/// * `Ok(Vec<String>)` - URLs in file order
/// * `Err(HarvestError::MissingCorpus)` - The file does not exist
/// * `Err(HarvestError::Io)` - The file exists but cannot be read
pub fn read_corpus(path: &Path) -> Result<Vec<String>, HarvestError> {
    if !path.exists() {
        return Err(HarvestError::MissingCorpus {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
