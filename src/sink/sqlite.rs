//! SQLite sink implementation
//!
//! Each record is upserted in its own transaction, so one bad record rolls
//! back alone and the rest of the batch is still stored.

use crate::record::{BookRecord, Location, Source};
use crate::sink::schema::{initialize_schema, UPSERT_BOOK_SQL};
use crate::sink::{BookSink, DeliveryReport, SinkError, SinkResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;

/// SQLite sink backend
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens (or creates) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened/created database
    /// * `Err(SinkError)` - Failed to open database or create the schema
    pub fn new(path: &Path) -> SinkResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Upserts one record inside its own transaction
    ///
    /// On failure the transaction is rolled back and the error returned.
    pub fn upsert_record(&mut self, record: &BookRecord) -> SinkResult<()> {
        let tags = serde_json::to_string(&record.tags)?;
        let locations = serde_json::to_string(&record.locations)?;
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        let result = tx.execute(
            UPSERT_BOOK_SQL,
            params![
                record.id,
                record.title,
                record.author,
                record.pages,
                record.difficulty,
                record.category,
                record.description,
                record.summary,
                record.source.as_str(),
                record.url,
                tags,
                record.image_url,
                locations,
                now,
            ],
        );

        match result {
            Ok(_) => {
                tx.commit()?;
                Ok(())
            }
            Err(e) => {
                tx.rollback()?;
                Err(e.into())
            }
        }
    }

    /// Loads a stored record by id
    pub fn get_book(&self, id: &str) -> SinkResult<Option<BookRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, title, author, pages, difficulty, category, description, summary,
                 source, url, tags, image_url, locations
                 FROM books WHERE id = ?1",
                params![id],
                |row| {
                    Ok(StoredRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        author: row.get(2)?,
                        pages: row.get(3)?,
                        difficulty: row.get(4)?,
                        category: row.get(5)?,
                        description: row.get(6)?,
                        summary: row.get(7)?,
                        source: row.get(8)?,
                        url: row.get(9)?,
                        tags: row.get(10)?,
                        image_url: row.get(11)?,
                        locations: row.get(12)?,
                    })
                },
            )
            .optional()?;

        row.map(StoredRow::into_record).transpose()
    }

    /// Number of stored books
    pub fn count_books(&self) -> SinkResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Raw column values of one `books` row
struct StoredRow {
    id: String,
    title: String,
    author: String,
    pages: Option<u32>,
    difficulty: u8,
    category: Option<String>,
    description: Option<String>,
    summary: Option<String>,
    source: String,
    url: String,
    tags: String,
    image_url: Option<String>,
    locations: String,
}

impl StoredRow {
    fn into_record(self) -> SinkResult<BookRecord> {
        let source = Source::from_db_string(&self.source)
            .ok_or_else(|| SinkError::InvalidRow(format!("unknown source {:?}", self.source)))?;
        let tags: BTreeSet<String> = serde_json::from_str(&self.tags)?;
        let locations: Vec<Location> = serde_json::from_str(&self.locations)?;

        Ok(BookRecord {
            id: self.id,
            title: self.title,
            author: self.author,
            pages: self.pages,
            difficulty: self.difficulty,
            category: self.category,
            description: self.description,
            summary: self.summary,
            source,
            url: self.url,
            tags,
            image_url: self.image_url,
            locations,
        })
    }
}

#[async_trait]
impl BookSink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn deliver(&mut self, records: &[BookRecord]) -> SinkResult<DeliveryReport> {
        let mut report = DeliveryReport::default();

        for record in records {
            match self.upsert_record(record) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::error!("Failed to store {} ({}): {}", record.id, record.url, e);
                    report.failed += 1;
                }
            }
        }

        report.message = Some(format!("{} records upserted", report.delivered));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, branch: &str) -> BookRecord {
        let mut record = BookRecord::new(
            Source::Bibliometro,
            title,
            "https://bibliometro.cl/libros/x/",
            "Desconocido",
        );
        record.pages = Some(120);
        record.tags.insert("bibliometro".to_string());
        record.locations.push(Location {
            branch: branch.to_string(),
            stock: 1,
        });
        record
    }

    #[test]
    fn test_create_in_memory() {
        let sink = SqliteSink::new_in_memory();
        assert!(sink.is_ok());
    }

    #[test]
    fn test_insert_and_read_back() {
        let mut sink = SqliteSink::new_in_memory().unwrap();
        let original = record("Rayuela", "Baquedano");

        sink.upsert_record(&original).unwrap();

        let stored = sink.get_book(&original.id).unwrap().unwrap();
        assert_eq!(stored, original);
        assert_eq!(sink.count_books().unwrap(), 1);
    }

    #[test]
    fn test_upsert_overwrites_only_mutable_fields() {
        let mut sink = SqliteSink::new_in_memory().unwrap();
        let first = record("Rayuela", "Baquedano");
        sink.upsert_record(&first).unwrap();

        let mut second = record("Rayuela", "Tobalaba");
        second.url = "https://bibliometro.cl/libros/rayuela/".to_string();
        second.image_url = Some("https://bibliometro.cl/rayuela.jpg".to_string());
        second.author = "Julio Cortázar".to_string();
        second.pages = Some(999);
        sink.upsert_record(&second).unwrap();

        let stored = sink.get_book(&first.id).unwrap().unwrap();
        assert_eq!(sink.count_books().unwrap(), 1);
        assert_eq!(stored.url, second.url);
        assert_eq!(stored.image_url, second.image_url);
        assert_eq!(stored.locations, second.locations);
        // Not refreshed on conflict
        assert_eq!(stored.author, "Desconocido");
        assert_eq!(stored.pages, Some(120));
    }

    #[test]
    fn test_missing_book() {
        let sink = SqliteSink::new_in_memory().unwrap();
        assert!(sink.get_book("bib_000000000000").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_record_rolls_back_alone() {
        let mut sink = SqliteSink::new_in_memory().unwrap();
        let good = record("Rayuela", "Baquedano");
        let mut bad = record("Sin título", "Baquedano");
        bad.title = String::new();
        let also_good = record("El Túnel", "Tobalaba");

        let report = sink.deliver(&[good.clone(), bad.clone(), also_good.clone()]).await.unwrap();

        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 1);
        assert!(sink.get_book(&bad.id).unwrap().is_none());
        assert!(sink.get_book(&good.id).unwrap().is_some());
        assert!(sink.get_book(&also_good.id).unwrap().is_some());
    }
}
