//! Database schema for the SQLite sink

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per book id; re-harvests upsert into the same row
CREATE TABLE IF NOT EXISTS books (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL CHECK (length(title) > 0),
    author TEXT NOT NULL,
    pages INTEGER,
    difficulty INTEGER NOT NULL,
    category TEXT,
    description TEXT,
    summary TEXT,
    source TEXT NOT NULL,
    url TEXT NOT NULL,
    tags TEXT NOT NULL,
    image_url TEXT,
    locations TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_books_source ON books(source);
"#;

/// Inserts a book, or refreshes the mutable columns of an existing one
///
/// Only title, url, image_url, locations and updated_at change on conflict;
/// id, source and created_at keep their first-written values.
pub const UPSERT_BOOK_SQL: &str = r#"
INSERT INTO books (
    id, title, author, pages, difficulty, category, description, summary,
    source, url, tags, image_url, locations, created_at, updated_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
ON CONFLICT(id) DO UPDATE SET
    title = excluded.title,
    url = excluded.url,
    image_url = excluded.image_url,
    locations = excluded.locations,
    updated_at = excluded.updated_at
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
