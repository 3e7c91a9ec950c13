//! SQLite page cache for scraped HTML

use crate::Result;
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS pages (
                url TEXT PRIMARY KEY,
                html TEXT NOT NULL,
                fetched_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_pages_fetched ON pages(fetched_at);
            "#,
        )?;
        Ok(())
    }

    /// Cached HTML for a URL
    pub fn get_page(&self, url: &str) -> Result<Option<String>> {
        let html = self
            .conn
            .query_row(
                "SELECT html FROM pages WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(html)
    }

    /// Insert or replace the cached HTML for a URL
    pub fn put_page(&self, url: &str, html: &str) -> Result<()> {
        let now = Utc::now().naive_utc().format(TIMESTAMP_FORMAT).to_string();
        self.conn.execute(
            r#"
            INSERT INTO pages (url, html, fetched_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(url) DO UPDATE SET
                html = excluded.html,
                fetched_at = excluded.fetched_at
            "#,
            params![url, html, now],
        )?;
        Ok(())
    }

    /// Drop every cached page, returning how many were removed
    pub fn clear_pages(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM pages", [])?;
        Ok(removed)
    }

    /// Get cache statistics
    pub fn get_stats(&self) -> Result<CacheStats> {
        let page_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;

        let total_bytes: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(LENGTH(html)), 0) FROM pages",
            [],
            |row| row.get(0),
        )?;

        let oldest: Option<String> = self
            .conn
            .query_row("SELECT MIN(fetched_at) FROM pages", [], |row| row.get(0))
            .optional()?
            .flatten();

        let newest: Option<String> = self
            .conn
            .query_row("SELECT MAX(fetched_at) FROM pages", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(CacheStats {
            page_count: page_count as usize,
            total_bytes: total_bytes as usize,
            oldest_fetch: oldest
                .and_then(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).ok()),
            newest_fetch: newest
                .and_then(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).ok()),
        })
    }
}

/// Page cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub page_count: usize,
    pub total_bytes: usize,
    pub oldest_fetch: Option<NaiveDateTime>,
    pub newest_fetch: Option<NaiveDateTime>,
}
