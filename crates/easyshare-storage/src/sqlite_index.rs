// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SQLite stand-in for the Android Downloads collection.
//
// Used on desktop builds and in tests, so the managed strategy can run
// without a device. Column names follow `MediaStore.Downloads`.
//
// Schema:
//   downloads(
//     _id           INTEGER PRIMARY KEY AUTOINCREMENT,
//     _display_name TEXT    NOT NULL,
//     mime_type     TEXT    NOT NULL,
//     is_pending    INTEGER NOT NULL,   -- 1 while being written
//     date_added    TEXT    NOT NULL,   -- RFC 3339
//     data          BLOB
//   )

use std::io::Write;
use std::path::Path;

use chrono::Utc;
use easyshare_core::error::{EasyshareError, Result};
use rusqlite::{Connection, DatabaseName, OptionalExtension, params};
use tracing::{debug, instrument};

use crate::managed::MediaIndex;

/// URI prefix for rows, matching `MediaStore.Downloads.EXTERNAL_CONTENT_URI`.
pub const DOWNLOADS_URI_PREFIX: &str = "content://media/external/downloads/";

/// Convert a `rusqlite::Error` into an `EasyshareError::Database`.
fn db_err(e: rusqlite::Error) -> EasyshareError {
    EasyshareError::Database(e.to_string())
}

/// One row of the index, without its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRow {
    pub id: i64,
    pub display_name: String,
    pub mime_type: String,
    pub is_pending: bool,
    pub date_added: String,
    pub size: u64,
}

/// Downloads index backed by a SQLite database.
pub struct SqliteMediaIndex {
    conn: Connection,
}

impl SqliteMediaIndex {
    /// Open (or create) the index database at `path`.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(db_err)?;
        Self::init(conn)
    }

    /// Open an in-memory index (tests, dry runs).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS downloads (
                _id           INTEGER PRIMARY KEY AUTOINCREMENT,
                _display_name TEXT    NOT NULL,
                mime_type     TEXT    NOT NULL,
                is_pending    INTEGER NOT NULL,
                date_added    TEXT    NOT NULL,
                data          BLOB
            );",
        )
        .map_err(db_err)?;
        debug!("downloads index ready");
        Ok(Self { conn })
    }

    /// Parse a location string back into a row id.
    pub fn id_from_location(location: &str) -> Option<i64> {
        location.strip_prefix(DOWNLOADS_URI_PREFIX)?.parse().ok()
    }

    /// All rows, oldest first.
    pub fn entries(&self) -> Result<Vec<DownloadRow>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT _id, _display_name, mime_type, is_pending, date_added, \
                        COALESCE(length(data), 0) \
                 FROM downloads ORDER BY _id ASC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], Self::map_row)
            .map_err(db_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(rows)
    }

    pub fn entry(&self, id: i64) -> Result<Option<DownloadRow>> {
        self.conn
            .query_row(
                "SELECT _id, _display_name, mime_type, is_pending, date_added, \
                        COALESCE(length(data), 0) \
                 FROM downloads WHERE _id = ?1",
                params![id],
                Self::map_row,
            )
            .optional()
            .map_err(db_err)
    }

    /// The stored content of a row.
    pub fn read_data(&self, id: i64) -> Result<Option<Vec<u8>>> {
        self.conn
            .query_row(
                "SELECT COALESCE(data, x'') FROM downloads WHERE _id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)
    }

    /// Number of rows still flagged as pending.
    pub fn pending_count(&self) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM downloads WHERE is_pending = 1",
                [],
                |row| row.get(0),
            )
            .map_err(db_err)
    }

    pub fn count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM downloads", [], |row| row.get(0))
            .map_err(db_err)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DownloadRow> {
        let size: i64 = row.get(5)?;
        Ok(DownloadRow {
            id: row.get(0)?,
            display_name: row.get(1)?,
            mime_type: row.get(2)?,
            is_pending: row.get::<_, i32>(3)? != 0,
            date_added: row.get(4)?,
            size: u64::try_from(size).unwrap_or(0),
        })
    }
}

impl MediaIndex for SqliteMediaIndex {
    type Entry = i64;

    fn insert_pending(&self, display_name: &str, mime_type: &str) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO downloads (_display_name, mime_type, is_pending, date_added)
                 VALUES (?1, ?2, 1, ?3)",
                params![display_name, mime_type, Utc::now().to_rfc3339()],
            )
            .map_err(db_err)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Sizes the row's `data` column to `len` and opens it for incremental
    /// writing. Writes past `len` fail with `WriteZero`.
    fn open_sink<'a>(&'a self, entry: &i64, len: u64) -> Result<Option<Box<dyn Write + 'a>>> {
        let len = i64::try_from(len)
            .map_err(|_| EasyshareError::SaveFailed(format!("file too large: {len} bytes")))?;
        let updated = self
            .conn
            .execute(
                "UPDATE downloads SET data = zeroblob(?1) WHERE _id = ?2",
                params![len, entry],
            )
            .map_err(db_err)?;
        if updated == 0 {
            return Ok(None);
        }
        let blob = self
            .conn
            .blob_open(DatabaseName::Main, "downloads", "data", *entry, false)
            .map_err(db_err)?;
        Ok(Some(Box::new(blob)))
    }

    fn publish(&self, entry: &i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE downloads SET is_pending = 0 WHERE _id = ?1",
                params![entry],
            )
            .map_err(db_err)?;
        Ok(())
    }

    fn remove(&self, entry: &i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM downloads WHERE _id = ?1", params![entry])
            .map_err(db_err)?;
        Ok(())
    }

    fn location(&self, entry: &i64) -> String {
        format!("{DOWNLOADS_URI_PREFIX}{entry}")
    }
}
