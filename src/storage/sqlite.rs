//! SQLite storage backend for the library

use super::traits::{
    EntryRemoval, LibraryStore, OpenStore, RecordReplacement, StorageError, StorageResult,
};
use crate::model::{Annotation, AnnotationPatch, Record};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Raw annotation columns, converted outside the rusqlite row closure
type AnnotationRow = (String, Option<String>, Option<String>, Option<String>, bool);

/// SQLite-backed library store
///
/// Uses a single SQLite database file with one table per record kind.
/// Thread-safe via internal mutex on the connection; pair operations run
/// inside a transaction so a record never exists without its annotation.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema; safe to run against an existing DB
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Remote-derived records; the full record is kept as JSON,
            -- sortable columns are duplicated for ad hoc queries
            CREATE TABLE IF NOT EXISTS records (
                identifier TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                updated_at TEXT,
                published_at TEXT,
                record_json TEXT NOT NULL
            );

            -- User-owned annotations
            CREATE TABLE IF NOT EXISTS annotations (
                identifier TEXT PRIMARY KEY,
                note TEXT,
                last_played_version TEXT,
                last_played_at TEXT,
                starred INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_annotations_starred
                ON annotations(starred);

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;

        Ok(())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn format_time(at: Option<DateTime<Utc>>) -> Option<String> {
        at.map(|t| t.to_rfc3339())
    }

    fn parse_time(raw: Option<String>) -> StorageResult<Option<DateTime<Utc>>> {
        raw.map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| StorageError::DateParse(e.to_string()))
        })
        .transpose()
    }

    /// Deserialize an annotation from database columns
    fn row_to_annotation(row: AnnotationRow) -> StorageResult<Annotation> {
        let (identifier, note, last_played_version, last_played_at, starred) = row;
        Ok(Annotation {
            identifier,
            note,
            last_played_version,
            last_played_at: Self::parse_time(last_played_at)?,
            starred,
        })
    }

    fn read_annotation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnnotationRow> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
    }

    fn select_annotation(conn: &Connection, identifier: &str) -> StorageResult<Option<Annotation>> {
        let row = conn
            .query_row(
                "SELECT identifier, note, last_played_version, last_played_at, starred
                 FROM annotations WHERE identifier = ?1",
                params![identifier],
                Self::read_annotation_row,
            )
            .optional()?;
        row.map(Self::row_to_annotation).transpose()
    }

    fn write_annotation(tx: &Transaction<'_>, annotation: &Annotation) -> StorageResult<()> {
        tx.execute(
            r#"
            INSERT INTO annotations (identifier, note, last_played_version, last_played_at, starred)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(identifier) DO UPDATE SET
                note = excluded.note,
                last_played_version = excluded.last_played_version,
                last_played_at = excluded.last_played_at,
                starred = excluded.starred
            "#,
            params![
                annotation.identifier,
                annotation.note,
                annotation.last_played_version,
                Self::format_time(annotation.last_played_at),
                annotation.starred,
            ],
        )?;
        Ok(())
    }

    fn record_exists(conn: &Connection, identifier: &str) -> StorageResult<bool> {
        Ok(conn
            .query_row(
                "SELECT 1 FROM records WHERE identifier = ?1",
                params![identifier],
                |_| Ok(()),
            )
            .optional()?
            .is_some())
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl LibraryStore for SqliteStore {
    // === Record Operations ===

    fn load_record(&self, identifier: &str) -> StorageResult<Option<Record>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT record_json FROM records WHERE identifier = ?1",
                params![identifier],
                |row| row.get(0),
            )
            .optional()?;
        Ok(json.map(|j| serde_json::from_str(&j)).transpose()?)
    }

    fn load_records(&self) -> StorageResult<Vec<Record>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT record_json FROM records ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for json in rows {
            records.push(serde_json::from_str(&json?)?);
        }
        Ok(records)
    }

    fn contains_record(&self, identifier: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        Self::record_exists(&conn, identifier)
    }

    fn replace_record(&self, record: &Record) -> StorageResult<RecordReplacement> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let json = serde_json::to_string(record)?;
        let changed = tx.execute(
            r#"
            UPDATE records SET
                display_name = ?2,
                updated_at = ?3,
                published_at = ?4,
                record_json = ?5
            WHERE identifier = ?1
            "#,
            params![
                record.identifier,
                record.display_name,
                Self::format_time(record.updated_at),
                Self::format_time(record.published_at),
                json,
            ],
        )?;
        if changed == 0 {
            return Ok(RecordReplacement::Absent);
        }

        let annotation = Self::select_annotation(&tx, &record.identifier)?;
        tx.commit()?;

        Ok(match annotation {
            Some(annotation) => RecordReplacement::Replaced(annotation),
            None => RecordReplacement::MissingAnnotation,
        })
    }

    fn count_records(&self) -> StorageResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // === Annotation Operations ===

    fn load_annotation(&self, identifier: &str) -> StorageResult<Option<Annotation>> {
        let conn = self.lock()?;
        Self::select_annotation(&conn, identifier)
    }

    fn load_annotations(&self) -> StorageResult<Vec<Annotation>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT identifier, note, last_played_version, last_played_at, starred
             FROM annotations ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], Self::read_annotation_row)?;

        let mut annotations = Vec::new();
        for row in rows {
            annotations.push(Self::row_to_annotation(row?)?);
        }
        Ok(annotations)
    }

    fn update_annotation(
        &self,
        identifier: &str,
        patch: &AnnotationPatch,
    ) -> StorageResult<Option<Annotation>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let Some(mut annotation) = Self::select_annotation(&tx, identifier)? else {
            return Ok(None);
        };
        annotation.apply(patch);
        Self::write_annotation(&tx, &annotation)?;
        tx.commit()?;

        Ok(Some(annotation))
    }

    fn count_annotations(&self) -> StorageResult<usize> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM annotations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // === Pair Operations ===

    fn insert_entry(&self, record: &Record, annotation: &Annotation) -> StorageResult<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if Self::record_exists(&tx, &record.identifier)? {
            return Ok(false);
        }

        let json = serde_json::to_string(record)?;
        tx.execute(
            r#"
            INSERT INTO records (identifier, display_name, updated_at, published_at, record_json)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.identifier,
                record.display_name,
                Self::format_time(record.updated_at),
                Self::format_time(record.published_at),
                json,
            ],
        )?;
        // An orphaned annotation left by an earlier inconsistency is overwritten
        Self::write_annotation(&tx, annotation)?;
        tx.commit()?;

        Ok(true)
    }

    fn delete_entry(&self, identifier: &str) -> StorageResult<EntryRemoval> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let records = tx.execute("DELETE FROM records WHERE identifier = ?1", params![identifier])?;
        let annotations =
            tx.execute("DELETE FROM annotations WHERE identifier = ?1", params![identifier])?;
        tx.commit()?;

        Ok(EntryRemoval {
            record_removed: records > 0,
            annotation_removed: annotations > 0,
        })
    }
}
