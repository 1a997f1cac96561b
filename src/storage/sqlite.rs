//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{FailureRecord, FileCollision, PersistedRecord, RunRecord, RunStatus};
use crate::RippleError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(RippleError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, RippleError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, RippleError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Paper Records =====

    fn record_persisted(
        &mut self,
        run_id: i64,
        paper_id: &str,
        title: Option<&str>,
        file_name: &str,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO papers (paper_id, title, file_name, run_id, persisted_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![paper_id, title, file_name, run_id, now],
        )?;
        Ok(())
    }

    fn record_failure(
        &mut self,
        run_id: i64,
        paper_id: &str,
        kind: &str,
        error: &str,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO failures (paper_id, run_id, kind, error, failed_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![paper_id, run_id, kind, error, now],
        )?;
        Ok(())
    }

    fn count_persisted(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM papers WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn get_persisted(&self, run_id: i64) -> StorageResult<Vec<PersistedRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT paper_id, title, file_name, run_id FROM papers WHERE run_id = ?1 ORDER BY id",
        )?;

        let records = stmt
            .query_map(params![run_id], |row| {
                Ok(PersistedRecord {
                    paper_id: row.get(0)?,
                    title: row.get(1)?,
                    file_name: row.get(2)?,
                    run_id: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_failures(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM failures WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn get_failures(&self, run_id: i64) -> StorageResult<Vec<FailureRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT paper_id, run_id, kind, error, failed_at FROM failures WHERE run_id = ?1 ORDER BY id",
        )?;

        let failures = stmt
            .query_map(params![run_id], |row| {
                Ok(FailureRecord {
                    paper_id: row.get(0)?,
                    run_id: row.get(1)?,
                    kind: row.get(2)?,
                    error: row.get(3)?,
                    failed_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(failures)
    }

    fn get_file_collisions(&self, run_id: i64) -> StorageResult<Vec<FileCollision>> {
        let mut stmt = self.conn.prepare(
            "SELECT file_name, paper_id FROM papers
             WHERE run_id = ?1 AND file_name IN (
                 SELECT file_name FROM papers WHERE run_id = ?1
                 GROUP BY file_name HAVING COUNT(DISTINCT paper_id) > 1
             )
             ORDER BY file_name, id",
        )?;

        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut collisions: Vec<FileCollision> = Vec::new();
        for row in rows {
            let (file_name, paper_id) = row?;
            match collisions.last_mut() {
                Some(last) if last.file_name == file_name => last.paper_ids.push(paper_id),
                _ => collisions.push(FileCollision {
                    file_name,
                    paper_ids: vec![paper_id],
                }),
            }
        }

        Ok(collisions)
    }
}
