//! SQLite persistence for run history, kept under a `.intakeman/` data
//! directory next to where the suite is invoked.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};

use crate::error::IntakeError;
use crate::history::RunRecord;
use crate::runner::CaseOutcome;

const DATA_DIR: &str = ".intakeman";
const DB_FILE: &str = "intakeman.db";

pub struct RunStore {
    conn: Connection,
}

impl RunStore {
    /// Open (and initialize if needed) the database in the data directory.
    pub fn open_default() -> Result<Self, IntakeError> {
        let dir = data_dir();
        fs::create_dir_all(&dir).map_err(|err| IntakeError::Io {
            action: "create data directory",
            path: dir.display().to_string(),
            message: err.to_string(),
        })?;
        Self::open(dir.join(DB_FILE))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, IntakeError> {
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::initialize(conn)
    }

    pub fn open_in_memory() -> Result<Self, IntakeError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self, IntakeError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS run_history (
               id INTEGER PRIMARY KEY AUTOINCREMENT,
               started_at INTEGER NOT NULL,
               label TEXT NOT NULL,
               passed INTEGER NOT NULL,
               status_code INTEGER,
               duration_ms INTEGER NOT NULL
             );",
        )?;
        Ok(Self { conn })
    }

    pub fn record_outcome(
        &self,
        started_at: u64,
        outcome: &CaseOutcome,
    ) -> Result<(), IntakeError> {
        self.conn.execute(
            "INSERT INTO run_history (started_at, label, passed, status_code, duration_ms)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                started_at as i64,
                outcome.label,
                outcome.passed,
                outcome.status_code.map(i64::from),
                outcome.duration_ms as i64,
            ],
        )?;
        Ok(())
    }

    pub fn record_all(
        &self,
        started_at: u64,
        outcomes: &[CaseOutcome],
    ) -> Result<(), IntakeError> {
        for outcome in outcomes {
            self.record_outcome(started_at, outcome)?;
        }
        Ok(())
    }

    /// The most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<RunRecord>, IntakeError> {
        let mut statement = self.conn.prepare(
            "SELECT started_at, label, passed, status_code, duration_ms
             FROM run_history
             ORDER BY started_at DESC, id DESC
             LIMIT ?1;",
        )?;

        let rows = statement.query_map(params![limit as i64], |row| {
            Ok(RunRecord {
                timestamp: row.get::<_, i64>(0)? as u64,
                label: row.get(1)?,
                passed: row.get(2)?,
                status_code: row.get::<_, Option<i64>>(3)?.map(|code| code as u16),
                duration_ms: row.get::<_, i64>(4)? as u64,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

fn data_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(DATA_DIR)
}
