use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDateTime};
use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::scoring::ScoreReport;

/// On-disk timestamp layout, local time without offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One finished session as recorded in the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub wpm: f64,
    pub accuracy: f64,
}

impl HistoryEntry {
    pub fn new(timestamp: NaiveDateTime, wpm: f64, accuracy: f64) -> Self {
        Self {
            timestamp,
            wpm,
            accuracy,
        }
    }

    pub fn from_report(at: SystemTime, report: &ScoreReport) -> Self {
        let local: DateTime<Local> = at.into();
        Self::new(local.naive_local(), report.wpm, report.accuracy)
    }
}

mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HistoryBackend {
    #[default]
    JsonLines,
    Sqlite,
}

impl HistoryBackend {
    pub fn file_name(&self) -> &'static str {
        match self {
            HistoryBackend::JsonLines => "history.jsonl",
            HistoryBackend::Sqlite => "history.db",
        }
    }
}

/// Whether a store may be written. Trend display opens stores read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadWrite,
    ReadOnly,
}

impl Access {
    pub fn from_save_flag(save: bool) -> Self {
        if save {
            Access::ReadWrite
        } else {
            Access::ReadOnly
        }
    }
}

/// Persistent, append-only log of finished sessions.
pub trait HistoryStore {
    fn append(&mut self, entry: &HistoryEntry) -> Result<(), StoreError>;
    /// All entries in insertion order.
    fn read_all(&self) -> Result<Vec<HistoryEntry>, StoreError>;
    /// Remove every entry. Callers confirm with the user first.
    fn truncate(&mut self) -> Result<(), StoreError>;
}

pub fn open_store(
    backend: HistoryBackend,
    path: impl AsRef<Path>,
    access: Access,
) -> Result<Box<dyn HistoryStore>, StoreError> {
    let path = path.as_ref();
    debug!(%backend, path = %path.display(), ?access, "opening history store");
    Ok(match backend {
        HistoryBackend::JsonLines => Box::new(JsonLinesStore::new(path, access)),
        HistoryBackend::Sqlite => Box::new(SqliteStore::open(path, access)?),
    })
}

/// One JSON object per line, appended as sessions finish.
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    path: PathBuf,
    access: Access,
}

impl JsonLinesStore {
    pub fn new(path: impl AsRef<Path>, access: Access) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            access,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        match self.access {
            Access::ReadWrite => Ok(()),
            Access::ReadOnly => Err(StoreError::ReadOnly),
        }
    }
}

impl HistoryStore for JsonLinesStore {
    fn append(&mut self, entry: &HistoryEntry) -> Result<(), StoreError> {
        self.ensure_writable()?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(line = idx + 1, error = %e, "skipping malformed history line"),
            }
        }
        Ok(entries)
    }

    fn truncate(&mut self) -> Result<(), StoreError> {
        self.ensure_writable()?;
        if !self.path.exists() {
            return Ok(());
        }
        OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        Ok(())
    }
}

/// History that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Vec<HistoryEntry>,
}

impl HistoryStore for MemoryStore {
    fn append(&mut self, entry: &HistoryEntry) -> Result<(), StoreError> {
        self.entries.push(entry.clone());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(self.entries.clone())
    }

    fn truncate(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }
}

/// History kept in a SQLite table.
#[derive(Debug)]
pub struct SqliteStore {
    // None when opened read-only before any session was ever saved.
    conn: Option<Connection>,
    access: Access,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>, access: Access) -> Result<Self, StoreError> {
        let path = path.as_ref();

        let conn = match access {
            Access::ReadOnly if !path.exists() => None,
            Access::ReadOnly => Some(Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY,
            )?),
            Access::ReadWrite => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let conn = Connection::open(path)?;
                conn.execute(
                    r#"
                    CREATE TABLE IF NOT EXISTS history (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        timestamp TEXT NOT NULL,
                        wpm REAL NOT NULL,
                        accuracy REAL NOT NULL
                    )
                    "#,
                    [],
                )?;
                Some(conn)
            }
        };

        Ok(Self { conn, access })
    }

    fn writable_conn(&self) -> Result<&Connection, StoreError> {
        match (self.access, &self.conn) {
            (Access::ReadWrite, Some(conn)) => Ok(conn),
            _ => Err(StoreError::ReadOnly),
        }
    }
}

impl HistoryStore for SqliteStore {
    fn append(&mut self, entry: &HistoryEntry) -> Result<(), StoreError> {
        self.writable_conn()?.execute(
            "INSERT INTO history (timestamp, wpm, accuracy) VALUES (?1, ?2, ?3)",
            params![
                entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                entry.wpm,
                entry.accuracy,
            ],
        )?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        let Some(conn) = &self.conn else {
            return Ok(Vec::new());
        };

        let mut stmt = conn.prepare("SELECT timestamp, wpm, accuracy FROM history ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            let raw: String = row.get(0)?;
            let timestamp = NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(|_| {
                rusqlite::Error::InvalidColumnType(
                    0,
                    "timestamp".to_string(),
                    rusqlite::types::Type::Text,
                )
            })?;
            Ok(HistoryEntry::new(timestamp, row.get(1)?, row.get(2)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    fn truncate(&mut self) -> Result<(), StoreError> {
        self.writable_conn()?.execute("DELETE FROM history", [])?;
        Ok(())
    }
}

/// Aggregate view of past sessions for the results screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSummary {
    pub sessions: usize,
    pub mean_wpm: f64,
    pub best_wpm: f64,
    pub wpm_std_dev: f64,
    pub mean_accuracy: f64,
}

impl TrendSummary {
    pub fn from_entries(entries: &[HistoryEntry]) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }

        let n = entries.len() as f64;
        let mean_wpm = entries.iter().map(|e| e.wpm).sum::<f64>() / n;
        let variance = entries
            .iter()
            .map(|e| (e.wpm - mean_wpm).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            sessions: entries.len(),
            mean_wpm,
            best_wpm: entries.iter().map(|e| e.wpm).fold(f64::MIN, f64::max),
            wpm_std_dev: variance.sqrt(),
            mean_accuracy: entries.iter().map(|e| e.accuracy).sum::<f64>() / n,
        })
    }
}
