//! File-based history store: persistent JSON-lines storage.
//!
//! Each line is one reading:
//!
//! ```json
//! {"user_id":"42","value":128.0,"recorded_at":"2026-03-01T08:05:00Z"}
//! ```
//!
//! Storage location: `~/.glucocast/history/readings.jsonl`

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glucocast_core::error::HistoryError;
use glucocast_core::history::{GlucoseReading, HistoryProvider, ReadingOrder};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::in_memory::{ReadingMap, check_reading, newest_first};

#[derive(Debug, Serialize, Deserialize)]
struct ReadingLine {
    user_id: String,
    value: f64,
    recorded_at: DateTime<Utc>,
}

/// A file-backed store using JSONL (one reading per line).
///
/// Readings are loaded into memory on creation and appended to disk on every
/// `record`.
pub struct FileHistory {
    path: PathBuf,
    readings: Arc<RwLock<ReadingMap>>,
}

impl FileHistory {
    /// Open the store at `path`.
    ///
    /// If the file does not exist, starts empty (file created on first write).
    pub fn new(path: PathBuf) -> Self {
        let readings = Self::load_from_disk(&path);
        debug!(
            path = %path.display(),
            users = readings.len(),
            "File history store loaded"
        );
        Self {
            path,
            readings: Arc::new(RwLock::new(readings)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Users with at least one reading.
    pub async fn users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.readings.read().await.keys().cloned().collect();
        users.sort();
        users
    }

    fn load_from_disk(path: &Path) -> ReadingMap {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return HashMap::new(),
        };

        let mut readings = ReadingMap::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ReadingLine>(line) {
                Ok(r) if r.value.is_finite() => readings
                    .entry(r.user_id)
                    .or_default()
                    .push(GlucoseReading::new(r.value, r.recorded_at)),
                Ok(_) => warn!(line = line_no + 1, "Skipping non-finite glucose reading"),
                Err(e) => warn!(line = line_no + 1, error = %e, "Skipping corrupted reading"),
            }
        }
        readings
    }

    fn append(&self, line: &ReadingLine) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                HistoryError::Storage(format!("Failed to create history directory: {e}"))
            })?;
        }

        let mut encoded = serde_json::to_string(line)?;
        encoded.push('\n');

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| HistoryError::Storage(format!("Failed to open history file: {e}")))?;
        file.write_all(encoded.as_bytes())
            .map_err(|e| HistoryError::Storage(format!("Failed to write history file: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl HistoryProvider for FileHistory {
    fn name(&self) -> &str {
        "file"
    }

    fn order(&self) -> ReadingOrder {
        ReadingOrder::NewestFirst
    }

    async fn recent_readings(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<GlucoseReading>, HistoryError> {
        let readings = self.readings.read().await;
        Ok(readings
            .get(user_id)
            .map(|r| newest_first(r, limit))
            .unwrap_or_default())
    }

    async fn record(&self, user_id: &str, reading: GlucoseReading) -> Result<(), HistoryError> {
        check_reading(&reading)?;

        // hold the write lock across the append so lines land in record order
        let mut readings = self.readings.write().await;
        self.append(&ReadingLine {
            user_id: user_id.to_string(),
            value: reading.value,
            recorded_at: reading.recorded_at,
        })?;
        readings.entry(user_id.to_string()).or_default().push(reading);
        Ok(())
    }
}
