//! In-memory history store: useful for testing and ephemeral sessions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use glucocast_core::error::HistoryError;
use glucocast_core::history::{GlucoseReading, HistoryProvider, ReadingOrder};
use tokio::sync::RwLock;

/// Readings per user, in insertion order.
pub(crate) type ReadingMap = HashMap<String, Vec<GlucoseReading>>;

/// An in-memory store keyed by user id.
pub struct InMemoryHistory {
    readings: Arc<RwLock<ReadingMap>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self {
            readings: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed a user's history, oldest first.
    pub async fn extend(&self, user_id: &str, readings: impl IntoIterator<Item = GlucoseReading>) {
        self.readings
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .extend(readings);
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// The `limit` most recent readings, newest first.
///
/// Readings sharing a timestamp come out in reverse insertion order, so the
/// last one recorded counts as the newest.
pub(crate) fn newest_first(readings: &[GlucoseReading], limit: usize) -> Vec<GlucoseReading> {
    let mut out: Vec<GlucoseReading> = readings.iter().rev().cloned().collect();
    out.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    out.truncate(limit);
    out
}

pub(crate) fn check_reading(reading: &GlucoseReading) -> Result<(), HistoryError> {
    if reading.value.is_finite() {
        Ok(())
    } else {
        Err(HistoryError::InvalidReading(format!(
            "glucose value must be finite, got {}",
            reading.value
        )))
    }
}

#[async_trait]
impl HistoryProvider for InMemoryHistory {
    fn name(&self) -> &str {
        "in_memory"
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
        self.readings
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push(reading);
        Ok(())
    }
}
