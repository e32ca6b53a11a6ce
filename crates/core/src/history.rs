//! History provider trait: where glucose readings come from.
//!
//! The pipeline does not care how readings are stored, only that a provider
//! can return the most recent ones for a user. Stores commonly return rows
//! newest-first; [`reconcile`] turns either ordering into the oldest-first
//! sequence the validator expects.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HistoryError;

/// A single timestamped glucose reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseReading {
    /// mg/dL
    pub value: f64,

    pub recorded_at: DateTime<Utc>,
}

impl GlucoseReading {
    pub fn new(value: f64, recorded_at: DateTime<Utc>) -> Self {
        Self { value, recorded_at }
    }

    pub fn now(value: f64) -> Self {
        Self::new(value, Utc::now())
    }
}

/// How a provider orders the readings it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingOrder {
    OldestFirst,
    #[default]
    NewestFirst,
}

/// The core history trait.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// A human-readable name for this store (e.g., "in_memory", "file").
    fn name(&self) -> &str;

    /// The order in which `recent_readings` returns values.
    fn order(&self) -> ReadingOrder {
        ReadingOrder::NewestFirst
    }

    /// Fetch up to `limit` of the user's most recent readings.
    async fn recent_readings(
        &self,
        user_id: &str,
        limit: usize,
    ) -> std::result::Result<Vec<GlucoseReading>, HistoryError>;

    /// Store a new reading.
    async fn record(
        &self,
        user_id: &str,
        reading: GlucoseReading,
    ) -> std::result::Result<(), HistoryError>;
}

/// Turn provider output into oldest-first glucose values.
///
/// Readings are ordered by timestamp; `order` breaks ties between readings
/// that share a timestamp, so the provider's own sequence is preserved.
pub fn reconcile(mut readings: Vec<GlucoseReading>, order: ReadingOrder) -> Vec<f64> {
    if order == ReadingOrder::NewestFirst {
        readings.reverse();
    }
    // stable sort keeps provider order among equal timestamps
    readings.sort_by_key(|r| r.recorded_at);
    readings.into_iter().map(|r| r.value).collect()
}
