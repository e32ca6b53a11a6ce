//! # Glucocast Core
//!
//! Domain types, traits, and error definitions for the Glucocast glucose
//! forecasting pipeline. Every other crate depends inward on this one.
//!
//! The opaque sequence model and the history store are traits here; the
//! runtimes live in `glucocast-models` and the stores in `glucocast-history`.

pub mod error;
pub mod series;
pub mod forecast;
pub mod model;
pub mod scaler;
pub mod history;

// Re-export key types at crate root for ergonomics
pub use error::{ErrorKind, ForecastError, HistoryError, ModelError, Result, ValidationError};
pub use series::{
    GlucoseSeries, HORIZON_MINUTES, HORIZON_STEPS, LOOK_BACK, MAX_CHANGE_RATE, MAX_GLUCOSE,
    MIN_GLUCOSE, STEP_MINUTES, SUSPICIOUS_JUMP_FACTOR,
};
pub use forecast::{
    ConstrainedForecast, EventContext, ForecastMetadata, ForecastResult, ForecastStatus,
    RawForecast, SuspiciousJump, Trend, TrendAnalysis, satisfies_constraints,
};
pub use model::{ModelHandle, ModelRuntime, SequenceModel, Serialized};
pub use scaler::MinMaxScaler;
pub use history::{GlucoseReading, HistoryProvider, ReadingOrder, reconcile};
