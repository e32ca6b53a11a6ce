//! The Glucocast forecasting pipeline.
//!
//! Stages, in order:
//!
//! 1. **validator** builds a `GlucoseSeries` or fails closed
//! 2. **rollout** runs the sequence model autoregressively for 12 steps
//! 3. **constraints** clamps to physiological bounds and step deltas
//! 4. **noise** adds optional realism variability
//! 5. **analysis** summarizes the input window's trend
//! 6. **events** layers meal and activity heuristics and re-constrains
//! 7. **assembler** builds the `ForecastResult`
//!
//! `Forecaster` runs the stages against one model handle; `ForecastService`
//! adds the history store, per-user models, and the request deadline.

pub mod analysis;
pub mod assembler;
pub mod constraints;
pub mod deadline;
pub mod events;
pub mod noise;
pub mod pipeline;
pub mod rollout;
pub mod service;
pub mod validator;

pub use analysis::analyze;
pub use constraints::constrain;
pub use deadline::forecast_with_deadline;
pub use events::adjust;
pub use noise::{
    GaussianNoise, NoNoise, NoiseSource, add_noise, apply_perturbations, perturbations,
};
pub use pipeline::{Forecaster, HEALTH_PROBE, HealthReport, HealthStatus};
pub use rollout::rollout;
pub use service::ForecastService;
pub use validator::{Validated, validate, validate_json};
