//! Glucose series: the validated, immutable input window of the pipeline.

use serde::Serialize;

use crate::error::ValidationError;

/// Number of trailing readings the model consumes and the analyzer inspects.
pub const LOOK_BACK: usize = 12;

/// Number of 5-minute steps produced by a rollout.
pub const HORIZON_STEPS: usize = 12;

/// Minutes between consecutive readings and forecast steps.
pub const STEP_MINUTES: u32 = 5;

/// Total forecast horizon.
pub const HORIZON_MINUTES: u32 = STEP_MINUTES * HORIZON_STEPS as u32;

/// Physiological floor, mg/dL.
pub const MIN_GLUCOSE: f64 = 40.0;

/// Physiological ceiling, mg/dL.
pub const MAX_GLUCOSE: f64 = 400.0;

/// Largest plausible change between two 5-minute steps, mg/dL.
pub const MAX_CHANGE_RATE: f64 = 4.0;

/// Historical deltas above `MAX_CHANGE_RATE * SUSPICIOUS_JUMP_FACTOR` are flagged.
pub const SUSPICIOUS_JUMP_FACTOR: f64 = 3.0;

/// An ordered, oldest-first sequence of glucose readings in mg/dL.
///
/// Can only be built through [`GlucoseSeries::try_new`], so holding one
/// proves the history is long enough and every value is finite and within
/// `[MIN_GLUCOSE, MAX_GLUCOSE]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GlucoseSeries {
    values: Vec<f64>,
}

impl GlucoseSeries {
    /// Check the invariants and take ownership of the values.
    ///
    /// Fails closed: nothing is clamped or dropped.
    pub fn try_new(values: Vec<f64>) -> Result<Self, ValidationError> {
        if values.is_empty() {
            return Err(ValidationError::EmptyHistory);
        }
        if values.len() < LOOK_BACK {
            return Err(ValidationError::InsufficientHistory { got: values.len() });
        }

        for (index, &value) in values.iter().enumerate() {
            Self::check_value(index, value)?;
        }

        Ok(Self { values })
    }

    /// Check one reading at `index` for finiteness and range.
    pub fn check_value(index: usize, value: f64) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::InvalidValue {
                index,
                value: value.to_string(),
            });
        }
        if !(MIN_GLUCOSE..=MAX_GLUCOSE).contains(&value) {
            return Err(ValidationError::OutOfRange { index, value });
        }
        Ok(())
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a constructed series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The trailing `LOOK_BACK` readings.
    pub fn window(&self) -> &[f64] {
        &self.values[self.values.len() - LOOK_BACK..]
    }

    /// The most recent reading, used as the anchor for step 0 of a forecast.
    pub fn last(&self) -> f64 {
        // try_new guarantees at least LOOK_BACK values
        self.values[self.values.len() - 1]
    }
}
