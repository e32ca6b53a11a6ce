//! Drift baseline: extends the window's average step.
//!
//! `next = last + damping * (last - first) / (n - 1)`
//!
//! Needs no trained artifact, so it is the default model when none is
//! configured and the last link of a fallback chain.

use glucocast_core::error::ModelError;
use glucocast_core::model::SequenceModel;
use glucocast_core::series::LOOK_BACK;

#[derive(Debug, Clone)]
pub struct DriftModel {
    damping: f64,
    window_len: usize,
}

impl DriftModel {
    pub fn new(damping: f64) -> Self {
        Self {
            damping,
            window_len: LOOK_BACK,
        }
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }
}

impl Default for DriftModel {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SequenceModel for DriftModel {
    fn name(&self) -> &str {
        "drift"
    }

    fn window_len(&self) -> usize {
        self.window_len
    }

    fn predict(&self, window: &[f64]) -> Result<f64, ModelError> {
        if window.len() != self.window_len {
            return Err(ModelError::WindowMismatch {
                model: self.name().into(),
                expected: self.window_len,
                got: window.len(),
            });
        }

        let first = window[0];
        let last = window[window.len() - 1];
        let mean_step = (last - first) / (window.len() - 1) as f64;
        Ok(last + self.damping * mean_step)
    }
}
