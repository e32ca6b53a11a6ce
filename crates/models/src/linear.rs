//! Linear autoregressive model: `next = w · window + b`.

use glucocast_core::error::ModelError;
use glucocast_core::model::SequenceModel;
use serde::{Deserialize, Serialize};

/// Weights as stored in a `"kind": "linear"` artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearWeights {
    /// One weight per window position, oldest first
    pub weights: Vec<f64>,
    #[serde(default)]
    pub bias: f64,
}

impl LinearWeights {
    pub fn validate(&self) -> Result<(), String> {
        if self.weights.is_empty() {
            return Err("linear model has no weights".into());
        }
        if !self.weights.iter().chain([&self.bias]).all(|w| w.is_finite()) {
            return Err("linear model weights must be finite".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LinearModel {
    weights: LinearWeights,
}

impl LinearModel {
    pub fn new(weights: LinearWeights) -> Self {
        Self { weights }
    }
}

impl SequenceModel for LinearModel {
    fn name(&self) -> &str {
        "linear"
    }

    fn window_len(&self) -> usize {
        self.weights.weights.len()
    }

    fn predict(&self, window: &[f64]) -> Result<f64, ModelError> {
        if window.len() != self.window_len() {
            return Err(ModelError::WindowMismatch {
                model: self.name().into(),
                expected: self.window_len(),
                got: window.len(),
            });
        }
        let dot: f64 = self
            .weights
            .weights
            .iter()
            .zip(window)
            .map(|(w, x)| w * x)
            .sum();
        Ok(dot + self.weights.bias)
    }
}
