//! Model fallback: ordered chain of models tried in turn.
//!
//! When a model fails (inference error, non-finite output, wrong window),
//! the next model in the chain gets the same window.

use std::sync::Arc;

use glucocast_core::error::ModelError;
use glucocast_core::model::SequenceModel;
use glucocast_core::series::LOOK_BACK;
use tracing::{debug, warn};

/// A model that wraps an ordered list of models and falls back on failure.
pub struct FallbackModel {
    name: String,
    chain: Vec<Arc<dyn SequenceModel>>,
}

impl FallbackModel {
    /// Create a new fallback model with no entries.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain: Vec::new(),
        }
    }

    /// Add a model to the end of the chain.
    pub fn add(mut self, model: Arc<dyn SequenceModel>) -> Self {
        self.chain.push(model);
        self
    }

    /// Number of models in the chain.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

impl SequenceModel for FallbackModel {
    fn name(&self) -> &str {
        &self.name
    }

    /// The primary model's window.
    fn window_len(&self) -> usize {
        self.chain.first().map_or(LOOK_BACK, |m| m.window_len())
    }

    fn predict(&self, window: &[f64]) -> Result<f64, ModelError> {
        let mut last_error = ModelError::NotFound(format!("no models in chain '{}'", self.name));

        for (i, model) in self.chain.iter().enumerate() {
            // a fallback trained on a shorter window sees the most recent values
            let input = match window.len().checked_sub(model.window_len()) {
                Some(skip) => &window[skip..],
                None => window,
            };

            match model.predict(input) {
                Ok(value) if value.is_finite() => {
                    if i > 0 {
                        debug!(model = model.name(), attempt = i + 1, "Fallback: model succeeded");
                    }
                    return Ok(value);
                }
                Ok(_) => {
                    warn!(
                        model = model.name(),
                        "Fallback: model produced a non-finite value, trying next"
                    );
                    last_error = ModelError::NonFinite {
                        model: model.name().to_string(),
                        step: 0,
                    };
                }
                Err(e) => {
                    warn!(
                        model = model.name(),
                        error = %e,
                        "Fallback: model failed, trying next"
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::DriftModel;
    use std::sync::Mutex;

    /// A mock model that always fails.
    struct FailingModel {
        calls: Mutex<usize>,
    }

    impl FailingModel {
        fn new() -> Self {
            Self {
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl SequenceModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        fn predict(&self, _window: &[f64]) -> Result<f64, ModelError> {
            *self.calls.lock().unwrap() += 1;
            Err(ModelError::Inference {
                model: "failing".into(),
                reason: "weights corrupted".into(),
            })
        }
    }

    /// Returns NaN to exercise the finiteness check.
    struct NanModel;

    impl SequenceModel for NanModel {
        fn name(&self) -> &str {
            "nan"
        }

        fn predict(&self, _window: &[f64]) -> Result<f64, ModelError> {
            Ok(f64::NAN)
        }
    }

    fn window() -> Vec<f64> {
        (0..LOOK_BACK).map(|i| 0.2 + 0.01 * i as f64).collect()
    }

    #[test]
    fn first_model_succeeds() {
        let fallback = FallbackModel::new("test")
            .add(Arc::new(DriftModel::default()))
            .add(Arc::new(FailingModel::new()));
        assert!((fallback.predict(&window()).unwrap() - 0.32).abs() < 1e-12);
    }

    #[test]
    fn falls_back_on_failure() {
        let failing = Arc::new(FailingModel::new());
        let fallback = FallbackModel::new("test")
            .add(failing.clone())
            .add(Arc::new(DriftModel::default()));

        assert!(fallback.predict(&window()).is_ok());
        assert_eq!(failing.calls(), 1);
    }

    #[test]
    fn falls_back_on_non_finite_output() {
        let fallback = FallbackModel::new("test")
            .add(Arc::new(NanModel))
            .add(Arc::new(DriftModel::default()));
        assert!(fallback.predict(&window()).unwrap().is_finite());
    }

    #[test]
    fn all_models_fail_returns_last_error() {
        let fallback = FallbackModel::new("test")
            .add(Arc::new(NanModel))
            .add(Arc::new(FailingModel::new()));
        match fallback.predict(&window()).unwrap_err() {
            ModelError::Inference { reason, .. } => assert_eq!(reason, "weights corrupted"),
            other => panic!("Expected Inference, got: {other:?}"),
        }
    }

    #[test]
    fn empty_chain_returns_not_found() {
        let fallback = FallbackModel::new("empty");
        assert!(fallback.is_empty());
        assert!(matches!(
            fallback.predict(&window()),
            Err(ModelError::NotFound(_))
        ));
    }

    #[test]
    fn chain_length_and_window() {
        let fallback = FallbackModel::new("test")
            .add(Arc::new(DriftModel::default()))
            .add(Arc::new(FailingModel::new()));
        assert_eq!(fallback.len(), 2);
        assert_eq!(fallback.window_len(), LOOK_BACK);
    }
}
