//! Sequence model traits: the abstraction over trained forecasting models.
//!
//! A model consumes a fixed-length window of *normalized* glucose values and
//! returns the next normalized value. The rollout engine never sees which
//! runtime sits behind it.
//!
//! Implementations: LSTM, linear autoregressive, drift baseline, fallback
//! chains (see `glucocast-models`).

use std::sync::{Arc, Mutex};

use crate::error::ModelError;
use crate::scaler::MinMaxScaler;
use crate::series::LOOK_BACK;

/// The core model trait.
///
/// Implementations must be reentrant: `predict` takes `&self` and may be
/// called from several requests at once. Runtimes that keep mutable scratch
/// state implement [`ModelRuntime`] instead and are shared via [`Serialized`].
pub trait SequenceModel: Send + Sync {
    /// A human-readable name for this model (e.g., "lstm", "drift").
    fn name(&self) -> &str;

    /// Length of the input window the model was trained on.
    fn window_len(&self) -> usize {
        LOOK_BACK
    }

    /// Predict the next normalized value from a normalized window.
    fn predict(&self, window: &[f64]) -> Result<f64, ModelError>;
}

impl<M: SequenceModel + ?Sized> SequenceModel for Arc<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn window_len(&self) -> usize {
        (**self).window_len()
    }

    fn predict(&self, window: &[f64]) -> Result<f64, ModelError> {
        (**self).predict(window)
    }
}

/// A model runtime that is not reentrant.
pub trait ModelRuntime: Send {
    fn name(&self) -> &str;

    fn window_len(&self) -> usize {
        LOOK_BACK
    }

    fn predict(&mut self, window: &[f64]) -> Result<f64, ModelError>;
}

/// Serializes inference on a non-reentrant runtime through a mutex.
pub struct Serialized<R: ModelRuntime> {
    name: String,
    window_len: usize,
    runtime: Mutex<R>,
}

impl<R: ModelRuntime> Serialized<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            name: runtime.name().to_string(),
            window_len: runtime.window_len(),
            runtime: Mutex::new(runtime),
        }
    }
}

impl<R: ModelRuntime> SequenceModel for Serialized<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn window_len(&self) -> usize {
        self.window_len
    }

    fn predict(&self, window: &[f64]) -> Result<f64, ModelError> {
        let mut runtime = self
            .runtime
            .lock()
            .map_err(|e| ModelError::Poisoned(format!("{}: {e}", self.name)))?;
        runtime.predict(window)
    }
}

/// The process-wide, read-only pairing of a model and the normalization
/// parameters it was trained with.
///
/// Cheap to clone; share one per deployment (or per user) across requests.
#[derive(Clone)]
pub struct ModelHandle {
    model: Arc<dyn SequenceModel>,
    scaler: MinMaxScaler,
}

impl ModelHandle {
    pub fn new(model: Arc<dyn SequenceModel>, scaler: MinMaxScaler) -> Self {
        Self { model, scaler }
    }

    pub fn model(&self) -> &dyn SequenceModel {
        self.model.as_ref()
    }

    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    pub fn name(&self) -> &str {
        self.model.name()
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model", &self.model.name())
            .field("scaler", &self.scaler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts calls through `&mut self` to prove the runtime is reached.
    struct CountingRuntime {
        calls: usize,
    }

    impl ModelRuntime for CountingRuntime {
        fn name(&self) -> &str {
            "counting"
        }

        fn predict(&mut self, window: &[f64]) -> Result<f64, ModelError> {
            self.calls += 1;
            Ok(window[window.len() - 1] + self.calls as f64)
        }
    }

    #[test]
    fn serialized_runtime_forwards_calls() {
        let model = Serialized::new(CountingRuntime { calls: 0 });
        assert_eq!(model.name(), "counting");
        assert_eq!(model.window_len(), LOOK_BACK);
        assert_eq!(model.predict(&[0.5]).unwrap(), 1.5);
        assert_eq!(model.predict(&[0.5]).unwrap(), 2.5);
    }

    #[test]
    fn serialized_runtime_is_shareable_across_threads() {
        let model = Arc::new(Serialized::new(CountingRuntime { calls: 0 }));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = model.clone();
                std::thread::spawn(move || m.predict(&[0.0]).unwrap())
            })
            .collect();
        let mut outputs: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        outputs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(outputs, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn handle_exposes_model_name() {
        let handle = ModelHandle::new(
            Arc::new(Serialized::new(CountingRuntime { calls: 0 })),
            MinMaxScaler::default(),
        );
        assert_eq!(handle.name(), "counting");
        assert!(format!("{handle:?}").contains("counting"));
    }
}
