//! LSTM runtime: a single recurrent layer followed by one dense unit.
//!
//! Weights use the layout exported by common training libraries for a
//! univariate LSTM: gate blocks ordered input, forget, cell, output, each
//! `units` wide. Inference runs on candle's `LSTM` and `Linear` layers, built
//! from the artifact with [`VarBuilder::from_tensors`].
//!
//! ```text
//! artifact             candle
//! kernel[4u]           lstm.weight_ih_l0  (4u, 1)
//! recurrent_kernel     lstm.weight_hh_l0  (4u, u)   transposed
//! bias[4u]             lstm.bias_ih_l0    (4u)
//!                      lstm.bias_hh_l0    (4u)      zeros
//! dense_kernel[u]      dense.weight       (1, u)
//! dense_bias           dense.bias         (1)
//! ```
//!
//! Candle layers are immutable, so the model is reentrant and shared as is.
//! Only compiled with the `lstm` feature; [`LstmWeights`] always is, so
//! artifacts still parse and validate without it.

use glucocast_core::series::LOOK_BACK;
use serde::{Deserialize, Serialize};

/// Weights as stored in a `"kind": "lstm"` artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmWeights {
    /// Window length the model was trained on
    #[serde(default = "default_look_back")]
    pub look_back: usize,

    pub units: usize,

    /// Input kernel, `4 * units`
    pub kernel: Vec<f64>,

    /// `units` rows of `4 * units`
    pub recurrent_kernel: Vec<Vec<f64>>,

    /// `4 * units`
    pub bias: Vec<f64>,

    /// `units`
    pub dense_kernel: Vec<f64>,

    #[serde(default)]
    pub dense_bias: f64,
}

fn default_look_back() -> usize {
    LOOK_BACK
}

impl LstmWeights {
    /// Check every tensor has the shape implied by `units`.
    pub fn validate(&self) -> Result<(), String> {
        let u = self.units;
        if u == 0 {
            return Err("lstm units must be > 0".into());
        }
        if self.look_back == 0 {
            return Err("lstm look_back must be > 0".into());
        }
        check_len("kernel", self.kernel.len(), 4 * u)?;
        check_len("bias", self.bias.len(), 4 * u)?;
        check_len("dense_kernel", self.dense_kernel.len(), u)?;
        check_len("recurrent_kernel rows", self.recurrent_kernel.len(), u)?;
        for (row, values) in self.recurrent_kernel.iter().enumerate() {
            check_len(&format!("recurrent_kernel[{row}]"), values.len(), 4 * u)?;
        }

        let all_finite = self
            .kernel
            .iter()
            .chain(&self.bias)
            .chain(&self.dense_kernel)
            .chain(self.recurrent_kernel.iter().flatten())
            .chain([&self.dense_bias])
            .all(|w| w.is_finite());
        if !all_finite {
            return Err("lstm weights must be finite".into());
        }
        Ok(())
    }
}

fn check_len(what: &str, got: usize, expected: usize) -> Result<(), String> {
    if got == expected {
        Ok(())
    } else {
        Err(format!("{what} has {got} values, expected {expected}"))
    }
}

#[cfg(feature = "lstm")]
pub use runtime::LstmModel;

#[cfg(feature = "lstm")]
mod runtime {
    use std::collections::HashMap;

    use candle_core::{DType, Device, Module, Tensor};
    use candle_nn::rnn::{LSTM, LSTMConfig, RNN};
    use candle_nn::{Linear, VarBuilder};
    use glucocast_core::error::ModelError;
    use glucocast_core::model::SequenceModel;
    use tracing::trace;

    use super::LstmWeights;

    pub struct LstmModel {
        lstm: LSTM,
        dense: Linear,
        units: usize,
        look_back: usize,
        device: Device,
    }

    impl LstmModel {
        pub fn new(weights: LstmWeights) -> Result<Self, ModelError> {
            weights.validate().map_err(|reason| ModelError::Inference {
                model: "lstm".into(),
                reason,
            })?;
            let device = Device::Cpu;
            let units = weights.units;
            let vb = VarBuilder::from_tensors(
                weight_tensors(&weights, &device).map_err(map_candle_err)?,
                DType::F64,
                &device,
            );
            let lstm = candle_nn::rnn::lstm(1, units, LSTMConfig::default(), vb.pp("lstm"))
                .map_err(map_candle_err)?;
            let dense = candle_nn::linear(units, 1, vb.pp("dense")).map_err(map_candle_err)?;
            Ok(Self {
                lstm,
                dense,
                units,
                look_back: weights.look_back,
                device,
            })
        }

        pub fn units(&self) -> usize {
            self.units
        }

        fn forward(&self, window: &[f64]) -> candle_core::Result<f64> {
            let mut state = self.lstm.zero_state(1)?;
            for &x in window {
                let input = Tensor::new(&[[x]], &self.device)?;
                state = self.lstm.step(&input, &state)?;
            }
            self.dense.forward(state.h())?.reshape(())?.to_scalar::<f64>()
        }
    }

    /// Artifact weights as named tensors in candle's layout.
    fn weight_tensors(
        w: &LstmWeights,
        device: &Device,
    ) -> candle_core::Result<HashMap<String, Tensor>> {
        let u = w.units;
        let recurrent: Vec<f64> = w.recurrent_kernel.iter().flatten().copied().collect();
        let mut tensors = HashMap::new();
        tensors.insert(
            "lstm.weight_ih_l0".to_string(),
            Tensor::from_vec(w.kernel.clone(), (4 * u, 1), device)?,
        );
        tensors.insert(
            "lstm.weight_hh_l0".to_string(),
            Tensor::from_vec(recurrent, (u, 4 * u), device)?.t()?.contiguous()?,
        );
        tensors.insert(
            "lstm.bias_ih_l0".to_string(),
            Tensor::from_vec(w.bias.clone(), 4 * u, device)?,
        );
        tensors.insert(
            "lstm.bias_hh_l0".to_string(),
            Tensor::zeros(4 * u, DType::F64, device)?,
        );
        tensors.insert(
            "dense.weight".to_string(),
            Tensor::from_vec(w.dense_kernel.clone(), (1, u), device)?,
        );
        tensors.insert(
            "dense.bias".to_string(),
            Tensor::from_vec(vec![w.dense_bias], 1, device)?,
        );
        Ok(tensors)
    }

    /// Map Candle errors to ModelError.
    fn map_candle_err(e: candle_core::Error) -> ModelError {
        ModelError::Inference {
            model: "lstm".into(),
            reason: format!("Candle inference error: {e}"),
        }
    }

    impl SequenceModel for LstmModel {
        fn name(&self) -> &str {
            "lstm"
        }

        fn window_len(&self) -> usize {
            self.look_back
        }

        fn predict(&self, window: &[f64]) -> Result<f64, ModelError> {
            if window.len() != self.look_back {
                return Err(ModelError::WindowMismatch {
                    model: "lstm".into(),
                    expected: self.look_back,
                    got: window.len(),
                });
            }
            let y = self.forward(window).map_err(map_candle_err)?;
            trace!(units = self.units, output = y, "lstm forward pass");
            Ok(y)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_weights(units: usize) -> LstmWeights {
        LstmWeights {
            look_back: LOOK_BACK,
            units,
            kernel: vec![0.0; 4 * units],
            recurrent_kernel: vec![vec![0.0; 4 * units]; units],
            bias: vec![0.0; 4 * units],
            dense_kernel: vec![0.0; units],
            dense_bias: 0.0,
        }
    }

    #[test]
    fn validate_rejects_misshapen_weights() {
        let mut weights = zero_weights(3);
        weights.recurrent_kernel.pop();
        let err = weights.validate().unwrap_err();
        assert!(err.contains("recurrent_kernel rows"));

        let mut weights = zero_weights(2);
        weights.bias[1] = f64::NAN;
        assert!(weights.validate().is_err());
    }

    #[cfg(feature = "lstm")]
    mod runtime {
        use super::*;
        use glucocast_core::error::ModelError;
        use glucocast_core::model::SequenceModel;

        fn sigmoid(x: f64) -> f64 {
            1.0 / (1.0 + (-x).exp())
        }

        #[test]
        fn zero_network_outputs_dense_bias() {
            let mut weights = zero_weights(4);
            weights.dense_bias = 0.42;
            let model = LstmModel::new(weights).unwrap();
            let y = model.predict(&[0.5; LOOK_BACK]).unwrap();
            assert!((y - 0.42).abs() < 1e-12);
        }

        #[test]
        fn single_unit_matches_hand_computation() {
            // cell gate passes the input through; all other gates saturate open
            let mut weights = zero_weights(1);
            weights.look_back = 1;
            weights.kernel = vec![0.0, 0.0, 1.0, 0.0];
            weights.bias = vec![50.0, -50.0, 0.0, 50.0];
            weights.dense_kernel = vec![1.0];
            let model = LstmModel::new(weights).unwrap();

            let y = model.predict(&[0.3]).unwrap();
            let expected = (0.3f64).tanh().tanh();
            assert!((y - expected).abs() < 1e-9, "{y} vs {expected}");
        }

        #[test]
        fn recurrent_kernel_is_read_row_per_unit() {
            // two steps through one unit; the second sees h from the first
            let mut weights = zero_weights(1);
            weights.look_back = 2;
            weights.kernel = vec![0.0, 0.0, 1.0, 0.0];
            weights.recurrent_kernel = vec![vec![0.0, 0.0, 2.0, 0.0]];
            weights.dense_kernel = vec![1.0];
            let model = LstmModel::new(weights).unwrap();

            let gate = sigmoid(0.0);
            let c1 = gate * 0.5f64.tanh();
            let h1 = gate * c1.tanh();
            let c2 = gate * c1 + gate * (0.25 + 2.0 * h1).tanh();
            let h2 = gate * c2.tanh();

            let y = model.predict(&[0.5, 0.25]).unwrap();
            assert!((y - h2).abs() < 1e-9, "{y} vs {h2}");
        }

        #[test]
        fn repeated_calls_are_independent() {
            let mut weights = zero_weights(2);
            weights.kernel = vec![0.3, 0.1, 0.7, 0.2, -0.4, 0.5, 0.9, 0.1];
            weights.recurrent_kernel = vec![vec![0.1; 8], vec![-0.2; 8]];
            weights.dense_kernel = vec![1.0, -1.0];
            let model = LstmModel::new(weights).unwrap();

            let window: Vec<f64> = (0..LOOK_BACK).map(|i| i as f64 / 20.0).collect();
            let first = model.predict(&window).unwrap();
            let second = model.predict(&window).unwrap();
            assert_eq!(first, second);
        }

        #[test]
        fn rejects_invalid_weights_and_wrong_window() {
            let mut weights = zero_weights(3);
            weights.dense_kernel.pop();
            assert!(LstmModel::new(weights).is_err());

            let model = LstmModel::new(zero_weights(2)).unwrap();
            assert_eq!(model.units(), 2);
            assert!(matches!(
                model.predict(&[0.1; 3]),
                Err(ModelError::WindowMismatch { got: 3, .. })
            ));
        }
    }
}
