//! Model and scaler artifacts on disk.
//!
//! A model artifact is a JSON document tagged by `kind`:
//!
//! ```json
//! { "kind": "lstm",   "units": 32, "kernel": [...], "recurrent_kernel": [[...]], ... }
//! { "kind": "linear", "weights": [0.0, ..., 1.0], "bias": 0.0 }
//! { "kind": "drift",  "damping": 0.8 }
//! ```
//!
//! A scaler artifact is the serialized [`MinMaxScaler`].

use std::path::Path;
use std::sync::Arc;

use glucocast_core::error::ModelError;
use glucocast_core::model::SequenceModel;
use glucocast_core::scaler::MinMaxScaler;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::drift::DriftModel;
use crate::linear::{LinearModel, LinearWeights};
use crate::lstm::LstmWeights;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Lstm(LstmWeights),
    Linear(LinearWeights),
    Drift {
        #[serde(default = "default_damping")]
        damping: f64,
    },
}

fn default_damping() -> f64 {
    1.0
}

impl ModelArtifact {
    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::Lstm(_) => "lstm",
            ModelArtifact::Linear(_) => "linear",
            ModelArtifact::Drift { .. } => "drift",
        }
    }

    /// Check the artifact's parameters before building a runtime from it.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ModelArtifact::Lstm(w) => w.validate(),
            ModelArtifact::Linear(w) => w.validate(),
            ModelArtifact::Drift { damping } if !damping.is_finite() => {
                Err("drift damping must be finite".into())
            }
            ModelArtifact::Drift { .. } => Ok(()),
        }
    }

    /// Build a shareable model.
    pub fn into_model(self) -> Result<Arc<dyn SequenceModel>, ModelError> {
        let model: Arc<dyn SequenceModel> = match self {
            ModelArtifact::Lstm(weights) => build_lstm(weights)?,
            ModelArtifact::Linear(weights) => Arc::new(LinearModel::new(weights)),
            ModelArtifact::Drift { damping } => Arc::new(DriftModel::new(damping)),
        };
        Ok(model)
    }
}

#[cfg(feature = "lstm")]
fn build_lstm(weights: LstmWeights) -> Result<Arc<dyn SequenceModel>, ModelError> {
    Ok(Arc::new(crate::lstm::LstmModel::new(weights)?))
}

#[cfg(not(feature = "lstm"))]
fn build_lstm(_weights: LstmWeights) -> Result<Arc<dyn SequenceModel>, ModelError> {
    Err(ModelError::Inference {
        model: "lstm".into(),
        reason: "built without the `lstm` feature".into(),
    })
}

fn artifact_error(path: &Path, reason: impl ToString) -> ModelError {
    ModelError::Artifact {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn read_artifact(path: &Path) -> Result<String, ModelError> {
    if !path.exists() {
        return Err(ModelError::NotFound(path.display().to_string()));
    }
    std::fs::read_to_string(path).map_err(|e| artifact_error(path, e))
}

/// Parse and validate a model artifact without building it.
pub fn read_model_artifact(path: &Path) -> Result<ModelArtifact, ModelError> {
    let content = read_artifact(path)?;
    let artifact: ModelArtifact =
        serde_json::from_str(&content).map_err(|e| artifact_error(path, e))?;
    artifact.validate().map_err(|e| artifact_error(path, e))?;
    Ok(artifact)
}

/// Load a model artifact and build its runtime.
pub fn load_model(path: &Path) -> Result<Arc<dyn SequenceModel>, ModelError> {
    let artifact = read_model_artifact(path)?;
    debug!(path = %path.display(), kind = artifact.kind(), "Loaded model artifact");
    artifact.into_model()
}

/// Load and validate a scaler artifact.
pub fn load_scaler(path: &Path) -> Result<MinMaxScaler, ModelError> {
    let content = read_artifact(path)?;
    let scaler: MinMaxScaler =
        serde_json::from_str(&content).map_err(|e| artifact_error(path, e))?;
    scaler.validate().map_err(|e| artifact_error(path, e))?;
    debug!(
        path = %path.display(),
        data_min = scaler.data_min,
        data_max = scaler.data_max,
        "Loaded scaler artifact"
    );
    Ok(scaler)
}
