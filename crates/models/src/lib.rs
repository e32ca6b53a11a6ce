//! Sequence model runtimes for Glucocast.
//!
//! All models implement `glucocast_core::SequenceModel`. The registry builds
//! the deployment's default handle from configuration and resolves per-user
//! handles on demand.

pub mod artifact;
pub mod drift;
pub mod fallback;
pub mod linear;
pub mod lstm;
pub mod registry;

pub use artifact::{ModelArtifact, load_model, load_scaler, read_model_artifact};
pub use drift::DriftModel;
pub use fallback::FallbackModel;
pub use linear::{LinearModel, LinearWeights};
pub use lstm::LstmWeights;
#[cfg(feature = "lstm")]
pub use lstm::LstmModel;
pub use registry::{ModelRegistry, build_from_config, user_artifact_paths};
