//! Model registry: resolves the model a request should run with.
//!
//! Holds the deployment's default handle and loads per-user artifacts on
//! demand from a configured directory:
//!
//! ```text
//! <user_model_dir>/glucose_predictor_user_{id}.json
//! <user_model_dir>/scaler_user_{id}.json
//! ```
//!
//! Loaded user handles are cached. A user without artifacts, or whose
//! artifacts fail to load, gets the default handle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use glucocast_config::AppConfig;
use glucocast_core::error::ModelError;
use glucocast_core::model::{ModelHandle, SequenceModel};
use glucocast_core::scaler::MinMaxScaler;
use tracing::{debug, info, warn};

use crate::artifact::{load_model, load_scaler};
use crate::drift::DriftModel;
use crate::fallback::FallbackModel;

#[derive(Debug)]
pub struct ModelRegistry {
    default: ModelHandle,
    user_dir: Option<PathBuf>,
    fallback_to_drift: bool,
    cache: RwLock<HashMap<String, ModelHandle>>,
}

impl ModelRegistry {
    /// Create a registry that serves `default` to everyone.
    pub fn new(default: ModelHandle) -> Self {
        Self {
            default,
            user_dir: None,
            fallback_to_drift: false,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Look for per-user artifacts in `dir`.
    pub fn with_user_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_dir = Some(dir.into());
        self
    }

    /// Chain a drift baseline behind every user model loaded from disk.
    pub fn with_drift_fallback(mut self, enabled: bool) -> Self {
        self.fallback_to_drift = enabled;
        self
    }

    /// The deployment-wide handle.
    pub fn default_handle(&self) -> ModelHandle {
        self.default.clone()
    }

    pub fn user_dir(&self) -> Option<&Path> {
        self.user_dir.as_deref()
    }

    /// Resolve the handle for `user_id`, or the default when `None`.
    pub fn resolve(&self, user_id: Option<&str>) -> ModelHandle {
        match user_id {
            Some(id) => self.resolve_user(id),
            None => self.default_handle(),
        }
    }

    fn resolve_user(&self, user_id: &str) -> ModelHandle {
        let Some(dir) = self.user_dir.as_deref() else {
            return self.default_handle();
        };

        if !is_safe_user_id(user_id) {
            warn!(user = user_id, "Rejected user id for model lookup, using default model");
            return self.default_handle();
        }

        if let Some(handle) = self.cached(user_id) {
            return handle;
        }

        let (model_path, scaler_path) = user_artifact_paths(dir, user_id);
        if !model_path.exists() || !scaler_path.exists() {
            debug!(user = user_id, "No user model artifacts, using default model");
            return self.default_handle();
        }

        match self.load_user(&model_path, &scaler_path) {
            Ok(handle) => {
                info!(user = user_id, model = handle.name(), "Loaded user model");
                if let Ok(mut cache) = self.cache.write() {
                    cache.insert(user_id.to_string(), handle.clone());
                }
                handle
            }
            Err(e) => {
                warn!(user = user_id, error = %e, "Failed to load user model, using default model");
                self.default_handle()
            }
        }
    }

    fn cached(&self, user_id: &str) -> Option<ModelHandle> {
        self.cache.read().ok()?.get(user_id).cloned()
    }

    fn load_user(&self, model_path: &Path, scaler_path: &Path) -> Result<ModelHandle, ModelError> {
        let model = load_model(model_path)?;
        let scaler = load_scaler(scaler_path)?;
        Ok(ModelHandle::new(
            with_fallback(model, self.fallback_to_drift),
            scaler,
        ))
    }

    /// Drop a cached user handle so the next request reloads it from disk.
    pub fn invalidate(&self, user_id: &str) -> bool {
        self.cache
            .write()
            .map(|mut cache| cache.remove(user_id).is_some())
            .unwrap_or(false)
    }

    /// User ids with a cached handle.
    pub fn cached_users(&self) -> Vec<String> {
        self.cache
            .read()
            .map(|cache| cache.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Artifact paths for one user.
pub fn user_artifact_paths(dir: &Path, user_id: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("glucose_predictor_user_{user_id}.json")),
        dir.join(format!("scaler_user_{user_id}.json")),
    )
}

/// User ids become part of a file name.
fn is_safe_user_id(user_id: &str) -> bool {
    !user_id.is_empty()
        && user_id.len() <= 64
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn with_fallback(model: Arc<dyn SequenceModel>, enabled: bool) -> Arc<dyn SequenceModel> {
    if !enabled || model.name() == "drift" {
        return model;
    }
    let name = model.name().to_string();
    Arc::new(
        FallbackModel::new(name)
            .add(model)
            .add(Arc::new(DriftModel::default())),
    )
}

/// Build the registry from configuration.
///
/// Without `model.path` the default handle is the drift baseline over the
/// physiological range. A configured model whose scaler is missing is an
/// error: the pair must come from the same training run.
pub fn build_from_config(config: &AppConfig) -> Result<ModelRegistry, ModelError> {
    let model_cfg = &config.model;

    let default = match &model_cfg.path {
        Some(path) => {
            let model = load_model(path)?;
            let scaler = match &model_cfg.scaler_path {
                Some(scaler_path) => load_scaler(scaler_path)?,
                None => {
                    return Err(ModelError::Artifact {
                        path: path.display().to_string(),
                        reason: "model.scaler_path is required alongside model.path".into(),
                    });
                }
            };
            info!(model = model.name(), path = %path.display(), "Loaded default model");
            ModelHandle::new(with_fallback(model, model_cfg.fallback_to_drift), scaler)
        }
        None => {
            debug!("No model artifact configured, using drift baseline");
            ModelHandle::new(Arc::new(DriftModel::default()), MinMaxScaler::default())
        }
    };

    let mut registry = ModelRegistry::new(default).with_drift_fallback(model_cfg.fallback_to_drift);
    if let Some(dir) = &model_cfg.user_model_dir {
        registry = registry.with_user_dir(dir);
    }
    Ok(registry)
}
