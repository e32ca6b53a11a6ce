pub mod config_cmd;
pub mod doctor;
pub mod forecast;
pub mod health;
pub mod onboard;
pub mod record;
pub mod status;

use std::path::{Path, PathBuf};

use glucocast_config::AppConfig;

/// The config file in effect: the `--config` override or the default path.
pub fn config_file(override_path: Option<&Path>) -> PathBuf {
    override_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Load the default config (with env overrides) or an explicit file.
pub fn load_config(override_path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    match override_path {
        Some(path) if !path.exists() => {
            Err(format!("Config file not found: {}", path.display()).into())
        }
        Some(path) => Ok(AppConfig::load_from(path)?),
        None => Ok(AppConfig::load()?),
    }
}
