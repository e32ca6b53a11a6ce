//! `glucocast config`: configuration management commands.

use std::path::Path;

pub async fn validate(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match super::load_config(config_path) {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();

            if config.model.path.is_none() {
                warnings.push("No model.path set; forecasts use the drift baseline".to_string());
            }

            if let Some(path) = config.model.path.as_ref().filter(|p| !p.exists()) {
                warnings.push(format!("Model artifact not found: {}", path.display()));
            }

            if let Some(path) = config.model.scaler_path.as_ref().filter(|p| !p.exists()) {
                warnings.push(format!("Scaler artifact not found: {}", path.display()));
            }

            if config.model.path.is_some() && config.model.scaler_path.is_none() {
                warnings.push("model.path is set without model.scaler_path".to_string());
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!(
                "   Model:     {}",
                config
                    .model
                    .path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "drift".into())
            );
            println!("   Noise:     {}", if config.noise.enabled { "on" } else { "off" });
            println!("   History:   {}", config.history.backend);
            println!("   Timeout:   {} ms", config.forecast.timeout_ms);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e);
        }
    }

    Ok(())
}

pub async fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", super::config_file(config_path).display());
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn config_path_is_valid() {
        let path = super::super::config_file(None);
        assert!(path.to_str().unwrap().contains("config.toml"));
    }

    #[test]
    fn effective_config_round_trips_through_toml() {
        let config = glucocast_config::AppConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: glucocast_config::AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.forecast.history_limit, config.forecast.history_limit);
    }
}
