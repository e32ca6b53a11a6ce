//! `glucocast status`: show configuration and model status.

use std::path::Path;

use glucocast_config::AppConfig;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let file = super::config_file(config_path);

    let model = match &config.model.path {
        Some(path) => path.display().to_string(),
        None => "drift baseline (no artifact configured)".into(),
    };
    let noise = if !config.noise.enabled {
        "disabled".to_string()
    } else if let Some(seed) = config.noise.seed {
        format!("factor {} (seed {seed})", config.noise.factor)
    } else {
        format!("factor {}", config.noise.factor)
    };
    let timeout = if config.forecast.timeout_ms == 0 {
        "none".to_string()
    } else {
        format!("{} ms", config.forecast.timeout_ms)
    };

    println!("Glucocast Status");
    println!("================");
    println!("  Config dir:     {}", AppConfig::config_dir().display());
    println!("  Model:          {model}");
    println!(
        "  Drift fallback: {}",
        if config.model.fallback_to_drift { "enabled" } else { "disabled" }
    );
    println!(
        "  User models:    {}",
        config
            .model
            .user_model_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "none".into())
    );
    println!("  Noise:          {noise}");
    println!("  Deadline:       {timeout}");
    println!("  History limit:  {}", config.forecast.history_limit);
    println!("  History store:  {}", config.history.backend);
    if config.history.backend == "file" {
        println!("  History file:   {}", config.history_path().display());
    }

    match glucocast_models::build_from_config(&config) {
        Ok(registry) => {
            let handle = registry.default_handle();
            let scaler = handle.scaler();
            println!(
                "\n  ✅ Model '{}' loaded (window {}, scaler {}..{})",
                handle.name(),
                handle.model().window_len(),
                scaler.data_min,
                scaler.data_max
            );
        }
        Err(e) => println!("\n  ❌ Model failed to load: {e}"),
    }

    if file.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file; run `glucocast onboard` first");
    }

    Ok(())
}
