//! `glucocast doctor`: diagnose setup problems.

use std::path::Path;

use glucocast_config::AppConfig;
use glucocast_forecast::Forecaster;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Glucocast Doctor");
    println!("===================\n");

    let mut issues = 0;

    let file = super::config_file(config_path);
    let config = if file.exists() {
        match super::load_config(config_path) {
            Ok(config) => {
                println!("  ✅ Config file valid");
                config
            }
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                println!("\n  ⚠️  Fix the config file and re-run doctor.");
                return Ok(());
            }
        }
    } else {
        println!("  ⚠️  No config file; using defaults (run `glucocast onboard`)");
        issues += 1;
        AppConfig::default()
    };

    // Model artifacts
    let registry = match glucocast_models::build_from_config(&config) {
        Ok(registry) => {
            println!("  ✅ Model '{}' loads", registry.default_handle().name());
            Some(registry)
        }
        Err(e) => {
            println!("  ❌ Model failed to load: {e}");
            issues += 1;
            None
        }
    };

    if config.model.path.is_none() {
        println!("  ⚠️  No trained model configured; forecasts use the drift baseline");
        issues += 1;
    }

    if let Some(dir) = &config.model.user_model_dir {
        if dir.is_dir() {
            println!("  ✅ User model directory exists");
        } else {
            println!("  ⚠️  User model directory missing: {}", dir.display());
            issues += 1;
        }
    }

    // Health probe
    if let Some(registry) = &registry {
        let report = Forecaster::from_config(registry.default_handle(), &config).health_check();
        if report.test_prediction_success {
            println!("  ✅ Health probe forecast succeeded");
        } else {
            println!(
                "  ❌ Health probe failed: {}",
                report.error.as_deref().unwrap_or("unknown error")
            );
            issues += 1;
        }
    }

    // History store
    if config.history.backend == "file" {
        let path = config.history_path();
        match path.parent() {
            Some(parent) if parent.is_dir() => println!("  ✅ History directory exists"),
            _ => {
                println!(
                    "  ⚠️  History directory missing for {} (created on first record)",
                    path.display()
                );
                issues += 1;
            }
        }
    } else {
        println!("  ⚠️  In-memory history store; readings are lost on exit");
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
