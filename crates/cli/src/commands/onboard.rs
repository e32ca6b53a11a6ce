//! `glucocast onboard`: first-time setup.

use glucocast_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");
    let history_path = AppConfig::default_history_path();

    println!("Glucocast First-Time Setup");
    println!("==========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if let Some(history_dir) = history_path.parent() {
        if !history_dir.exists() {
            std::fs::create_dir_all(history_dir)?;
            println!("✅ Created history directory: {}", history_dir.display());
        }
    }

    let models_dir = config_dir.join("models");
    if !models_dir.exists() {
        std::fs::create_dir_all(&models_dir)?;
        println!("✅ Created models directory: {}", models_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!(
            "   1. Put model and scaler artifacts in {} and set [model] in config.toml",
            models_dir.display()
        );
        println!("   2. Run: glucocast record --user <id> --value <mg/dL>");
        println!("   3. Run: glucocast forecast --user <id> --analysis --pretty\n");
    }

    println!("🎉 Setup complete! Run `glucocast doctor` to check everything.\n");

    Ok(())
}
