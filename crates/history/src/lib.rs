//! Glucose reading stores for Glucocast.

pub mod file_backend;
pub mod in_memory;

use std::sync::Arc;

use glucocast_config::AppConfig;
use glucocast_core::history::HistoryProvider;

pub use file_backend::FileHistory;
pub use in_memory::InMemoryHistory;

/// Build the configured history store.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn HistoryProvider> {
    match config.history.backend.as_str() {
        "memory" => Arc::new(InMemoryHistory::new()),
        _ => Arc::new(FileHistory::new(config.history_path())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_configured_backend() {
        let mut config = AppConfig::default();
        config.history.backend = "memory".into();
        assert_eq!(build_from_config(&config).name(), "in_memory");

        let dir = tempfile::tempdir().unwrap();
        config.history.backend = "file".into();
        config.history.path = Some(dir.path().join("readings.jsonl"));
        assert_eq!(build_from_config(&config).name(), "file");
    }
}
