use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

const APP_NAME: &str = "minidex";
const CONFIG_FILE: &str = "config.toml";
const VOCABULARY_FILE: &str = "vocabulary.txt";

/// Get the application data directory (created on demand)
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)
        .with_context(|| format!("Failed to create {}", app_dir.display()))?;
    Ok(app_dir)
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_app_data_dir()?.join(CONFIG_FILE))
}

/// Default location of the vocabulary snapshot
pub fn default_vocabulary_path() -> PathBuf {
    get_app_data_dir()
        .map(|dir| dir.join(VOCABULARY_FILE))
        .unwrap_or_else(|_| std::env::temp_dir().join(APP_NAME).join(VOCABULARY_FILE))
}
