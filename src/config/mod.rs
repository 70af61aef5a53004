pub mod types;

use crate::error::{ConfigError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".podmeter.toml";

/// Get the global config file path (~/.podmeter.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE_NAME))
}

/// Load configuration from an explicit file, the global file, or defaults.
///
/// Errors in an explicitly requested file are returned; a broken global file
/// is reported and skipped.
pub fn load_config(explicit: Option<&Path>) -> Result<types::Config> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    if let Some(global) = global_config_path()
        && global.exists()
    {
        match read_config(&global) {
            Ok(config) => return Ok(config),
            Err(e) => log::warn!("Ignoring {}: {}", global.display(), e),
        }
    }

    Ok(types::Config::default())
}

/// Read and parse a TOML config file.
pub fn read_config(path: &Path) -> Result<types::Config> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
        path: path.display().to_string(),
        source,
    })?;

    let config = toml::from_str(&content).map_err(|e| ConfigError::ParsingFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    log::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}
