// Configuration loading functionality
use crate::config::types::{AppConfig, ConfigError};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file, which takes
/// precedence over the search path.
pub const CONFIG_ENV: &str = "APUCTL_CONFIG";

/// Load the application configuration from the standard locations, falling
/// back to defaults when no file is found. A file that fails to parse or
/// validate is skipped with a warning so a broken config never takes the
/// tool down.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    for candidate in candidate_paths() {
        if candidate.exists() {
            match load_config_from_path(&candidate) {
                Ok(config) => {
                    debug!("loaded configuration from {}", candidate.display());
                    return Ok(config);
                }
                Err(e) => warn!("ignoring config {}: {e}", candidate.display()),
            }
        }
    }

    debug!("no configuration file found, using defaults");
    Ok(AppConfig::default())
}

/// Load and validate one specific configuration file.
pub fn load_config_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

/// First existing configuration file in the search order, if any.
pub fn existing_config_path() -> Option<PathBuf> {
    candidate_paths().into_iter().find(|p| p.exists())
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        paths.push(PathBuf::from(env_path));
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("apuctl/config.toml"));
    }
    paths.push(PathBuf::from("/etc/xdg/apuctl/config.toml"));
    paths.push(PathBuf::from("/etc/apuctl.toml"));
    paths
}
