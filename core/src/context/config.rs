//! Configuration loading and data-directory layout.

use std::path::PathBuf;

use tracing::info;
use uuid::Uuid;

use super::error::ConfigError;
use a2meter_types::AppConfig;

pub const APP_NAME: &str = "a2meter";

/// Load the persisted configuration, provisioning a recorder id on first
/// launch. The id is stamped into every persisted log and must stay stable,
/// so it is generated exactly once and written straight back.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut config: AppConfig = confy::load(APP_NAME, None)?;
    if config.recorder_id.is_empty() {
        config.recorder_id = new_recorder_id();
        info!(recorder_id = %config.recorder_id, "provisioned recorder id");
        confy::store(APP_NAME, None, &config)?;
    }
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    confy::store(APP_NAME, None, config)?;
    Ok(())
}

fn new_recorder_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Directory for weekly combat logs: the configured one, or a per-user data
/// directory.
pub fn log_directory(config: &AppConfig) -> Result<PathBuf, ConfigError> {
    if !config.log_directory.is_empty() {
        return Ok(PathBuf::from(&config.log_directory));
    }
    Ok(data_directory()?.join("logs"))
}

pub fn boss_names_path() -> Result<PathBuf, ConfigError> {
    Ok(data_directory()?.join("boss_names.json"))
}

fn data_directory() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_NAME))
        .ok_or(ConfigError::NoDataDir)
}
