use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load or store configuration")]
    Confy(#[from] confy::ConfyError),

    #[error("no platform data directory available")]
    NoDataDir,
}
