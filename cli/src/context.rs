use std::sync::Arc;

use a2meter_core::context::{load_config, ConfigError};
use a2meter_core::CaptureSession;
use a2meter_types::AppConfig;
use tokio::sync::RwLock;

/// Holds all shared state for the CLI application.
/// This is a lightweight container - logic lives in the session types.
#[derive(Clone)]
pub struct CliContext {
    pub config: Arc<RwLock<AppConfig>>,
    pub session: Arc<CaptureSession>,
}

impl CliContext {
    pub fn new() -> Result<Self, ConfigError> {
        let config = load_config()?;
        let mut session = CaptureSession::new(&config)?;
        session.start();
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            session: Arc::new(session),
        })
    }
}
