//! Session wiring, configuration and the capture/consumer handoff.

mod chunk_queue;
mod config;
mod error;
mod session;

pub use chunk_queue::ChunkQueue;
pub use config::{boss_names_path, load_config, log_directory, save_config, APP_NAME};
pub use error::ConfigError;
pub use session::CaptureSession;
