//! Shared configuration types for a2meter
//!
//! This crate contains serializable configuration types that are shared between
//! the capture core (a2meter-core) and the front-end binaries.

use serde::{Deserialize, Serialize};

/// Maximum player nickname length accepted from the wire.
pub const MAX_NICKNAME_LEN: usize = 72;

/// Top-level application configuration, persisted via confy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Stable per-installation id stamped into persisted combat logs.
    /// Generated on first launch and never regenerated.
    pub recorder_id: String,
    /// Directory where weekly combat log files are written.
    /// Empty means "use the platform data dir".
    pub log_directory: String,
    pub capture: CaptureConfig,
    pub meter: MeterConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recorder_id: String::new(),
            log_directory: String::new(),
            capture: CaptureConfig::default(),
            meter: MeterConfig::default(),
        }
    }
}

/// Settings for the packet capture collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Substring match against device name/description; overrides auto-detection.
    pub device_keyword: Option<String>,
    /// Network of the game server, used to build the capture filter.
    pub server_net: String,
    pub server_port: u16,
    /// Size of the raw chunks handed to the pipeline, in bytes.
    pub snapshot_size: usize,
    /// Bounded chunk queue between capture and the consumer thread.
    /// On overflow the oldest chunk is dropped; the producer never blocks.
    pub queue_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_keyword: None,
            server_net: String::new(),
            server_port: 0,
            snapshot_size: 65_536,
            queue_capacity: 4_096,
        }
    }
}

/// Tunables for the aggregation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    /// Reassembly ring buffer capacity in bytes.
    pub ring_capacity: usize,
    /// A target idle for longer than this is swept (saved and/or evicted).
    pub idle_timeout_ms: i64,
    /// Fights shorter than this are evicted without being persisted.
    pub min_battle_duration_ms: i64,
    /// Nickname downgrade guard: an existing name of at least this many
    /// characters is never overwritten by one of `nickname_guard_max_new_len`
    /// or fewer. Short legitimate names exist, so this stays configurable.
    pub nickname_guard_min_old_len: usize,
    pub nickname_guard_max_new_len: usize,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            ring_capacity: 10 * 1024 * 1024,
            idle_timeout_ms: 60_000,
            min_battle_duration_ms: 30_000,
            nickname_guard_min_old_len: 3,
            nickname_guard_max_new_len: 2,
        }
    }
}
