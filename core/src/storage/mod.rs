//! Persisted combat logs.
//!
//! One JSON file per ISO week per recorder, holding an array of completed
//! fights. Records are append-only; the sweep writes a fight exactly once,
//! when its target is evicted.

mod error;
mod writer;

pub use error::StorageError;
pub use writer::LogWriter;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

pub const LOG_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRoot {
    pub meta: LogMeta,
    pub records: Vec<LogRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMeta {
    /// Epoch milliseconds of the fight's last hit.
    pub timestamp: i64,
    pub duration_ms: i64,
    pub target: LogTarget,
    pub recorder_id: String,
    pub version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogTarget {
    pub id: u32,
    pub code: u32,
    pub map_id: u32,
    pub name: String,
    pub total_damage: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub name: String,
    pub job: String,
    pub total_damage: i64,
    pub dps: f64,
    pub skills: HashMap<u32, LogSkill>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSkill {
    pub skill_name: String,
    pub damage_amount: i64,
    pub times: u64,
    pub crit_times: u64,
    pub perfect_times: u64,
    pub double_times: u64,
}
