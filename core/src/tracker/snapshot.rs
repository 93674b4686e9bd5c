//! Read-only view of the current fight, shaped for the serving layer.

use hashbrown::HashMap;
use serde::Serialize;

use super::personal::AnalyzedSkill;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub target_id: u32,
    pub target_name: String,
    /// Milliseconds, always at least 1 for a non-empty snapshot.
    pub battle_time: i64,
    pub total_damage: i64,
    pub map: HashMap<u32, AttackerSnapshot>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.target_id == 0
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackerSnapshot {
    pub nickname: String,
    pub job: String,
    pub dps: f64,
    /// Percent of the target's total damage.
    pub damage_contribution: f64,
    pub per_skill: HashMap<u32, AnalyzedSkill>,
}
