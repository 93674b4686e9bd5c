//! Entity identity and combat aggregation.

mod aggregator;
mod entity;
mod event;
mod personal;
mod registry;
mod snapshot;
mod target_info;


pub use aggregator::CombatAggregator;
pub use entity::{GameEntity, Npc, Player, Summon};
pub use event::{now_ms, DamageEvent, SpecialFlags};
pub use personal::{AnalyzedSkill, PersonalData};
pub use registry::{EntityRegistry, COMBAT_WINDOW_MS};
pub use snapshot::{AttackerSnapshot, Snapshot};
pub use target_info::{TargetInfo, RECENT_CUTOFF_MS, RECENT_WINDOW_MS};
