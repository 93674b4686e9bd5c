//! Real-time combat aggregation: per-target totals, per-attacker breakdowns,
//! display-target selection and the idle sweep.

use std::sync::{Arc, RwLock};

use hashbrown::HashMap;
use tracing::{error, info};

use super::entity::GameEntity;
use super::event::DamageEvent;
use super::personal::PersonalData;
use super::registry::EntityRegistry;
use super::snapshot::{AttackerSnapshot, Snapshot};
use super::target_info::TargetInfo;
use crate::game_data::SkillCatalog;
use crate::storage::{LogMeta, LogRecord, LogRoot, LogSkill, LogTarget, LogWriter, LOG_FORMAT_VERSION};
use a2meter_types::MeterConfig;

pub struct CombatAggregator {
    registry: Arc<EntityRegistry>,
    catalog: Arc<dyn SkillCatalog>,
    writer: LogWriter,
    targets: RwLock<HashMap<u32, TargetInfo>>,
    /// target id -> attacker id -> accumulation
    personal: RwLock<HashMap<u32, HashMap<u32, PersonalData>>>,
    idle_timeout_ms: i64,
    min_battle_ms: i64,
}

impl CombatAggregator {
    pub fn new(
        registry: Arc<EntityRegistry>,
        catalog: Arc<dyn SkillCatalog>,
        writer: LogWriter,
        config: &MeterConfig,
    ) -> Self {
        Self {
            registry,
            catalog,
            writer,
            targets: RwLock::new(HashMap::new()),
            personal: RwLock::new(HashMap::new()),
            idle_timeout_ms: config.idle_timeout_ms,
            min_battle_ms: config.min_battle_duration_ms,
        }
    }

    pub fn registry(&self) -> &Arc<EntityRegistry> {
        &self.registry
    }

    pub fn on_damage(&self, event: &DamageEvent) {
        self.registry.note_damage(event.target_id, event.timestamp_ms);

        let applied = match self.targets.write() {
            Ok(mut targets) => targets.entry(event.target_id).or_default().apply(event),
            Err(_) => return,
        };
        if !applied {
            return;
        }

        // Summon damage is the owner's damage.
        let attacker_id = match self.registry.get(event.actor_id) {
            Some(GameEntity::Summon(s)) => s.owner_id,
            _ => event.actor_id,
        };
        let nickname = self.registry.display_name(attacker_id);
        if let Ok(mut personal) = self.personal.write() {
            let data = personal
                .entry(event.target_id)
                .or_default()
                .entry(attacker_id)
                .or_insert_with(|| PersonalData::new(nickname.clone()));
            // A late nickname packet still corrects earlier placeholder names
            data.nickname = nickname;
            data.apply(event, self.catalog.as_ref());
        }

        self.select_target(event.target_id, event.timestamp_ms);
    }

    /// Possibly switch the display target to `candidate`.
    ///
    /// Players and summons are never displayed. An incumbent keeps the slot
    /// unless the candidate's recent damage is strictly higher; an exact tie
    /// goes to the candidate only when it is a boss and the incumbent is not.
    fn select_target(&self, candidate: u32, now_ms: i64) {
        let Some(GameEntity::Npc(candidate_npc)) = self.registry.get(candidate) else {
            return;
        };
        let Some(current) = self.registry.current_target() else {
            self.registry.set_current_target(candidate);
            return;
        };
        if current == candidate {
            return;
        }
        let Ok(targets) = self.targets.read() else {
            return;
        };
        let (Some(current_info), Some(candidate_info)) =
            (targets.get(&current), targets.get(&candidate))
        else {
            drop(targets);
            self.registry.set_current_target(candidate);
            return;
        };
        let current_recent = current_info.recent_damage(now_ms);
        let candidate_recent = candidate_info.recent_damage(now_ms);
        drop(targets);

        if candidate_recent > current_recent {
            self.registry.set_current_target(candidate);
        } else if candidate_recent == current_recent && candidate_npc.is_boss {
            let current_is_boss = self
                .registry
                .get(current)
                .and_then(|e| e.as_npc().map(|n| n.is_boss))
                .unwrap_or(false);
            if !current_is_boss {
                self.registry.set_current_target(candidate);
            }
        }
    }

    /// Snapshot of the current display target. Attackers whose class is still
    /// unknown keep accumulating but are left out of the view.
    pub fn snapshot(&self) -> Snapshot {
        let Some(target_id) = self.registry.current_target() else {
            return Snapshot::default();
        };
        let (battle_time, total_damage) = {
            let Ok(targets) = self.targets.read() else {
                return Snapshot::default();
            };
            let Some(info) = targets.get(&target_id) else {
                return Snapshot::default();
            };
            (info.battle_time_ms(), info.total_damage)
        };

        let mut map = HashMap::new();
        if let Ok(personal) = self.personal.read() {
            if let Some(attackers) = personal.get(&target_id) {
                for (&attacker_id, data) in attackers {
                    let Some(job) = data.job else { continue };
                    let contribution = if total_damage > 0 {
                        data.cumulative_damage as f64 / total_damage as f64 * 100.0
                    } else {
                        0.0
                    };
                    map.insert(
                        attacker_id,
                        AttackerSnapshot {
                            nickname: data.nickname.clone(),
                            job: job.to_string(),
                            dps: data.cumulative_damage as f64 / battle_time as f64 * 1000.0,
                            damage_contribution: contribution,
                            per_skill: data.per_skill.clone(),
                        },
                    );
                }
            }
        }

        Snapshot {
            target_id,
            target_name: self.registry.display_name(target_id),
            battle_time,
            total_damage,
            map,
        }
    }

    /// Idle sweep, polled by the session timer. Every target quiet past the
    /// idle timeout is evicted; fights that lasted long enough against a
    /// confirmed boss are persisted first.
    pub fn sweep_idle(&self, now_ms: i64) {
        let idle: Vec<(u32, i64, i64, i64)> = match self.targets.read() {
            Ok(targets) => targets
                .iter()
                .filter(|(_, info)| now_ms - info.last_hit_ms > self.idle_timeout_ms)
                .map(|(&id, info)| {
                    (id, info.battle_time_ms(), info.total_damage, info.last_hit_ms)
                })
                .collect(),
            Err(_) => return,
        };

        for (id, battle_time, total_damage, last_hit_ms) in idle {
            if battle_time >= self.min_battle_ms {
                if let Some(npc) = self.registry.get(id).and_then(|e| e.as_npc().cloned()) {
                    if npc.npc_code != 0 && npc.map_id != 0 {
                        let root =
                            self.build_log_root(id, battle_time, total_damage, last_hit_ms);
                        match self.writer.append(root) {
                            Ok(()) => info!(target = id, battle_time, "fight persisted"),
                            Err(err) => error!(target = id, error = %err, "failed to persist fight"),
                        }
                    }
                }
            }
            if let Ok(mut targets) = self.targets.write() {
                targets.remove(&id);
            }
            if let Ok(mut personal) = self.personal.write() {
                personal.remove(&id);
            }
            self.registry.remove(id);
        }
    }

    fn build_log_root(
        &self,
        target_id: u32,
        battle_time: i64,
        total_damage: i64,
        last_hit_ms: i64,
    ) -> LogRoot {
        let (code, map_id) = self
            .registry
            .get(target_id)
            .and_then(|e| e.as_npc().map(|n| (n.npc_code, n.map_id)))
            .unwrap_or((0, 0));

        let mut records = Vec::new();
        if let Ok(personal) = self.personal.read() {
            if let Some(attackers) = personal.get(&target_id) {
                for data in attackers.values() {
                    let Some(job) = data.job else { continue };
                    let skills = data
                        .per_skill
                        .iter()
                        .map(|(&skill_code, s)| {
                            (
                                skill_code,
                                LogSkill {
                                    skill_name: s.display_name.clone(),
                                    damage_amount: s.damage_amount + s.dot_damage_amount,
                                    times: s.times,
                                    crit_times: s.crit_times,
                                    perfect_times: s.perfect_times,
                                    double_times: s.double_times,
                                },
                            )
                        })
                        .collect();
                    records.push(LogRecord {
                        name: data.nickname.clone(),
                        job: job.to_string(),
                        total_damage: data.cumulative_damage,
                        dps: data.cumulative_damage as f64 / battle_time as f64 * 1000.0,
                        skills,
                    });
                }
            }
        }

        LogRoot {
            meta: LogMeta {
                timestamp: last_hit_ms,
                duration_ms: battle_time,
                target: LogTarget {
                    id: target_id,
                    code,
                    map_id,
                    name: self.registry.display_name(target_id),
                    total_damage,
                },
                recorder_id: self.writer.recorder_id().to_string(),
                version: LOG_FORMAT_VERSION,
            },
            records,
        }
    }

    /// Fresh observation session: drop every accumulator and entity record.
    pub fn reset(&self) {
        if let Ok(mut targets) = self.targets.write() {
            targets.clear();
        }
        if let Ok(mut personal) = self.personal.write() {
            personal.clear();
        }
        self.registry.reset();
    }
}
