//! Identity store for everything observed on the wire.
//!
//! The registry owns entity records, per-entity last-damage timestamps, the
//! current map id and the current display target. Lookups take a read lock;
//! each upsert is one write-lock critical section so concurrent snapshot
//! readers never see a half-applied update.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use hashbrown::HashMap;
use tracing::debug;

use super::entity::{GameEntity, Npc, Player, Summon};
use crate::boss_names::BossNameStore;
use a2meter_types::MeterConfig;

/// An entity is "in combat" while its last damage is at most this old.
pub const COMBAT_WINDOW_MS: i64 = 12_000;

pub struct EntityRegistry {
    entities: RwLock<HashMap<u32, GameEntity>>,
    last_damage_ms: RwLock<HashMap<u32, i64>>,
    current_map: AtomicU32,
    /// 0 means no display target.
    current_target: AtomicU32,
    names: Arc<BossNameStore>,
    guard_min_old_len: usize,
    guard_max_new_len: usize,
}

impl EntityRegistry {
    pub fn new(names: Arc<BossNameStore>, config: &MeterConfig) -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            last_damage_ms: RwLock::new(HashMap::new()),
            current_map: AtomicU32::new(0),
            current_target: AtomicU32::new(0),
            names,
            guard_min_old_len: config.nickname_guard_min_old_len,
            guard_max_new_len: config.nickname_guard_max_new_len,
        }
    }

    pub fn boss_names(&self) -> &BossNameStore {
        &self.names
    }

    pub fn current_map(&self) -> u32 {
        self.current_map.load(Ordering::Acquire)
    }

    pub fn set_current_map(&self, map_id: u32) {
        self.current_map.store(map_id, Ordering::Release);
    }

    /// Current display target, if any.
    pub fn current_target(&self) -> Option<u32> {
        match self.current_target.load(Ordering::Acquire) {
            0 => None,
            id => Some(id),
        }
    }

    pub fn set_current_target(&self, id: u32) {
        self.current_target.store(id, Ordering::Release);
    }

    pub fn clear_current_target(&self) {
        self.current_target.store(0, Ordering::Release);
    }

    pub fn get(&self, id: u32) -> Option<GameEntity> {
        self.entities.read().ok()?.get(&id).cloned()
    }

    pub fn display_name(&self, id: u32) -> String {
        match self.get(id) {
            Some(entity) => entity.display_name(&self.names),
            None => format!("User_{id}"),
        }
    }

    /// Nickname observation. Creates a Player for unknown ids; for a known
    /// Player the name is applied unless it would shrink an established name
    /// to near-nothing, which in practice means a corrupt read. Npc and
    /// Summon records ignore nicknames entirely.
    pub fn on_nickname(&self, id: u32, name: &str) {
        let Ok(mut entities) = self.entities.write() else {
            return;
        };
        if let Some(entity) = entities.get_mut(&id) {
            if let GameEntity::Player(p) = entity {
                if p.name == name {
                    return;
                }
                if p.name.chars().count() >= self.guard_min_old_len
                    && name.chars().count() <= self.guard_max_new_len
                {
                    debug!(id, old = %p.name, new = name, "nickname downgrade rejected");
                    return;
                }
                p.name = name.to_string();
            }
            return;
        }
        entities.insert(
            id,
            GameEntity::Player(Player {
                id,
                name: name.to_string(),
            }),
        );
    }

    /// Spawn observation with a confirmed npc code.
    ///
    /// The map id sticks only while the entity is fighting; idle spawns get 0
    /// and are confirmed later by `note_damage`. Any prior record under this
    /// id is replaced, including a Player record left over from id reuse.
    pub fn on_npc_observed(&self, id: u32, npc_code: u32) {
        let now = super::event::now_ms();
        let in_combat = self.in_combat(id, now);
        let current_map = self.current_map();
        let Ok(mut entities) = self.entities.write() else {
            return;
        };
        if let Some(GameEntity::Npc(npc)) = entities.get_mut(&id) {
            npc.npc_code = npc_code;
            if in_combat && current_map != 0 && npc.map_id != current_map {
                npc.map_id = current_map;
            }
            npc.is_boss = self.names.contains(npc.npc_code, npc.map_id);
            return;
        }
        let map_id = if in_combat { current_map } else { 0 };
        entities.insert(
            id,
            GameEntity::Npc(Npc {
                id,
                npc_code,
                map_id,
                is_boss: self.names.contains(npc_code, map_id),
            }),
        );
    }

    /// Summon observation. Never clobbers an existing Player record; a
    /// summon frame reusing a player's id is a stale read.
    pub fn on_summon_observed(&self, id: u32, owner_id: u32, npc_code: u32) {
        let Ok(mut entities) = self.entities.write() else {
            return;
        };
        if let Some(GameEntity::Summon(s)) = entities.get_mut(&id) {
            s.owner_id = owner_id;
            s.npc_code = npc_code;
            return;
        }
        if matches!(entities.get(&id), Some(GameEntity::Player(_))) {
            return;
        }
        entities.insert(
            id,
            GameEntity::Summon(Summon {
                id,
                owner_id,
                npc_code,
            }),
        );
    }

    /// Record damage against `target_id` at `now_ms` and confirm a pending
    /// map id: first damage pins an Npc spawned with map 0 to the current
    /// map, combat window or not.
    pub fn note_damage(&self, target_id: u32, now_ms: i64) {
        if let Ok(mut stamps) = self.last_damage_ms.write() {
            stamps.insert(target_id, now_ms);
        }
        let current_map = self.current_map();
        if current_map == 0 {
            return;
        }
        let Ok(mut entities) = self.entities.write() else {
            return;
        };
        if let Some(GameEntity::Npc(npc)) = entities.get_mut(&target_id) {
            if npc.map_id == 0 {
                npc.map_id = current_map;
                npc.is_boss = self.names.contains(npc.npc_code, npc.map_id);
            }
        }
    }

    pub fn in_combat(&self, id: u32, now_ms: i64) -> bool {
        let Ok(stamps) = self.last_damage_ms.read() else {
            return false;
        };
        stamps
            .get(&id)
            .is_some_and(|&last| now_ms - last <= COMBAT_WINDOW_MS)
    }

    pub fn last_damage(&self, id: u32) -> Option<i64> {
        self.last_damage_ms.read().ok()?.get(&id).copied()
    }

    pub fn remove(&self, id: u32) {
        if let Ok(mut entities) = self.entities.write() {
            entities.remove(&id);
        }
        if let Ok(mut stamps) = self.last_damage_ms.write() {
            stamps.remove(&id);
        }
        if self.current_target() == Some(id) {
            self.clear_current_target();
        }
    }

    /// Fresh observation session: drop all records and combat state.
    pub fn reset(&self) {
        if let Ok(mut entities) = self.entities.write() {
            entities.clear();
        }
        if let Ok(mut stamps) = self.last_damage_ms.write() {
            stamps.clear();
        }
        self.current_map.store(0, Ordering::Release);
        self.clear_current_target();
    }
}
