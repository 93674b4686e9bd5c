//! Game entities observed on the wire.
//!
//! Ids are session-local and ephemeral: they identify an entity only for the
//! lifetime of the current observation session.

use crate::boss_names::BossNameStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: u32,
    pub name: String,
}

impl Player {
    pub fn new(id: u32) -> Self {
        // Placeholder until a nickname packet arrives
        Self {
            id,
            name: format!("User_{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Npc {
    pub id: u32,
    pub npc_code: u32,
    /// 0 until confirmed; confirmation happens only while the entity is in
    /// combat or at the moment it first takes damage.
    pub map_id: u32,
    pub is_boss: bool,
}

impl Npc {
    /// Stable key used by statistics and persistence instead of the runtime id.
    pub fn unique_key(&self) -> String {
        format!("{}_{}", self.npc_code, self.map_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summon {
    pub id: u32,
    /// Owning player's entity id; damage is attributed to the owner.
    pub owner_id: u32,
    pub npc_code: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEntity {
    Player(Player),
    Npc(Npc),
    Summon(Summon),
}

impl GameEntity {
    pub fn id(&self) -> u32 {
        match self {
            GameEntity::Player(p) => p.id,
            GameEntity::Npc(n) => n.id,
            GameEntity::Summon(s) => s.id,
        }
    }

    /// Display name for this entity.
    ///
    /// An Npc's name is never stored: it is derived from the boss-name store
    /// by (npc_code, map_id) at every lookup so late-arriving mappings apply
    /// immediately.
    pub fn display_name(&self, names: &BossNameStore) -> String {
        match self {
            GameEntity::Player(p) => p.name.clone(),
            GameEntity::Npc(n) => names
                .get(n.npc_code, n.map_id)
                .unwrap_or_else(|| format!("Mob_{}", n.npc_code)),
            GameEntity::Summon(s) => format!("Summon_{}", s.npc_code),
        }
    }

    /// Apply a name to this entity.
    ///
    /// Only players carry a stored name. For an Npc this is an intentional
    /// no-op (the boss-name store is the single source of its name), and a
    /// Summon's name is always derived from its npc code.
    pub fn set_name(&mut self, name: &str) {
        if let GameEntity::Player(p) = self {
            p.name = name.to_string();
        }
    }

    pub fn as_npc(&self) -> Option<&Npc> {
        match self {
            GameEntity::Npc(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_summon(&self) -> Option<&Summon> {
        match self {
            GameEntity::Summon(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, GameEntity::Player(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn npc_name_writes_are_ignored() {
        let mut e = GameEntity::Npc(Npc {
            id: 7,
            npc_code: 1234,
            map_id: 0,
            is_boss: false,
        });
        e.set_name("should not stick");
        let names = BossNameStore::in_memory();
        assert_eq!(e.display_name(&names), "Mob_1234");
    }

    #[test]
    fn player_name_defaults_until_nickname() {
        let mut e = GameEntity::Player(Player::new(42));
        let names = BossNameStore::in_memory();
        assert_eq!(e.display_name(&names), "User_42");
        e.set_name("Karin");
        assert_eq!(e.display_name(&names), "Karin");
    }
}
