//! Name store for NPCs and bosses, keyed by (npc_code, map_id).
//!
//! Runtime entity ids are ephemeral, so display names and persisted logs key
//! on the stable `"code_mapId"` pair instead. Lookups fall back to the
//! map-independent `"code_0"` entry so older mappings stay usable.
//!
//! The store is an injected collaborator (no process-wide singleton): the
//! registry and aggregator receive it as an `Arc`.

use std::path::PathBuf;
use std::sync::RwLock;

use hashbrown::HashMap;
use tracing::{error, warn};

pub struct BossNameStore {
    path: Option<PathBuf>,
    mapping: RwLock<HashMap<String, String>>,
}

impl BossNameStore {
    /// Load the mapping file, tolerating a missing or corrupt file by
    /// starting empty. The app must come up either way.
    pub fn load(path: PathBuf) -> Self {
        let mapping = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<HashMap<String, String>>(&content) {
                Ok(m) => m,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "boss mapping file corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path: Some(path),
            mapping: RwLock::new(mapping),
        }
    }

    /// Store without a backing file, for tests and dry runs.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            mapping: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, npc_code: u32, map_id: u32) -> Option<String> {
        let Ok(m) = self.mapping.read() else {
            return None;
        };
        if let Some(name) = m.get(&make_key(npc_code, map_id)) {
            return Some(name.clone());
        }
        m.get(&make_key(npc_code, 0)).cloned()
    }

    pub fn contains(&self, npc_code: u32, map_id: u32) -> bool {
        self.get(npc_code, map_id).is_some()
    }

    /// Record a name for a specific map so the same npc_code can resolve to
    /// different bosses on different maps.
    pub fn insert(&self, npc_code: u32, map_id: u32, name: String) {
        if let Ok(mut m) = self.mapping.write() {
            m.insert(make_key(npc_code, map_id), name);
        }
        self.persist();
    }

    fn persist(&self) {
        let Some(path) = &self.path else { return };
        let Ok(m) = self.mapping.read() else { return };
        match serde_json::to_string_pretty(&*m) {
            Ok(json) => {
                if let Err(err) = std::fs::write(path, json) {
                    error!(path = %path.display(), error = %err, "failed to save boss mapping");
                }
            }
            Err(err) => error!(error = %err, "failed to serialize boss mapping"),
        }
    }
}

fn make_key(npc_code: u32, map_id: u32) -> String {
    format!("{npc_code}_{map_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_specific_entry_wins_over_common() {
        let store = BossNameStore::in_memory();
        store.insert(5000, 0, "Old Name".into());
        store.insert(5000, 310100, "Map Boss".into());
        assert_eq!(store.get(5000, 310100).as_deref(), Some("Map Boss"));
        assert_eq!(store.get(5000, 999_000).as_deref(), Some("Old Name"));
        assert_eq!(store.get(5001, 310100), None);
    }

    #[test]
    fn survives_corrupt_file() {
        let dir = std::env::temp_dir().join(format!("a2meter-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bosses.json");
        std::fs::write(&path, b"{not json").unwrap();
        let store = BossNameStore::load(path.clone());
        assert_eq!(store.get(1, 0), None);
        store.insert(1, 0, "Boss".into());
        // Re-load sees the persisted entry
        let reloaded = BossNameStore::load(path);
        assert_eq!(reloaded.get(1, 0).as_deref(), Some("Boss"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
