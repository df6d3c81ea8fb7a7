use crate::engine::{LoadMode, SoundId};
use crate::LastPlay;
use std::collections::HashMap;

pub(crate) struct CacheEntry {
    pub(crate) sound: SoundId,
    pub(crate) mode: LoadMode,
    // Overwritten by each play of this id; the channel table stays
    // authoritative for per-playback state.
    pub(crate) last: LastPlay,
}

/// Loaded sounds keyed by caller-chosen id. Owns the engine handles until
/// they are disposed.
pub(crate) struct SoundCache {
    entries: HashMap<String, CacheEntry>,
}

impl SoundCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub(crate) fn get(&self, id: &str) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut CacheEntry> {
        self.entries.get_mut(id)
    }

    pub(crate) fn insert(&mut self, id: &str, sound: SoundId, mode: LoadMode) {
        self.entries.insert(
            id.to_owned(),
            CacheEntry {
                sound,
                mode,
                last: LastPlay::default(),
            },
        );
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<CacheEntry> {
        self.entries.remove(id)
    }

    pub(crate) fn ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}
