//! Collects the script GUIDs referenced by MonoBehaviour components.

use ahash::AHashSet;

use crate::record::Record;
use crate::store::RecordStore;

/// Run-wide set of script GUIDs seen in at least one scene.
#[derive(Debug, Default, Clone)]
pub struct ScriptUsage {
    guids: AHashSet<String>,
}

impl ScriptUsage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the GUID was not seen before.
    pub fn insert(&mut self, guid: &str) -> bool {
        if self.guids.contains(guid) {
            return false;
        }
        self.guids.insert(guid.to_string())
    }

    pub fn contains(&self, guid: &str) -> bool {
        self.guids.contains(guid)
    }

    pub fn len(&self) -> usize {
        self.guids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guids.is_empty()
    }

    /// GUIDs in sorted order, for stable output.
    pub fn sorted(&self) -> Vec<&str> {
        let mut guids: Vec<&str> = self.guids.iter().map(String::as_str).collect();
        guids.sort_unstable();
        guids
    }
}

/// Add every script GUID used in `store` to `usage`. Returns how many were new.
pub fn harvest(store: &RecordStore, usage: &mut ScriptUsage) -> usize {
    let mut added = 0;
    for stored in store.iter() {
        let Record::MonoBehaviour(behaviour) = &stored.record else {
            continue;
        };
        match behaviour.script_guid() {
            Some(guid) => {
                if usage.insert(guid) {
                    added += 1;
                }
            }
            None => tracing::debug!(record = %stored.id, "MonoBehaviour without a script guid"),
        }
    }
    added
}
