//! Mapping from logical notification keys to Discord message ids.

use std::{fs, path::PathBuf};

use indexmap::IndexMap;
use tracing::warn;

use super::{StoreError, StoreResult, write_atomic};

/// Capability used by the notifier to remember which remote message backs a
/// logical key. File-backed in production, in-memory in tests.
pub trait MessageIdStore: Send + Sync {
    /// Message id recorded for a key, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Record (and persist) the message id for a key.
    fn set(&self, key: &str, message_id: &str) -> StoreResult<()>;
    /// All recorded entries, in stored order.
    fn entries(&self) -> Vec<(String, String)>;
}

/// [`MessageIdStore`] backed by a single JSON object file.
///
/// The map is reloaded on every access; like the rest of the tool each
/// operation is a full load-modify-save cycle with no in-process cache.
#[derive(Debug, Clone)]
pub struct FileMessageIdStore {
    path: PathBuf,
}

impl FileMessageIdStore {
    /// Store backed by the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Create an empty map file if none exists yet.
    pub fn ensure_exists(&self) -> StoreResult<()> {
        if self.path.exists() {
            return Ok(());
        }
        self.save(&IndexMap::new())
    }

    fn load(&self) -> IndexMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return IndexMap::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "message map is corrupt; ignoring");
                IndexMap::new()
            }
        }
    }

    fn save(&self, map: &IndexMap<String, String>) -> StoreResult<()> {
        let body = serde_json::to_vec_pretty(map).map_err(|source| StoreError::Encode {
            path: self.path.clone(),
            source,
        })?;
        write_atomic(&self.path, &body)
    }
}

impl MessageIdStore for FileMessageIdStore {
    fn get(&self, key: &str) -> Option<String> {
        self.load().get(key).cloned()
    }

    fn set(&self, key: &str, message_id: &str) -> StoreResult<()> {
        let mut map = self.load();
        map.insert(key.to_string(), message_id.to_string());
        self.save(&map)
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.load().into_iter().collect()
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::sync::Mutex;

    use indexmap::IndexMap;

    use super::{MessageIdStore, StoreResult};

    /// In-memory substitute used by notifier tests.
    #[derive(Debug, Default)]
    pub(crate) struct MemoryMessageIdStore {
        map: Mutex<IndexMap<String, String>>,
    }

    impl MemoryMessageIdStore {
        pub(crate) fn with(entries: &[(&str, &str)]) -> Self {
            let store = Self::default();
            for (key, id) in entries {
                store.set(key, id).unwrap();
            }
            store
        }
    }

    impl MessageIdStore for MemoryMessageIdStore {
        fn get(&self, key: &str) -> Option<String> {
            self.map.lock().unwrap().get(key).cloned()
        }

        fn set(&self, key: &str, message_id: &str) -> StoreResult<()> {
            self.map
                .lock()
                .unwrap()
                .insert(key.to_string(), message_id.to_string());
            Ok(())
        }

        fn entries(&self) -> Vec<(String, String)> {
            self.map
                .lock()
                .unwrap()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        }
    }
}
