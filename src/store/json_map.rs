use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// A string-keyed map mirrored to one pretty-printed JSON document.
///
/// Every insert rewrites the whole file while the lock is held. Write
/// failures are logged and never surface to the caller; the in-memory map
/// stays authoritative for the life of the process.
#[derive(Debug)]
pub struct JsonMapFile<V> {
    entries: Mutex<BTreeMap<String, V>>,
    path: Option<PathBuf>,
}

impl<V> JsonMapFile<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    /// Not backed by any file.
    pub fn in_memory() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            path: None,
        }
    }

    /// Loads `path`, creating it as `{}` when missing. An unreadable or
    /// corrupt document starts the store empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = if path.exists() {
            load_entries(&path)
        } else {
            if let Err(err) = write_document(&path, &BTreeMap::<String, V>::new()) {
                log::warn!("Could not create {}: {err}", path.display());
            }
            BTreeMap::new()
        };
        log::info!("Loaded {} entries from {}", entries.len(), path.display());

        Self {
            entries: Mutex::new(entries),
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().get(key).cloned()
    }

    /// Overwrites any previous value for `key`.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let mut entries = self.lock();
        entries.insert(key.into(), value);

        if let Some(path) = &self.path {
            if let Err(err) = write_document(path, &entries) {
                log::warn!("Could not persist {}: {err}", path.display());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Up to `limit` keys in sorted order.
    pub fn keys(&self, limit: usize) -> Vec<String> {
        self.lock().keys().take(limit).cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, V>> {
        // A panic elsewhere cannot leave a half-written entry behind.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn load_entries<V: DeserializeOwned>(path: &Path) -> BTreeMap<String, V> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            log::warn!("Could not read {}: {err}; starting empty", path.display());
            return BTreeMap::new();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        log::warn!("Ignoring corrupt {}: {err}", path.display());
        BTreeMap::new()
    })
}

fn write_document<V: Serialize>(path: &Path, entries: &BTreeMap<String, V>) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(entries)?;
    fs::write(path, raw)
}
