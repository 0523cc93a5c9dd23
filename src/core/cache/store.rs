// ─── Persistent Cache Store ───
// Durable map from runner version to the ordered location strings that
// were last verified for it. Entries are hints: callers re-verify on read.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::core::error::{RunnerError, RunnerResult};

/// Key/value store for resolved classpaths.
///
/// `put` replaces the whole entry for a key atomically; entries for
/// different keys never interfere.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<String>>;

    fn put(&self, key: &str, locations: Vec<String>);
}

#[derive(Debug, Default)]
struct StoreInner {
    entries: BTreeMap<String, Vec<String>>,
    /// Bumped by every `put`.
    revision: u64,
    /// Revision last written to disk.
    saved_revision: u64,
}

impl StoreInner {
    fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }
}

/// [`CacheStore`] backed by a pretty-printed JSON object on disk.
///
/// Loaded once at startup; the host decides when to call [`save`].
///
/// [`save`]: JsonCacheStore::save
#[derive(Debug)]
pub struct JsonCacheStore {
    path: Option<PathBuf>,
    inner: Mutex<StoreInner>,
    /// Held for a whole save so writers never share the temp file.
    save_lock: Mutex<()>,
}

impl JsonCacheStore {
    /// Store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            inner: Mutex::new(StoreInner::default()),
            save_lock: Mutex::new(()),
        }
    }

    /// Load the store from `path`.
    ///
    /// A missing file yields an empty store. A corrupt file is logged and
    /// treated as empty; the next save overwrites it.
    pub fn load(path: impl Into<PathBuf>) -> RunnerResult<Self> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, Vec<String>>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Ignoring corrupt runner cache {:?}: {}", path, e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(RunnerError::Io { path, source }),
        };

        debug!("Loaded {} cached runner entries from {:?}", entries.len(), path);
        Ok(Self {
            path: Some(path),
            inner: Mutex::new(StoreInner {
                entries,
                ..StoreInner::default()
            }),
            save_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether entries changed since the last load or save.
    pub fn is_dirty(&self) -> bool {
        self.lock().is_dirty()
    }

    /// Snapshot of every entry, ordered by key.
    pub fn entries(&self) -> BTreeMap<String, Vec<String>> {
        self.lock().entries.clone()
    }

    /// Write every entry to disk.
    ///
    /// The JSON goes to a sibling temp file first and is renamed over the
    /// target, so a crash mid-write leaves the previous file intact. The
    /// store stays dirty if the write fails or a `put` lands meanwhile.
    pub fn save(&self) -> RunnerResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _saving = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let (json, revision) = {
            let inner = self.lock();
            (serde_json::to_string_pretty(&inner.entries)?, inner.revision)
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| RunnerError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|source| RunnerError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, path).map_err(|source| RunnerError::Io {
            path: path.clone(),
            source,
        })?;

        let mut inner = self.lock();
        inner.saved_revision = inner.saved_revision.max(revision);
        debug!("Saved runner cache to {:?}", path);
        Ok(())
    }

    /// Save only if something changed. Returns whether a write happened.
    pub fn save_if_dirty(&self) -> RunnerResult<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStore for JsonCacheStore {
    fn get(&self, key: &str) -> Option<Vec<String>> {
        self.lock().entries.get(key).cloned()
    }

    fn put(&self, key: &str, locations: Vec<String>) {
        let mut inner = self.lock();
        inner.entries.insert(key.to_string(), locations);
        inner.revision += 1;
    }
}
