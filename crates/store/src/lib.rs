//! Single-slot persistence.
//!
//! A node keeps exactly one value, its blockchain, keyed implicitly by the
//! node's identity through the store's location rather than by arbitrary
//! keys. Both sides of a peer (the serving side and the pulling side)
//! share one store instance, so saves and loads are mutually exclusive and
//! a write is never observable half done; last writer wins.

use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

pub trait Store<T>: Send + Sync {
    /// Overwrites the slot.
    fn save(&self, value: &T) -> Result<(), StoreError>;

    /// Reads the slot, `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<T>, StoreError>;

    /// True when the slot holds a loadable value.
    fn exists(&self) -> bool;

    /// Removes the slot. True when something was actually deleted.
    fn delete(&self) -> Result<bool, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("stored value could not be encoded or decoded: {0}")]
    Codec(#[from] serde_json::Error),
}

/// One JSON file inside a directory owned by this store.
///
/// The directory name carries the node identity, e.g. `./blockchain8081`
/// for an honest peer on port 8081 or `./sybil` for the adversarial
/// variant.
pub struct FileStore<T> {
    directory: PathBuf,
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> FileStore<T> {
    /// Opens the slot, creating the directory when it does not exist yet.
    pub fn open(directory: impl Into<PathBuf>, file_name: &str) -> Result<Self, StoreError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self {
            path: directory.join(file_name),
            directory,
            lock: Mutex::new(()),
            _marker: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> Store<T> for FileStore<T>
where
    T: Serialize + DeserializeOwned,
{
    fn save(&self, value: &T) -> Result<(), StoreError> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        let encoded = serde_json::to_vec_pretty(value)?;

        // Write a sibling file and rename it into place so a concurrent
        // load never observes a torn slot.
        let staging = self.path.with_extension("tmp");
        fs::write(&staging, &encoded)?;
        fs::rename(&staging, &self.path)?;
        debug!(path = %self.path.display(), bytes = encoded.len(), "slot saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<T>, StoreError> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn exists(&self) -> bool {
        matches!(self.load(), Ok(Some(_)))
    }

    fn delete(&self) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        let existed = self.path.exists();
        if existed {
            fs::remove_file(&self.path)?;
        }
        // the owning directory goes too once it is empty
        let _ = fs::remove_dir(&self.directory);
        Ok(existed)
    }
}

/// In-memory slot, a drop-in substitute for tests.
#[derive(Debug, Default)]
pub struct MemoryStore<T> {
    slot: Mutex<Option<T>>,
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T> Store<T> for MemoryStore<T>
where
    T: Clone + Send + Sync,
{
    fn save(&self, value: &T) -> Result<(), StoreError> {
        *self.slot.lock().expect("slot lock poisoned") = Some(value.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<T>, StoreError> {
        Ok(self.slot.lock().expect("slot lock poisoned").clone())
    }

    fn exists(&self) -> bool {
        self.slot.lock().expect("slot lock poisoned").is_some()
    }

    fn delete(&self) -> Result<bool, StoreError> {
        Ok(self.slot.lock().expect("slot lock poisoned").take().is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Snapshot {
        label: String,
        revision: u32,
    }

    fn snapshot(revision: u32) -> Snapshot {
        Snapshot {
            label: "chain".into(),
            revision,
        }
    }

    fn open_store(dir: &tempfile::TempDir) -> FileStore<Snapshot> {
        FileStore::open(dir.path().join("slot"), "value.json").unwrap()
    }

    #[test]
    fn fresh_slot_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        assert!(store.load().unwrap().is_none());
        assert!(!store.exists());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        store.save(&snapshot(1)).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap(), Some(snapshot(1)));
    }

    #[test]
    fn last_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        store.save(&snapshot(1)).unwrap();
        store.save(&snapshot(2)).unwrap();
        assert_eq!(store.load().unwrap(), Some(snapshot(2)));
    }

    #[test]
    fn delete_reports_whether_something_was_there() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        assert!(!store.delete().unwrap());
        store.save(&snapshot(1)).unwrap();
        assert!(store.delete().unwrap());
        assert!(!store.exists());
    }

    #[test]
    fn reopening_an_existing_directory_keeps_the_slot() {
        let dir = tempfile::tempdir().unwrap();
        let first = open_store(&dir);
        first.save(&snapshot(3)).unwrap();

        let second = open_store(&dir);
        assert_eq!(second.load().unwrap(), Some(snapshot(3)));
    }

    #[test]
    fn garbage_on_disk_surfaces_as_a_codec_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        fs::write(store.path(), b"not json").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Codec(_))));
        assert!(!store.exists());
    }

    #[test]
    fn concurrent_saves_and_loads_never_tear() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(open_store(&dir));
        store.save(&snapshot(0)).unwrap();

        let writers: Vec<_> = (1..=4)
            .map(|revision| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..25 {
                        store.save(&snapshot(revision)).unwrap();
                    }
                })
            })
            .collect();

        for _ in 0..100 {
            // every observed value is a complete snapshot
            let loaded = store.load().unwrap().unwrap();
            assert_eq!(loaded.label, "chain");
        }
        for writer in writers {
            writer.join().unwrap();
        }
    }

    #[test]
    fn memory_store_behaves_like_a_slot() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&snapshot(1)).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap(), Some(snapshot(1)));
        assert!(store.delete().unwrap());
        assert!(!store.exists());
    }
}
