use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::Result;
use crate::storage::file::FileBackend;

/// The capacity of the change notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A single write applied through `StorageContext::apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Set(String, String),
    Remove(String),
}

/// Notification that a slot changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// The slot that changed.
    pub key: String,
    /// The context that wrote it.
    pub origin: Uuid,
}

/// What a `StorageChanges` stream yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageChange {
    /// Another context changed a slot.
    Changed(StorageEvent),
    /// The listener fell behind and missed this many notifications.
    Lagged(u64),
}

struct Inner {
    slots: Mutex<HashMap<String, String>>,
    file: Option<FileBackend>,
    events: broadcast::Sender<StorageEvent>,
}

/// Key/value slots shared by every attached context.
///
/// This is the persisted storage a set of independently rendered regions
/// ("tabs") share. Each region attaches its own `StorageContext`; a write
/// through one context is announced to all others, never to the writer.
#[derive(Clone)]
pub struct SharedStorage {
    inner: Arc<Inner>,
}

impl SharedStorage {
    /// Creates storage that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::with_slots(HashMap::new(), None)
    }

    /// Opens storage persisted to a JSON file, loading any existing slots.
    ///
    /// # Arguments
    ///
    /// * `path` - The storage file. Parent directories are created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let backend = FileBackend::new(path);
        let slots = backend.load()?;
        tracing::info!(
            "Storage opened: {} ({} slots)",
            backend.path().display(),
            slots.len()
        );
        Ok(Self::with_slots(slots, Some(backend)))
    }

    fn with_slots(slots: HashMap<String, String>, file: Option<FileBackend>) -> Self {
        let (events, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(slots),
                file,
                events,
            }),
        }
    }

    /// Attaches a new context with a fresh identity.
    pub fn context(&self) -> StorageContext {
        StorageContext {
            id: Uuid::new_v4(),
            storage: self.clone(),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// One region's handle on `SharedStorage`.
#[derive(Clone)]
pub struct StorageContext {
    id: Uuid,
    storage: SharedStorage,
}

impl StorageContext {
    /// The identity stamped on events written through this context.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Reads one slot.
    pub fn get(&self, key: &str) -> Option<String> {
        self.storage.slots().get(key).cloned()
    }

    /// Reads several slots under one lock, so no write can land in between.
    pub fn get_many<const N: usize>(&self, keys: [&str; N]) -> [Option<String>; N] {
        let slots = self.storage.slots();
        keys.map(|key| slots.get(key).cloned())
    }

    /// Applies a batch of writes atomically.
    ///
    /// Readers see either none or all of the batch. When the storage is file
    /// backed the file is written before the batch becomes visible; a failed
    /// write leaves the slots untouched. One event per slot whose value
    /// actually changed is sent after the lock is released.
    pub fn apply(&self, ops: Vec<StorageOp>) -> Result<()> {
        let changed = {
            let mut slots = self.storage.slots();
            let mut next = slots.clone();
            let mut changed = Vec::new();

            for op in ops {
                match op {
                    StorageOp::Set(key, value) => {
                        if next.get(&key) != Some(&value) {
                            next.insert(key.clone(), value);
                            changed.push(key);
                        }
                    }
                    StorageOp::Remove(key) => {
                        if next.remove(&key).is_some() {
                            changed.push(key);
                        }
                    }
                }
            }

            if changed.is_empty() {
                return Ok(());
            }

            if let Some(file) = &self.storage.inner.file {
                file.save(&next).map_err(|e| {
                    tracing::error!("Failed to persist storage: {}", e);
                    e
                })?;
            }

            *slots = next;
            changed
        };

        for key in changed {
            // No receivers is fine: nobody else is listening yet.
            let _ = self.storage.inner.events.send(StorageEvent {
                key,
                origin: self.id,
            });
        }

        Ok(())
    }

    /// Subscribes to writes made by other contexts.
    pub fn changes(&self) -> StorageChanges {
        StorageChanges {
            own: self.id,
            rx: self.storage.inner.events.subscribe(),
        }
    }
}

/// A stream of changes made by other contexts.
pub struct StorageChanges {
    own: Uuid,
    rx: broadcast::Receiver<StorageEvent>,
}

impl StorageChanges {
    /// Waits for the next change from another context.
    ///
    /// Returns `None` once the storage has been dropped.
    pub async fn next(&mut self) -> Option<StorageChange> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.origin == self.own => continue,
                Ok(event) => return Some(StorageChange::Changed(event)),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    return Some(StorageChange::Lagged(missed));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
