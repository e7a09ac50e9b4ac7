use bytes::Bytes;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, PoisonError, RwLock};

/// The Store holds the string keyspace and the hash keyspace. Each keyspace sits behind its own
/// reader/writer lock: any number of readers may look up values concurrently, a writer has
/// exclusive access to its keyspace for the duration of a single map access.
///
/// The store is cheap to clone (reference counted) and is handed to every command explicitly.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<InnerStore>,
}

impl Store {
    pub fn new() -> Store {
        Self::default()
    }
}

impl Deref for Store {
    type Target = InnerStore;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

type Key = Bytes;

#[derive(Default)]
pub struct InnerStore {
    strings: RwLock<HashMap<Key, Bytes>>,
    hashes: RwLock<HashMap<Key, HashMap<Key, Bytes>>>,
}

// A panic while holding a lock can't leave a map half updated (every access is a single insert
// or lookup), so poisoned locks are recovered.
impl InnerStore {
    pub fn set(&self, key: Key, data: Bytes) {
        let mut strings = self.strings.write().unwrap_or_else(PoisonError::into_inner);
        strings.insert(key, data);
    }

    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        let strings = self.strings.read().unwrap_or_else(PoisonError::into_inner);
        strings.get(key).cloned()
    }

    pub fn hset(&self, hash: Key, field: Key, data: Bytes) {
        let mut hashes = self.hashes.write().unwrap_or_else(PoisonError::into_inner);
        hashes.entry(hash).or_default().insert(field, data);
    }

    pub fn hget(&self, hash: &[u8], field: &[u8]) -> Option<Bytes> {
        let hashes = self.hashes.read().unwrap_or_else(PoisonError::into_inner);
        hashes.get(hash).and_then(|fields| fields.get(field)).cloned()
    }
}
