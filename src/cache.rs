/// Memoised signature maps, one per resolved version.
///
/// The cache is the only mutable shared state in the crate.  Resolution is
/// pure and deterministic, so correctness never depends on the lock: two
/// threads missing on the same version may both compute, and whichever
/// inserts first wins.  The lock is held only for map bookkeeping, never
/// while a map is being computed.
///
/// With a capacity set, the least recently used entry is evicted once the
/// cache is full.  Eviction only costs recomputation later.
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::signature_map::SignatureMap;
use crate::version::PhpVersion;

#[derive(Debug)]
struct Entry {
    map: Arc<SignatureMap>,
    last_used: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<PhpVersion, Entry>,
    /// Logical clock for LRU ordering.
    tick: u64,
}

impl Inner {
    fn touch(&mut self, version: PhpVersion) -> Option<Arc<SignatureMap>> {
        self.tick += 1;
        let tick = self.tick;
        let entry = self.entries.get_mut(&version)?;
        entry.last_used = tick;
        Some(Arc::clone(&entry.map))
    }
}

#[derive(Debug, Default)]
pub struct Cache {
    inner: Mutex<Inner>,
    capacity: Option<usize>,
}

impl Cache {
    /// `None` keeps every resolved version; `Some(n)` keeps at most `n`
    /// (a capacity of zero is treated as one).
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.map(|c| c.max(1)),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn get(&self, version: PhpVersion) -> Option<Arc<SignatureMap>> {
        self.inner.lock().touch(version)
    }

    /// Insert unless an entry already exists; either way return the entry
    /// the cache now holds.
    pub fn insert(&self, version: PhpVersion, map: Arc<SignatureMap>) -> Arc<SignatureMap> {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.touch(version) {
            return existing;
        }

        if let Some(capacity) = self.capacity {
            while inner.entries.len() >= capacity {
                let Some(oldest) = inner
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(version, _)| *version)
                else {
                    break;
                };
                inner.entries.remove(&oldest);
                tracing::debug!(version = %oldest, "evicted cached signature map");
            }
        }

        inner.tick += 1;
        let last_used = inner.tick;
        inner.entries.insert(
            version,
            Entry {
                map: Arc::clone(&map),
                last_used,
            },
        );
        map
    }

    /// Return the cached map for `version`, computing and inserting it on a
    /// miss.  `compute` runs without the lock held.
    pub fn get_or_compute(
        &self,
        version: PhpVersion,
        compute: impl FnOnce() -> SignatureMap,
    ) -> Arc<SignatureMap> {
        if let Some(hit) = self.get(version) {
            return hit;
        }
        self.insert(version, Arc::new(compute()))
    }

    /// The cached entry with the greatest version `<= version`.
    pub fn nearest_at_or_below(
        &self,
        version: PhpVersion,
    ) -> Option<(PhpVersion, Arc<SignatureMap>)> {
        let mut inner = self.inner.lock();
        let nearest = inner
            .entries
            .keys()
            .filter(|v| **v <= version)
            .max()
            .copied()?;
        inner.touch(nearest).map(|map| (nearest, map))
    }

    pub fn contains(&self, version: PhpVersion) -> bool {
        self.inner.lock().entries.contains_key(&version)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}
