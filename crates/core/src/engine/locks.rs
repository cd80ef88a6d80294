use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::{Instant, timeout_at};

use crate::errors::{SalonError, SalonResult};

type LockMap<K> = Arc<DashMap<K, Arc<Mutex<()>>>>;

/// One async mutex per key, created on first use and dropped again once no
/// guard holds it and no caller waits on it.
///
/// Multi-key acquisition locks in sorted order so two callers asking for the
/// same set of keys can never deadlock.
#[derive(Debug)]
pub struct KeyedLocks<K: Eq + Hash> {
    locks: LockMap<K>,
    timeout: Duration,
}

/// Holds every acquired key until dropped.
#[derive(Debug)]
pub struct KeyGuard<K: Eq + Hash> {
    locks: LockMap<K>,
    held: Vec<(K, OwnedMutexGuard<()>)>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Ord + Copy + Debug,
{
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            timeout,
        }
    }

    pub async fn acquire(&self, key: K) -> SalonResult<KeyGuard<K>> {
        self.acquire_all(&[key]).await
    }

    /// Waits at most the configured timeout for the whole set.
    pub async fn acquire_all(&self, keys: &[K]) -> SalonResult<KeyGuard<K>> {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let deadline = Instant::now() + self.timeout;
        let mut guard = KeyGuard {
            locks: Arc::clone(&self.locks),
            held: Vec::with_capacity(keys.len()),
        };
        for key in keys {
            // The clone happens under the shard lock, so eviction sees it.
            let lock = self.locks.entry(key).or_default().value().clone();
            let acquired = timeout_at(deadline, lock.lock_owned()).await;
            match acquired {
                Ok(held) => guard.held.push((key, held)),
                Err(_) => {
                    evict_idle(&self.locks, &key);
                    return Err(SalonError::Timeout(format!("booking lock on {:?}", key)));
                }
            }
        }

        Ok(guard)
    }

    /// Number of keys with a live lock.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K: Eq + Hash> Drop for KeyGuard<K> {
    fn drop(&mut self) {
        for (key, held) in self.held.drain(..).rev() {
            drop(held);
            evict_idle(&self.locks, &key);
        }
    }
}

/// Removes the entry when the map holds the only reference. Every holder and
/// every waiter owns a clone, so a contended lock is never removed.
fn evict_idle<K: Eq + Hash>(locks: &DashMap<K, Arc<Mutex<()>>>, key: &K) {
    locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
}
