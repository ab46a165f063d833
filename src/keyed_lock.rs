use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// A registry of named mutual-exclusion points.
///
/// Among all callers racing [`acquire`](KeyedLock::acquire) on the same key,
/// exactly one becomes the leader and gets `true`; everyone else blocks until
/// the leader calls [`release`](KeyedLock::release) and then gets `false`,
/// meaning the guarded work was already done by someone else. Calls on
/// distinct keys never block one another.
///
/// The leader must release its key exactly once, on every exit path, or all
/// waiters on that key block forever. [`lock`](KeyedLock::lock) wraps the
/// leader side in a guard that releases on drop.
///
/// # Example
///
/// ```rust
/// use keyed_pool::KeyedLock;
///
/// let locks = KeyedLock::new();
/// assert!(locks.acquire("open:sqlite3:/tmp/a.db"));
/// // ... perform the one-time initialization ...
/// locks.release("open:sqlite3:/tmp/a.db");
/// ```
#[derive(Debug, Default)]
pub struct KeyedLock {
    states: Mutex<HashMap<String, Arc<KeyState>>>,
}

#[derive(Debug, Default)]
struct KeyState {
    inner: Mutex<KeyStateInner>,
    cond: Condvar,
}

#[derive(Debug, Default)]
struct KeyStateInner {
    held: bool,
    waiters: usize,
    // Bumped on every release so waiters from one round never re-block on a
    // later leader of the same key.
    generation: u64,
}

impl KeyedLock {
    /// Create an empty lock registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Contend for `key`. Returns `true` to the single leader; every other
    /// concurrent caller blocks until the leader releases, then gets `false`.
    pub fn acquire(&self, key: &str) -> bool {
        let state = {
            let mut states = self.states.lock();
            Arc::clone(states.entry(key.to_owned()).or_default())
        };

        let mut inner = state.inner.lock();
        if !inner.held {
            inner.held = true;
            return true;
        }

        inner.waiters += 1;
        let generation = inner.generation;
        while inner.held && inner.generation == generation {
            state.cond.wait(&mut inner);
        }
        inner.waiters -= 1;
        let drained = inner.waiters == 0 && !inner.held;
        drop(inner);

        if drained {
            self.prune(key, &state);
        }
        false
    }

    /// Release `key`, waking every caller currently blocked on it. Must be
    /// called exactly once by the leader. Releasing a key that was never
    /// acquired is a no-op.
    pub fn release(&self, key: &str) {
        let state = {
            let states = self.states.lock();
            match states.get(key) {
                Some(state) => Arc::clone(state),
                None => return,
            }
        };

        let mut inner = state.inner.lock();
        inner.held = false;
        inner.generation = inner.generation.wrapping_add(1);
        let drained = inner.waiters == 0;
        drop(inner);
        state.cond.notify_all();

        if drained {
            self.prune(key, &state);
        }
    }

    /// [`acquire`](KeyedLock::acquire) with the leader side wrapped in a
    /// guard, so the key is released even when the guarded work errors out.
    ///
    /// Returns `Some(guard)` to the leader and `None` to everyone else.
    pub fn lock<'a>(&'a self, key: &'a str) -> Option<KeyedLockGuard<'a>> {
        if self.acquire(key) {
            Some(KeyedLockGuard { lock: self, key })
        } else {
            None
        }
    }

    /// Number of keys currently tracked by the registry.
    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    /// Whether the registry currently tracks no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the state for `key` once nothing references it anymore, so the
    /// registry does not grow with every key ever seen.
    fn prune(&self, key: &str, state: &Arc<KeyState>) {
        let mut states = self.states.lock();
        // The map lock blocks new lookups, so a strong count of two means
        // only the map and this caller still know the state.
        if Arc::strong_count(state) != 2 {
            return;
        }
        let inner = state.inner.lock();
        if !inner.held && inner.waiters == 0 {
            drop(inner);
            states.remove(key);
        }
    }
}

/// Leader-side handle to an acquired key, released on drop.
///
/// Obtained from [`KeyedLock::lock`].
#[derive(Debug)]
pub struct KeyedLockGuard<'a> {
    lock: &'a KeyedLock,
    key: &'a str,
}

impl Drop for KeyedLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release(self.key);
    }
}
