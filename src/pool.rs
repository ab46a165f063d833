use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, error, trace, warn};

use crate::error::{BoxError, Error};
use crate::keyed_lock::KeyedLock;
use crate::manager::{InitHooks, NoopHooks, ResourceManager};
use crate::resource::{Resource, resource_key};

/// A concurrency-safe pool of expensive keyed resources.
///
/// Resources are identified by a `(kind, identifier)` pair. The pool opens
/// each key at most once no matter how many callers race on it, counts how
/// many callers hold each resource, and reclaims resources that have been
/// idle longer than [`Config::idle_timeout`].
///
/// # Examples
///
/// ```rust
/// use keyed_pool::{Pool, ResourceManager};
///
/// struct Opener;
///
/// impl ResourceManager for Opener {
///     type Handle = String;
///     type Error = std::io::Error;
///
///     fn open(&self, kind: &str, identifier: &str) -> Result<String, std::io::Error> {
///         Ok(format!("{kind}://{identifier}"))
///     }
///
///     fn close(&self, _handle: &String) -> Result<(), std::io::Error> {
///         Ok(())
///     }
/// }
///
/// let pool = Pool::new(Opener);
/// let db = pool.acquire("sqlite3", "/tmp/a.db").unwrap();
/// assert_eq!(db.handle(), "sqlite3:///tmp/a.db");
/// assert_eq!(pool.stats().active, 1);
///
/// pool.release(&db).unwrap();
/// assert_eq!(pool.stats().inactive, 1);
///
/// pool.close().unwrap();
/// assert_eq!(pool.stats().total, 0);
/// ```
pub struct Pool<M: ResourceManager> {
    inner: Arc<PoolInner<M>>,
    sweeper: Option<Sweeper>,
}

struct PoolInner<M: ResourceManager> {
    config: Config,
    manager: M,
    hooks: Box<dyn InitHooks<M::Handle>>,
    // Zero point for every last-active timestamp in this pool.
    epoch: Instant,
    state: RwLock<State<M::Handle>>,
    init_locks: KeyedLock,
}

// Registry of every open resource plus the subset with no current users.
// Invariant: idle is a subset of registry with identical Arc identities, and
// a key missing from idle has users > 0.
struct State<H> {
    registry: HashMap<String, Arc<Resource<H>>>,
    idle: HashMap<String, Arc<Resource<H>>>,
}

impl<M: ResourceManager> Pool<M> {
    /// Create a pool with the default [`Config`].
    pub fn new(manager: M) -> Self {
        Self::with_config(Config::default(), manager)
    }

    /// Create a pool with the given configuration.
    pub fn with_config(config: Config, manager: M) -> Self {
        Self::build(config, manager, Box::new(NoopHooks))
    }

    pub(crate) fn build(
        config: Config,
        manager: M,
        hooks: Box<dyn InitHooks<M::Handle>>,
    ) -> Self {
        let inner = Arc::new(PoolInner {
            config,
            manager,
            hooks,
            epoch: Instant::now(),
            state: RwLock::new(State {
                registry: HashMap::new(),
                idle: HashMap::new(),
            }),
            init_locks: KeyedLock::new(),
        });
        let sweeper = inner
            .config
            .sweep_interval
            .map(|interval| Sweeper::spawn(Arc::clone(&inner), interval));
        Self { inner, sweeper }
    }

    /// Get the resource for `(kind, identifier)`, opening it if this is the
    /// first time the pool sees that key.
    ///
    /// Concurrent callers asking for the same key are deduplicated: one of
    /// them performs the initialization (pre-init hook, [`ResourceManager::open`],
    /// post-init hook, in that order) while the others wait and then share
    /// the result. Callers for unrelated keys proceed independently. Every
    /// successful call counts one user, to be paired with one
    /// [`release`](Pool::release).
    ///
    /// A hook or open failure surfaces as [`Error::Init`] and leaves the pool
    /// unchanged; callers that waited on the failed initialization get
    /// [`Error::Unavailable`] and may retry.
    pub fn acquire(&self, kind: &str, identifier: &str) -> Result<Arc<Resource<M::Handle>>, Error> {
        self.inner.acquire(kind, identifier)
    }

    /// Hand back a resource obtained from [`acquire`](Pool::acquire).
    ///
    /// When the last user of a resource releases it, the resource becomes
    /// idle and a reclamation sweep runs. Releasing a resource the pool does
    /// not track, or more often than it was acquired, reports
    /// [`Error::UntrackedRelease`] and changes nothing.
    pub fn release(&self, resource: &Arc<Resource<M::Handle>>) -> Result<(), Error> {
        self.inner.release(resource)
    }

    /// Sweep the idle resources once, closing every resource that has been
    /// idle for at least [`Config::idle_timeout`].
    ///
    /// Handles are closed after the pool's lock is dropped, so a slow close
    /// never blocks concurrent acquires. Close failures are logged, not
    /// propagated.
    pub fn cleanup(&self) -> Result<(), Error> {
        self.inner.cleanup()
    }

    /// Close every resource in the pool, active or idle.
    ///
    /// Stops at the first close failure, leaving that resource and the
    /// remaining ones registered. Use [`force_close`](Pool::force_close) to
    /// empty the pool unconditionally.
    pub fn close(&self) -> Result<(), Error> {
        self.inner.close_all(false)
    }

    /// Close every resource in the pool, ignoring individual close failures.
    ///
    /// The pool is guaranteed to be empty afterwards. The first failure, if
    /// any, is still reported as [`Error::Close`].
    pub fn force_close(&self) -> Result<(), Error> {
        self.inner.close_all(true)
    }

    /// A consistent snapshot of the pool's bookkeeping.
    pub fn stats(&self) -> Stats {
        self.inner.stats()
    }

    /// The configuration this pool was built with.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}

impl<M: ResourceManager> fmt::Debug for Pool<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl<M: ResourceManager> Drop for Pool<M> {
    fn drop(&mut self) {
        if let Some(sweeper) = &mut self.sweeper {
            sweeper.stop();
        }
    }
}

impl<M: ResourceManager> PoolInner<M> {
    fn acquire(&self, kind: &str, identifier: &str) -> Result<Arc<Resource<M::Handle>>, Error> {
        let key = resource_key(kind, identifier);

        // Fast path: the key is already registered.
        if let Some(resource) = self.checkout(&key) {
            return Ok(resource);
        }

        // Slow path: only one caller initializes. The init lock is
        // namespaced away from the resource key.
        let init_key = format!("open:{key}");
        let leader = match self.init_locks.lock(&init_key) {
            Some(_guard) => {
                self.initialize(kind, identifier, &key)?;
                true
            }
            None => false,
        };

        match self.checkout(&key) {
            Some(resource) => Ok(resource),
            None if leader => {
                error!(%key, "resource vanished between registration and checkout");
                Err(Error::Inconsistent { key })
            }
            None => Err(Error::Unavailable {
                kind: kind.to_owned(),
                identifier: identifier.to_owned(),
            }),
        }
    }

    /// Open and register `key`. Runs with the init lock held, so at most one
    /// caller per key is ever in here.
    fn initialize(&self, kind: &str, identifier: &str, key: &str) -> Result<(), Error> {
        // An earlier leader may have finished between our fast-path miss and
        // winning the init lock.
        if self.state.read().registry.contains_key(key) {
            return Ok(());
        }

        self.hooks
            .pre_init(kind, identifier)
            .map_err(|source| Error::Init {
                kind: kind.to_owned(),
                identifier: identifier.to_owned(),
                source,
            })?;

        let handle = self
            .manager
            .open(kind, identifier)
            .map_err(|err| Error::Init {
                kind: kind.to_owned(),
                identifier: identifier.to_owned(),
                source: Box::new(err),
            })?;

        if let Err(source) = self.hooks.post_init(&handle) {
            // The handle was never registered; close it here or leak it.
            if let Err(err) = self.manager.close(&handle) {
                warn!(%key, error = %err, "failed to close handle after post-init veto");
            }
            return Err(Error::Init {
                kind: kind.to_owned(),
                identifier: identifier.to_owned(),
                source,
            });
        }

        let resource = Arc::new(Resource::new(handle, kind, identifier, self.now()));
        {
            let mut state = self.state.write();
            if let Some(limit) = self.config.max_resources
                && state.registry.len() >= limit
            {
                drop(state);
                if let Err(err) = self.manager.close(resource.handle()) {
                    warn!(%key, error = %err, "failed to close handle refused by capacity limit");
                }
                return Err(Error::AtCapacity { limit });
            }
            state.registry.insert(key.to_owned(), Arc::clone(&resource));
        }
        debug!(%key, "opened resource");
        Ok(())
    }

    /// Look up `key` and count one more user on it.
    fn checkout(&self, key: &str) -> Option<Arc<Resource<M::Handle>>> {
        let now = self.now();
        let (resource, revived) = {
            let state = self.state.read();
            let resource = Arc::clone(state.registry.get(key)?);
            // Counting the user under the read lock keeps the sweep (which
            // needs the write lock) from closing the resource underneath us.
            let users = resource.users.inc();
            resource.touch(now);
            (resource, users == 1)
        };

        if revived {
            // First user after an idle period: the key no longer belongs in
            // the idle subset.
            self.state.write().idle.remove(key);
        }
        trace!(%key, "acquired resource");
        Some(resource)
    }

    fn release(&self, resource: &Arc<Resource<M::Handle>>) -> Result<(), Error> {
        let key = resource.key();

        let tracked = {
            let state = self.state.read();
            state
                .registry
                .get(&key)
                .is_some_and(|current| Arc::ptr_eq(current, resource))
        };
        if !tracked || !resource.users.is_active() {
            warn!(%key, "release of untracked resource");
            return Err(Error::UntrackedRelease { key });
        }

        let users = resource.users.dec();
        resource.touch(self.now());
        trace!(%key, "released resource");

        if users == 0 {
            let mut state = self.state.write();
            // Recheck: another caller may have re-acquired before we got the
            // write lock.
            if !resource.users.is_active()
                && state
                    .registry
                    .get(&key)
                    .is_some_and(|current| Arc::ptr_eq(current, resource))
            {
                state.idle.insert(key, Arc::clone(resource));
            }
            drop(state);
            return self.cleanup();
        }
        Ok(())
    }

    fn cleanup(&self) -> Result<(), Error> {
        let now = self.now();
        let timeout = self.config.idle_timeout.as_millis() as u64;

        let mut expired = Vec::new();
        {
            let mut state = self.state.write();
            let mut revived = Vec::new();
            let mut evicted = Vec::new();
            for (key, resource) in &state.idle {
                if resource.users.is_active() {
                    // A racing acquire got here first; fix up the idle subset
                    // and leave the resource alone.
                    revived.push(key.clone());
                } else if now.saturating_sub(resource.last_active_at()) >= timeout {
                    evicted.push(key.clone());
                }
            }
            for key in revived {
                state.idle.remove(&key);
            }
            for key in evicted {
                state.registry.remove(&key);
                if let Some(resource) = state.idle.remove(&key) {
                    expired.push((key, resource));
                }
            }
        }

        // Close evicted handles without holding the pool lock.
        for (key, resource) in expired {
            debug!(%key, "reclaimed idle resource");
            if let Err(err) = self.manager.close(resource.handle()) {
                warn!(%key, error = %err, "failed to close reclaimed resource");
            }
        }
        Ok(())
    }

    fn close_all(&self, force: bool) -> Result<(), Error> {
        let mut state = self.state.write();
        let keys: Vec<String> = state.registry.keys().cloned().collect();
        let mut first_failure: Option<BoxError> = None;

        for key in keys {
            let Some(resource) = state.registry.get(&key).map(Arc::clone) else {
                continue;
            };
            if let Err(err) = self.manager.close(resource.handle()) {
                if !force {
                    return Err(Error::Close {
                        source: Box::new(err),
                    });
                }
                warn!(%key, error = %err, "failed to close resource");
                if first_failure.is_none() {
                    first_failure = Some(Box::new(err));
                }
            }
            state.registry.remove(&key);
            state.idle.remove(&key);
        }

        match first_failure {
            Some(source) => Err(Error::Close { source }),
            None => Ok(()),
        }
    }

    fn stats(&self) -> Stats {
        let state = self.state.read();
        let total = state.registry.len();
        let inactive = state.idle.len();
        Stats {
            total,
            active: total - inactive,
            inactive,
        }
    }

    fn now(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// Configuration for a [`Pool`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// How long a resource may sit with zero users before a sweep closes it.
    pub idle_timeout: Duration,
    /// Ceiling on distinct resources the pool will register at once. `None`
    /// means unbounded. Acquiring a key the pool already tracks is never
    /// refused.
    pub max_resources: Option<usize>,
    /// When set, a background thread runs [`Pool::cleanup`] at this interval,
    /// so reclamation happens even while nobody calls `release`. The thread
    /// stops when the pool is dropped.
    pub sweep_interval: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30),
            max_resources: None,
            sweep_interval: None,
        }
    }
}

/// A point-in-time snapshot of a pool's bookkeeping, from [`Pool::stats`].
///
/// `active + inactive == total` always holds within one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Stats {
    /// Number of currently open resources.
    pub total: usize,
    /// Resources with at least one user.
    pub active: usize,
    /// Resources with zero users, candidates for reclamation.
    pub inactive: usize,
}

// Periodic sweep thread, parked on a condvar so shutdown is immediate.
struct Sweeper {
    thread: Option<JoinHandle<()>>,
    shutdown: Arc<Shutdown>,
}

#[derive(Default)]
struct Shutdown {
    stopped: Mutex<bool>,
    cond: Condvar,
}

impl Sweeper {
    fn spawn<M: ResourceManager>(inner: Arc<PoolInner<M>>, interval: Duration) -> Self {
        let shutdown = Arc::new(Shutdown::default());
        let signal = Arc::clone(&shutdown);
        let thread = thread::Builder::new()
            .name("keyed-pool-sweeper".to_owned())
            .spawn(move || {
                loop {
                    let mut stopped = signal.stopped.lock();
                    if *stopped {
                        break;
                    }
                    let _ = signal.cond.wait_for(&mut stopped, interval);
                    if *stopped {
                        break;
                    }
                    drop(stopped);
                    if let Err(err) = inner.cleanup() {
                        warn!(error = %err, "periodic sweep failed");
                    }
                }
            })
            .expect("failed to spawn sweeper thread");
        Self {
            thread: Some(thread),
            shutdown,
        }
    }

    fn stop(&mut self) {
        *self.shutdown.stopped.lock() = true;
        self.shutdown.cond.notify_all();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
