use std::time::Duration;

use crate::manager::{InitHooks, NoopHooks, ResourceManager};
use crate::{Config, Pool};

/// A builder for creating a [`Pool`] with custom configuration.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use keyed_pool::{Builder, ResourceManager};
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
/// let mut builder = Builder::<Opener>::new();
/// let pool = builder
///     .idle_timeout(Duration::from_secs(30))
///     .max_resources(10)
///     .build(Opener);
/// assert_eq!(pool.config().max_resources, Some(10));
/// ```
pub struct Builder<M: ResourceManager> {
    /// Configuration of the pool.
    config: Config,
    hooks: Box<dyn InitHooks<M::Handle>>,
}

impl<M: ResourceManager> Builder<M> {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            hooks: Box::new(NoopHooks),
        }
    }

    /// Set how long a resource may stay unused before a sweep reclaims it.
    pub fn idle_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Cap the number of distinct resources the pool will keep open at once.
    pub fn max_resources(&mut self, limit: usize) -> &mut Self {
        self.config.max_resources = Some(limit);
        self
    }

    /// Run a reclamation sweep on a background thread at this interval, in
    /// addition to the sweeps triggered by releases.
    pub fn sweep_interval(&mut self, interval: Duration) -> &mut Self {
        self.config.sweep_interval = Some(interval);
        self
    }

    /// Install hooks that run around first-time initialization of a key.
    pub fn hooks<H>(&mut self, hooks: H) -> &mut Self
    where
        H: InitHooks<M::Handle> + 'static,
    {
        self.hooks = Box::new(hooks);
        self
    }

    /// Build the pool with the current configuration.
    pub fn build(&mut self, manager: M) -> Pool<M> {
        let config = std::mem::take(&mut self.config);
        let hooks = std::mem::replace(&mut self.hooks, Box::new(NoopHooks));
        Pool::build(config, manager, hooks)
    }
}

impl<M: ResourceManager> Default for Builder<M> {
    fn default() -> Self {
        Self::new()
    }
}
