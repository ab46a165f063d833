/// Boxed error type used for manager, hook and close failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by a [`Pool`](crate::Pool).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A pre-init hook, the manager's open, or a post-init hook failed.
    /// Nothing was registered and no handle was leaked.
    #[error("initialization of {kind}:{identifier} failed")]
    Init {
        /// Resource kind the failed acquire asked for.
        kind: String,
        /// Connection identifier the failed acquire asked for.
        identifier: String,
        /// What the hook or manager reported.
        #[source]
        source: BoxError,
    },

    /// The caller waited out another caller's initialization of the same key
    /// and that initialization failed. Retryable.
    #[error("{kind}:{identifier} is unavailable, initialization by another caller failed")]
    Unavailable {
        /// Resource kind the failed acquire asked for.
        kind: String,
        /// Connection identifier the failed acquire asked for.
        identifier: String,
    },

    /// A resource registered by a successful initialization was missing on
    /// re-read. Indicates a bug in the pool itself.
    #[error("registry has no entry for {key} after successful initialization")]
    Inconsistent {
        /// Derived key of the missing resource.
        key: String,
    },

    /// Closing a handle failed. [`Pool::close`](crate::Pool::close) aborts
    /// on the first such failure; [`Pool::force_close`](crate::Pool::force_close)
    /// reports the first one after emptying the pool anyway.
    #[error("failed to close resource")]
    Close {
        /// What the manager's close reported.
        #[source]
        source: BoxError,
    },

    /// A resource was released more often than it was acquired, or released
    /// into a pool that does not track it. The reference count was left
    /// untouched.
    #[error("release of untracked resource {key}")]
    UntrackedRelease {
        /// Derived key of the offending resource.
        key: String,
    },

    /// The pool already tracks `limit` distinct resources and refused to
    /// register another one.
    #[error("pool is at capacity ({limit} resources)")]
    AtCapacity {
        /// The configured `max_resources` ceiling.
        limit: usize,
    },
}
