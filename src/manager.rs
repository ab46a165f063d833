use crate::error::BoxError;

/// Opens and closes the expensive handles tracked by a
/// [`Pool`](crate::Pool).
///
/// The pool never constructs or tears down a handle itself; both ends of the
/// lifecycle belong to the manager. `close` takes the handle by reference
/// because handles are shared with callers through `Arc` while the pool
/// decides when to shut them down.
///
/// # Example
///
/// ```rust
/// use keyed_pool::ResourceManager;
///
/// struct FileManager;
///
/// impl ResourceManager for FileManager {
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
/// ```
pub trait ResourceManager: Send + Sync + 'static {
    /// The opaque handle produced by a successful open.
    type Handle: Send + Sync + 'static;
    /// Error produced by opening or closing a handle.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a new handle for `(kind, identifier)`. Called at most once per
    /// key while that key stays registered, no matter how many callers race.
    fn open(&self, kind: &str, identifier: &str) -> Result<Self::Handle, Self::Error>;

    /// Close a handle the pool is done with.
    fn close(&self, handle: &Self::Handle) -> Result<(), Self::Error>;
}

/// Hooks running around first-time initialization of a key.
///
/// Injected through [`Builder::hooks`](crate::Builder::hooks). Both methods
/// default to doing nothing; either can veto by returning an error, in which
/// case the caller gets [`Error::Init`](crate::Error::Init) and nothing is
/// registered. A `post_init` veto also closes the freshly opened handle, so
/// no handle leaks.
#[allow(unused_variables)]
pub trait InitHooks<H>: Send + Sync {
    /// Runs before the manager opens the handle.
    fn pre_init(&self, kind: &str, identifier: &str) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs after the manager opened the handle, before registration.
    fn post_init(&self, handle: &H) -> Result<(), BoxError> {
        Ok(())
    }
}

/// The do-nothing hooks a pool is built with by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl<H> InitHooks<H> for NoopHooks {}
