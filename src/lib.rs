//! A concurrency-safe pool of expensive keyed resources.
//!
//! Resources (for example opened database handles) are identified by a
//! `(kind, identifier)` pair and opened through a user-supplied
//! [`ResourceManager`]. The pool guarantees that each key is initialized at
//! most once no matter how many callers race on it, counts the users of
//! every resource, and closes resources that stay idle past a configured
//! timeout.
//!
//! # Features
//!
//! - Per-key initialization dedup: one opener per key, everyone else waits
//!   and shares the result; unrelated keys never block each other.
//! - Reference-counted acquire/release with an idle-sweep that reclaims
//!   resources idle longer than [`Config::idle_timeout`].
//! - Optional pre/post-init hooks ([`InitHooks`]), capacity ceiling and
//!   periodic background sweeping, all set through [`Builder`].
//!
//! # Examples
//!
//! ## Acquire, share, release
//!
//! ```rust
//! use keyed_pool::{Pool, ResourceManager};
//!
//! struct Opener;
//!
//! impl ResourceManager for Opener {
//!     type Handle = String;
//!     type Error = std::io::Error;
//!
//!     fn open(&self, kind: &str, identifier: &str) -> Result<String, std::io::Error> {
//!         Ok(format!("{kind}://{identifier}"))
//!     }
//!
//!     fn close(&self, _handle: &String) -> Result<(), std::io::Error> {
//!         Ok(())
//!     }
//! }
//!
//! let pool = Pool::new(Opener);
//!
//! let first = pool.acquire("sqlite3", "/tmp/a.db").unwrap();
//! let second = pool.acquire("sqlite3", "/tmp/a.db").unwrap();
//! // Both callers share one underlying resource.
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! assert_eq!(pool.stats().total, 1);
//!
//! pool.release(&first).unwrap();
//! pool.release(&second).unwrap();
//! assert_eq!(pool.stats().inactive, 1);
//! ```
//!
//! ## Many threads, one initialization
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use keyed_pool::{Pool, ResourceManager};
//!
//! struct CountingOpener(AtomicUsize);
//!
//! impl ResourceManager for CountingOpener {
//!     type Handle = String;
//!     type Error = std::io::Error;
//!
//!     fn open(&self, kind: &str, identifier: &str) -> Result<String, std::io::Error> {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         Ok(format!("{kind}://{identifier}"))
//!     }
//!
//!     fn close(&self, _handle: &String) -> Result<(), std::io::Error> {
//!         Ok(())
//!     }
//! }
//!
//! let pool = Arc::new(Pool::new(CountingOpener(AtomicUsize::new(0))));
//!
//! let handles: Vec<_> = (0..8)
//!     .map(|_| {
//!         let pool = pool.clone();
//!         std::thread::spawn(move || {
//!             let res = pool.acquire("postgres", "db:5432").unwrap();
//!             pool.release(&res).unwrap();
//!         })
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! // Eight callers, one open.
//! assert_eq!(pool.stats().total, 1);
//! ```

mod builder;
mod counter;
mod error;
mod keyed_lock;
mod manager;
mod pool;
mod resource;

pub use builder::Builder;
pub use counter::ActiveCounter;
pub use error::{BoxError, Error};
pub use keyed_lock::{KeyedLock, KeyedLockGuard};
pub use manager::{InitHooks, NoopHooks, ResourceManager};
pub use pool::{Config, Pool, Stats};
pub use resource::Resource;
