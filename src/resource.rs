use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::*;

use crate::counter::ActiveCounter;

/// Derived key for a `(kind, identifier)` pair. The kind goes first and never
/// contains the separator, so distinct pairs never collide.
pub(crate) fn resource_key(kind: &str, identifier: &str) -> String {
    format!("{kind}:{identifier}")
}

/// One live handle tracked by a [`Pool`](crate::Pool).
///
/// Callers get a `Resource` behind an `Arc` from
/// [`Pool::acquire`](crate::Pool::acquire) and hand it back through
/// [`Pool::release`](crate::Pool::release). The pool owns the bookkeeping:
/// the reference count moves only through acquire/release, and the handle is
/// closed only by the pool. Callers must not close the handle themselves.
#[derive(Debug)]
pub struct Resource<H> {
    handle: H,
    kind: String,
    identifier: String,
    pub(crate) users: ActiveCounter,
    // Milliseconds since the owning pool's creation, refreshed on every
    // acquire and release.
    pub(crate) last_active: AtomicU64,
}

impl<H> Resource<H> {
    pub(crate) fn new(handle: H, kind: &str, identifier: &str, now: u64) -> Self {
        Self {
            handle,
            kind: kind.to_owned(),
            identifier: identifier.to_owned(),
            users: ActiveCounter::new(),
            last_active: AtomicU64::new(now),
        }
    }

    /// The underlying opaque handle.
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// The resource kind this handle was opened for.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The connection identifier this handle was opened for.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The registry key derived from kind and identifier.
    pub fn key(&self) -> String {
        resource_key(&self.kind, &self.identifier)
    }

    /// How many callers currently hold this resource.
    pub fn active_users(&self) -> i64 {
        self.users.value()
    }

    pub(crate) fn touch(&self, now: u64) {
        self.last_active.store(now, Release);
    }

    pub(crate) fn last_active_at(&self) -> u64 {
        self.last_active.load(Acquire)
    }
}
