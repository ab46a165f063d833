use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering::*;

/// A lock-free counter tracking how many users currently hold a resource.
///
/// Increments and decrements are atomic, so arbitrary concurrent callers
/// never lose an update. The counter itself places no lower bound; keeping
/// the value at or above zero is the caller's responsibility.
///
/// # Example
///
/// ```rust
/// use keyed_pool::ActiveCounter;
///
/// let counter = ActiveCounter::new();
/// assert_eq!(counter.value(), 0);
/// counter.inc();
/// counter.inc();
/// assert_eq!(counter.value(), 2);
/// counter.dec();
/// assert_eq!(counter.value(), 1);
/// assert!(counter.is_active());
/// ```
#[derive(Debug, Default)]
pub struct ActiveCounter(AtomicI64);

impl ActiveCounter {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self(AtomicI64::new(0))
    }

    /// Atomically add one and return the updated value.
    #[inline]
    pub fn inc(&self) -> i64 {
        self.0.fetch_add(1, AcqRel) + 1
    }

    /// Atomically subtract one and return the updated value.
    #[inline]
    pub fn dec(&self) -> i64 {
        self.0.fetch_sub(1, AcqRel) - 1
    }

    /// Read the current value.
    #[inline]
    pub fn value(&self) -> i64 {
        self.0.load(Acquire)
    }

    /// Whether any user is currently counted.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.value() > 0
    }
}
