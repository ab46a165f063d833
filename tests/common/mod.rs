#![allow(dead_code)]

use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use keyed_pool::ResourceManager;

/// Handle minted by [`MemManager`]. Nothing is actually opened.
#[derive(Debug, PartialEq, Eq)]
pub struct MemHandle {
    pub kind: String,
    pub identifier: String,
}

/// Open/close totals, shared with the test through an `Arc` because the pool
/// takes the manager by value.
#[derive(Debug, Default)]
pub struct Counters {
    opens: AtomicUsize,
    closes: AtomicUsize,
}

impl Counters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Close attempts, including injected failures.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// In-memory resource manager with fault injection.
#[derive(Debug, Default)]
pub struct MemManager {
    counters: Arc<Counters>,
    open_delay: Option<Duration>,
    fail_open: HashSet<String>,
    fail_close: HashSet<String>,
}

impl MemManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grab the shared counters before the manager moves into a pool.
    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.counters)
    }

    /// Sleep this long inside every open, to widen race windows.
    pub fn open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    /// Make opens of `identifier` fail.
    pub fn fail_open(mut self, identifier: &str) -> Self {
        self.fail_open.insert(identifier.to_owned());
        self
    }

    /// Make closes of handles opened for `identifier` fail.
    pub fn fail_close(mut self, identifier: &str) -> Self {
        self.fail_close.insert(identifier.to_owned());
        self
    }
}

impl ResourceManager for MemManager {
    type Handle = MemHandle;
    type Error = io::Error;

    fn open(&self, kind: &str, identifier: &str) -> Result<MemHandle, io::Error> {
        if let Some(delay) = self.open_delay {
            std::thread::sleep(delay);
        }
        if self.fail_open.contains(identifier) {
            return Err(io::Error::other(format!("injected open failure for {identifier}")));
        }
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(MemHandle {
            kind: kind.to_owned(),
            identifier: identifier.to_owned(),
        })
    }

    fn close(&self, handle: &MemHandle) -> Result<(), io::Error> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.contains(&handle.identifier) {
            return Err(io::Error::other(format!(
                "injected close failure for {}",
                handle.identifier
            )));
        }
        Ok(())
    }
}
