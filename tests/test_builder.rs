mod common;

use std::time::Duration;

use keyed_pool::{Builder, Error, InitHooks};

use common::{MemHandle, MemManager};

#[test]
fn build_pool_with_defaults() {
    let mut builder = Builder::new();
    let pool = builder.build(MemManager::new());
    assert_eq!(pool.config().idle_timeout, Duration::from_secs(30));
    assert_eq!(pool.config().max_resources, None);
    assert_eq!(pool.config().sweep_interval, None);
}

#[test]
fn build_pool_with_options() {
    let mut builder = Builder::new();
    let pool = builder
        .idle_timeout(Duration::from_secs(5))
        .max_resources(3)
        .sweep_interval(Duration::from_secs(1))
        .build(MemManager::new());
    assert_eq!(pool.config().idle_timeout, Duration::from_secs(5));
    assert_eq!(pool.config().max_resources, Some(3));
    assert_eq!(pool.config().sweep_interval, Some(Duration::from_secs(1)));
}

struct RejectAll;

impl InitHooks<MemHandle> for RejectAll {
    fn pre_init(&self, kind: &str, identifier: &str) -> Result<(), keyed_pool::BoxError> {
        Err(format!("{kind}:{identifier} rejected").into())
    }
}

#[test]
fn build_with_hooks() {
    let mut builder = Builder::new();
    let pool = builder.hooks(RejectAll).build(MemManager::new());

    let err = pool.acquire("sqlite3", "/tmp/a.db").unwrap_err();
    assert!(matches!(err, Error::Init { .. }));
    assert_eq!(pool.stats().total, 0);
}
