use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

use keyed_pool::KeyedLock;

#[test]
fn first_caller_is_leader() {
    let lock = KeyedLock::new();
    assert!(lock.acquire("open:sqlite3:/tmp/a.db"));
    lock.release("open:sqlite3:/tmp/a.db");
}

#[test]
fn waiters_return_false_after_release() {
    let lock = Arc::new(KeyedLock::new());
    assert!(lock.acquire("k"));

    let waiter = {
        let lock = lock.clone();
        std::thread::spawn(move || lock.acquire("k"))
    };
    // Give the waiter time to block.
    std::thread::sleep(Duration::from_millis(50));
    lock.release("k");

    assert!(!waiter.join().unwrap());
}

#[test]
fn exactly_one_leader_among_racers() {
    let threads = 8;
    let lock = Arc::new(KeyedLock::new());
    let barrier = Arc::new(Barrier::new(threads));
    let leaders = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let lock = lock.clone();
            let barrier = barrier.clone();
            let leaders = leaders.clone();
            std::thread::spawn(move || {
                barrier.wait();
                if lock.acquire("k") {
                    leaders.fetch_add(1, Ordering::SeqCst);
                    // Hold long enough that every racer arrives while the
                    // key is taken.
                    std::thread::sleep(Duration::from_millis(100));
                    lock.release("k");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(leaders.load(Ordering::SeqCst), 1);
}

#[test]
fn distinct_keys_never_block() {
    let lock = KeyedLock::new();
    // Both succeed from one thread, so neither waited on the other.
    assert!(lock.acquire("a"));
    assert!(lock.acquire("b"));
    lock.release("a");
    lock.release("b");
}

#[test]
fn guard_releases_on_drop() {
    let lock = Arc::new(KeyedLock::new());
    let guard = lock.lock("k").unwrap();

    let waiter = {
        let lock = lock.clone();
        std::thread::spawn(move || lock.acquire("k"))
    };
    std::thread::sleep(Duration::from_millis(50));
    drop(guard);

    assert!(!waiter.join().unwrap());
    // A later caller contends for the key from scratch.
    assert!(lock.acquire("k"));
    lock.release("k");
}

#[test]
fn guard_releases_on_unwind() {
    let lock = Arc::new(KeyedLock::new());

    let panicker = {
        let lock = lock.clone();
        std::thread::spawn(move || {
            let _guard = lock.lock("k").unwrap();
            panic!("guarded work failed");
        })
    };
    assert!(panicker.join().is_err());

    // The key was released during unwinding, so it can be led again.
    assert!(lock.acquire("k"));
    lock.release("k");
}

#[test]
fn registry_prunes_released_keys() {
    let lock = KeyedLock::new();
    assert!(lock.is_empty());

    assert!(lock.acquire("open:sqlite3:/tmp/a.db"));
    assert_eq!(lock.len(), 1);

    lock.release("open:sqlite3:/tmp/a.db");
    assert!(lock.is_empty());
}

#[test]
fn release_of_unknown_key_is_noop() {
    let lock = KeyedLock::new();
    lock.release("never-acquired");
    assert!(lock.is_empty());
}
