use std::sync::Arc;

use keyed_pool::ActiveCounter;

#[test]
fn counts_up_and_down() {
    let counter = ActiveCounter::new();
    assert_eq!(counter.value(), 0);
    assert!(!counter.is_active());

    counter.inc();
    counter.inc();
    assert_eq!(counter.value(), 2);
    assert!(counter.is_active());

    counter.dec();
    counter.inc();
    assert_eq!(counter.value(), 2);

    counter.dec();
    counter.dec();
    assert_eq!(counter.value(), 0);
    assert!(!counter.is_active());
}

#[test]
fn returns_updated_value() {
    let counter = ActiveCounter::new();
    assert_eq!(counter.inc(), 1);
    assert_eq!(counter.inc(), 2);
    assert_eq!(counter.dec(), 1);
    assert_eq!(counter.dec(), 0);
}

#[test]
fn no_lost_updates_under_contention() {
    let threads = 8;
    let rounds = 10_000;
    let counter = Arc::new(ActiveCounter::new());

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let counter = counter.clone();
            std::thread::spawn(move || {
                for _ in 0..rounds {
                    counter.inc();
                }
                for _ in 0..rounds {
                    counter.dec();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(counter.value(), 0);
}
