//! Sync-group guarantees: mutual exclusion and FIFO within a group.
//!
//! A group key serializes every reaction bound with `sync::<G>()`.
//! These tests verify the single-threaded critical section (never two
//! in flight) and the submission-order FIFO across rapid emits.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use turbine::{Args, Config, Plant};

struct Job(u32);
struct Other;
struct DbGroup;

const HOLD: Duration = Duration::from_millis(30);

/// Tracks how many callbacks are inside the critical section.
struct Gauge {
    current: AtomicU32,
    peak: AtomicU32,
}

impl Gauge {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            current: AtomicU32::new(0),
            peak: AtomicU32::new(0),
        })
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[test]
fn serialized_reaction_preserves_submission_order() {
    let mut cfg = Config::default();
    cfg.workers = 4;
    let plant = Plant::new(cfg);

    let gauge = Gauge::new();
    let order: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));

    let ctx = plant.installer("serial");
    let g = Arc::clone(&gauge);
    let seen = Arc::clone(&order);
    ctx.on::<Job>()
        .sync::<DbGroup>()
        .bind(move |args: &Args| {
            g.enter();
            seen.lock().push(args.get::<Job>().unwrap().0);
            std::thread::sleep(HOLD);
            g.exit();
        })
        .unwrap();

    plant.start();
    let begun = Instant::now();
    for i in 0..5 {
        plant.emit(Job(i));
    }

    // five serialized 30 ms holds cannot finish faster than 150 ms
    let deadline = Instant::now() + Duration::from_secs(5);
    while order.lock().len() < 5 {
        assert!(Instant::now() < deadline, "serialized fires did not finish");
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(begun.elapsed() >= 5 * HOLD);

    assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
    assert_eq!(&*order.lock(), &[0, 1, 2, 3, 4]);
}

#[test]
fn two_reactions_sharing_a_group_never_overlap() {
    let mut cfg = Config::default();
    cfg.workers = 4;
    let plant = Plant::new(cfg);

    let gauge = Gauge::new();
    let done = Arc::new(AtomicU32::new(0));

    let ctx = plant.installer("pair");
    for _ in 0..2 {
        let g = Arc::clone(&gauge);
        let d = Arc::clone(&done);
        ctx.on::<Job>()
            .or::<Other>()
            .sync::<DbGroup>()
            .bind(move |_: &Args| {
                g.enter();
                std::thread::sleep(Duration::from_millis(10));
                g.exit();
                d.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    plant.start();
    for i in 0..4 {
        plant.emit(Job(i));
        plant.emit(Other);
    }

    // 8 emits x 2 reactions
    let deadline = Instant::now() + Duration::from_secs(5);
    while done.load(Ordering::SeqCst) < 16 {
        assert!(Instant::now() < deadline, "group members did not finish");
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
}
