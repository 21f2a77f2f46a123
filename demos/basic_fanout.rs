//! # Demo: basic_fanout
//!
//! Minimal example of typed dispatch: two reactors bound to the same
//! event type, both fired by one emit.
//!
//! Demonstrates how to:
//! - Define a [`Reactor`] and declare bindings in `install`.
//! - Bundle companion data with `with::<T>()`.
//! - Emit events and shut the plant down cleanly.
//!
//! ## Flow
//! ```text
//! emit(Measurement) ──► DataStore.put
//!     ├─► Printer::install binding   ──► println
//!     └─► Averager::install binding  ──► running mean (uses with<Settings>)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_fanout
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use turbine::{Args, Config, InstallCtx, Plant, Reactor};

struct Measurement(f64);
struct Settings {
    unit: &'static str,
}

/// Prints every measurement as it arrives.
struct Printer;

impl Reactor for Printer {
    fn install(&self, ctx: &mut InstallCtx<'_>) {
        ctx.on::<Measurement>()
            .label("print measurements")
            .bind(|args: &Args| {
                let m = args.get::<Measurement>().unwrap();
                println!("[printer] measurement = {:.2}", m.0);
            })
            .expect("valid binding");
    }
}

/// Keeps a running sum; reads the display unit from companion data.
struct Averager {
    sum_milli: Arc<AtomicU64>,
    count: Arc<AtomicU64>,
}

impl Reactor for Averager {
    fn install(&self, ctx: &mut InstallCtx<'_>) {
        let sum = Arc::clone(&self.sum_milli);
        let count = Arc::clone(&self.count);
        ctx.on::<Measurement>()
            .with::<Settings>()
            .label("running average")
            .bind(move |args: &Args| {
                let m = args.get::<Measurement>().unwrap();
                let settings = args.get::<Settings>().unwrap();
                let s = sum.fetch_add((m.0 * 1000.0) as u64, Ordering::SeqCst);
                let n = count.fetch_add(1, Ordering::SeqCst) + 1;
                let mean = (s as f64 / 1000.0 + m.0) / n as f64;
                println!("[averager] mean = {:.2} {}", mean, settings.unit);
            })
            .expect("valid binding");
    }
}

fn main() {
    let plant = Plant::new(Config::default());

    plant.install(Printer);
    plant.install(Averager {
        sum_milli: Arc::new(AtomicU64::new(0)),
        count: Arc::new(AtomicU64::new(0)),
    });

    plant.start();

    // companion first, or the averager's fires are skipped
    plant.emit(Settings { unit: "mm" });
    for value in [1.0, 2.5, 4.0] {
        plant.emit(Measurement(value));
    }

    std::thread::sleep(std::time::Duration::from_millis(200));
    plant.shutdown().expect("clean stop");
}
