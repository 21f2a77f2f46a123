//! # Demo: sync_single
//!
//! Shows the two scheduling constraints side by side:
//! - `sync::<G>()` serializes reactions sharing a group key.
//! - `single()` drops emits while an instance is already in flight.
//!
//! ## Run
//! ```bash
//! cargo run --example sync_single
//! ```

use std::time::Duration;

use turbine::{Args, Config, Plant};

struct Write(u32);
struct Poll;
struct Ledger;

fn main() {
    let mut cfg = Config::default();
    cfg.workers = 4;
    let plant = Plant::new(cfg);

    let ctx = plant.installer("demo");

    // four workers, but writes serialize on the Ledger group in order
    ctx.on::<Write>()
        .sync::<Ledger>()
        .label("serialized write")
        .bind(|args: &Args| {
            let w = args.get::<Write>().unwrap();
            println!("[write] begin {}", w.0);
            std::thread::sleep(Duration::from_millis(50));
            println!("[write] end   {}", w.0);
        })
        .expect("valid binding");

    // a slow poller: bursts collapse into one running instance
    ctx.on::<Poll>()
        .single()
        .label("slow poll")
        .bind(|_: &Args| {
            println!("[poll] running (others dropped)");
            std::thread::sleep(Duration::from_millis(120));
        })
        .expect("valid binding");

    plant.start();

    for i in 0..5 {
        plant.emit(Write(i));
    }
    for _ in 0..10 {
        plant.emit(Poll);
    }

    std::thread::sleep(Duration::from_millis(500));
    plant.shutdown().expect("clean stop");
}
