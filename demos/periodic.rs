//! # Demo: periodic
//!
//! A reaction fired by the timer instead of an emit, sampling the
//! latest value of a companion type on every tick.
//!
//! ## Run
//! ```bash
//! cargo run --example periodic
//! ```

use std::time::Duration;

use turbine::{Args, Config, Plant};

struct Temperature(f64);

fn main() {
    let plant = Plant::new(Config::default());

    let ctx = plant.installer("sampler");
    ctx.on_every(Duration::from_millis(200))
        .with::<Temperature>()
        .label("sample temperature")
        .bind(|args: &Args| {
            let t = args.get::<Temperature>().unwrap();
            println!("[sampler] latest temperature {:.1}", t.0);
        })
        .expect("valid binding");

    plant.start();

    // feed the companion while the timer runs
    for i in 0..5 {
        plant.emit(Temperature(20.0 + i as f64 * 0.5));
        std::thread::sleep(Duration::from_millis(220));
    }

    plant.shutdown().expect("clean stop");
}
