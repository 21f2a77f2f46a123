//! # turbine
//!
//! **Turbine** is a reactive, message-driven runtime for concurrent
//! in-process systems.
//!
//! Loosely coupled units ("reactors") declare bindings from typed events
//! to callbacks; the runtime dispatches matching events across a worker
//! thread pool, honoring per-reaction ordering, priority, and
//! mutual-exclusion constraints.
//!
//! ## Features
//!
//! | Area            | Description                                                        | Key types / traits                          |
//! |-----------------|--------------------------------------------------------------------|---------------------------------------------|
//! | **Binding DSL** | Fuse triggers, companion data, and options into one reaction.      | [`InstallCtx`], [`OnBuilder`], [`Priority`] |
//! | **Dispatch**    | Emit typed events; scheduled over a priority task queue.           | [`Plant`], [`Args`], [`TypeKey`]            |
//! | **Constraints** | Serialize via sync groups, cap in-flight instances, fire on timers.| `sync`, `single`, `every` words             |
//! | **Reactors**    | Install/retire units owning groups of reactions.                   | [`Reactor`], [`ReactorHandle`]              |
//! | **Network seam**| Contract for an external transport collaborator.                   | [`net::NetworkTap`], [`net::NetworkData`]   |
//! | **Logging**     | Six-level structured records, bridged to `log` by default.         | [`LogLevel`], [`LogSink`], [`Logger`]       |
//! | **Errors**      | Typed binding errors; dispatch failures become log records.        | [`BindError`], [`RuntimeError`]             |
//!
//! ```no_run
//! use turbine::{Args, Config, Plant};
//!
//! struct Ping;
//! struct Pong(u32);
//!
//! let plant = Plant::new(Config::default());
//!
//! let ctx = plant.installer("ponger");
//! ctx.on::<Ping>()
//!     .bind(|_args: &Args| println!("ping received"))
//!     .expect("valid binding");
//! ctx.on::<Pong>()
//!     .single()
//!     .bind(|args: &Args| {
//!         let pong = args.get::<Pong>().unwrap();
//!         println!("pong {}", pong.0);
//!     })
//!     .expect("valid binding");
//!
//! plant.start();
//! plant.emit(Ping);
//! plant.emit(Pong(7));
//! plant.shutdown().expect("clean stop");
//! ```
//!
//! ---

mod config;
mod error;
mod events;
mod logging;
mod reactions;
mod runtime;
mod scheduler;

pub mod net;

// ---- Public re-exports ----

pub use config::Config;
pub use error::{BindError, RuntimeError};
pub use events::{Args, Event, Payload, TypeKey};
pub use logging::{LogBridge, LogLevel, LogRecord, LogSink, Logger};
pub use reactions::{OnBuilder, Priority, ReactionHandle, ReactionIdent, ReactionOptions};
pub use runtime::{InstallCtx, Plant, Reactor, ReactorHandle};
