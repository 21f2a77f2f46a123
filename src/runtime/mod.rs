//! The runtime layer: the plant, the dispatch registry, and reactor
//! installation.
//!
//! ## Wiring
//! ```text
//! Plant
//!  ├── DataStore            latest payload per TypeKey
//!  ├── Registry             TypeKey → reactions (snapshot reads)
//!  ├── TaskQueue            priority buckets, drained by the pool
//!  ├── SyncScheduler        per-group mutual exclusion
//!  ├── WorkerPool           N threads, panic-isolated callbacks
//!  ├── EveryScheduler       timer thread for periodic fires
//!  └── reactors             installed units + liveness tokens
//! ```
//!
//! Reactions bound through an [`InstallCtx`] land in the registry;
//! emits flow through the plant's pipeline into the queue; workers
//! consult the sync scheduler and run callbacks.

mod plant;
mod reactor;
mod registry;

pub use plant::Plant;
pub use reactor::{InstallCtx, Reactor, ReactorHandle};
