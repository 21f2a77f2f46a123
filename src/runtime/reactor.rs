//! # Reactors and installation.
//!
//! A [`Reactor`] is a user-defined unit that registers reactions. The
//! plant owns installed reactors strongly; each reaction holds only a
//! liveness token, so retiring the reactor is one atomic flip and every
//! queued task of its reactions is discarded at pop time.
//!
//! [`InstallCtx`] is the binding surface handed to `Reactor::install`
//! (and returned by [`Plant::installer`](crate::Plant::installer) for
//! ad-hoc bindings): it starts [`OnBuilder`] chains, carries the
//! reactor's [`Logger`], and lets the reactor pick its own log level.
//!
//! ## Example
//! ```no_run
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//! use turbine::{Args, Config, InstallCtx, Plant, Reactor};
//!
//! struct Ping;
//!
//! struct Counter {
//!     seen: Arc<AtomicU32>,
//! }
//!
//! impl Reactor for Counter {
//!     fn install(&self, ctx: &mut InstallCtx<'_>) {
//!         let seen = Arc::clone(&self.seen);
//!         let log = ctx.logger();
//!         ctx.on::<Ping>()
//!             .label("count pings")
//!             .bind(move |_args: &Args| {
//!                 seen.fetch_add(1, Ordering::Relaxed);
//!                 log.debug("ping");
//!             })
//!             .expect("valid binding");
//!     }
//! }
//!
//! let plant = Plant::new(Config::default());
//! let seen = Arc::new(AtomicU32::new(0));
//! plant.install(Counter { seen: Arc::clone(&seen) });
//! plant.start();
//! plant.emit(Ping);
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::events::{Event, TypeKey};
use crate::logging::{LogLevel, Logger};
use crate::net::{NetworkData, NetworkSource};
use crate::reactions::{Binder, OnBuilder, OwnerToken};

/// A unit that reacts to typed events.
///
/// Implementations declare their bindings in [`install`](Self::install);
/// shared state goes into `Arc` fields cloned into the callbacks.
pub trait Reactor: Send + Sync + 'static {
    /// Declares this reactor's bindings. Called once at install time.
    fn install(&self, ctx: &mut InstallCtx<'_>);

    /// Reactor name for logs; defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Handle to an installed reactor.
///
/// Retiring flips the liveness token: no reaction of this reactor is
/// scheduled again and queued tasks drop at pop time. In-flight
/// callbacks complete normally.
#[derive(Clone)]
pub struct ReactorHandle {
    name: Arc<str>,
    token: OwnerToken,
}

impl ReactorHandle {
    pub(crate) fn new(name: &str, token: OwnerToken) -> Self {
        Self {
            name: Arc::from(name),
            token,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Permanently retires the reactor and all its reactions.
    pub fn retire(&self) {
        self.token.retire();
    }
}

/// Binding surface for one reactor: starts `on(...)` chains and carries
/// the reactor's logger.
pub struct InstallCtx<'p> {
    binder: &'p dyn Binder,
    owner: OwnerToken,
    logger: Logger,
}

impl<'p> InstallCtx<'p> {
    pub(crate) fn new(binder: &'p dyn Binder, owner: OwnerToken, logger: Logger) -> Self {
        Self {
            binder,
            owner,
            logger,
        }
    }

    /// Starts a binding fired by emits of `T`.
    pub fn on<T: Event>(&self) -> OnBuilder<'_> {
        OnBuilder::new(self.binder, self.owner.clone()).trigger::<T>()
    }

    /// Starts a binding fired periodically at `interval`.
    pub fn on_every(&self, interval: Duration) -> OnBuilder<'_> {
        OnBuilder::new(self.binder, self.owner.clone()).every(interval)
    }

    /// Starts a binding fired by network deliveries of `T`.
    ///
    /// The reaction triggers on [`NetworkData<T>`] and carries the
    /// delivering [`NetworkSource`] as a transient companion. Binding
    /// announces the listener to the network collaborator through a
    /// direct emit of [`NetworkListen`](crate::net::NetworkListen).
    pub fn on_network<T: Event>(&self) -> OnBuilder<'_> {
        OnBuilder::new(self.binder, self.owner.clone())
            .trigger::<NetworkData<T>>()
            .with_transient::<NetworkSource>()
            .listen(TypeKey::of::<NetworkData<T>>())
    }

    /// This reactor's level-filtered logger; clone it into callbacks.
    pub fn logger(&self) -> Logger {
        self.logger.clone()
    }

    /// Replaces the reactor's log level from this point on.
    pub fn set_log_level(&mut self, level: LogLevel) {
        let name = self.logger_name();
        self.logger = self.logger.for_reactor(&name, level);
    }

    fn logger_name(&self) -> String {
        // the logger always carries a reactor name here
        self.logger.reactor_name().unwrap_or("reactor").to_string()
    }
}
