//! # Binding builder: runtime fusion of DSL words.
//!
//! [`OnBuilder`] accumulates the words of one binding — triggers,
//! companions, the periodic word, and options — then fuses them into a
//! single [`Reaction`] on [`bind`](OnBuilder::bind). Each word is a plain
//! builder method; the fusion step validates the combination, renders the
//! diagnostic identifier, and hands the finished descriptor to the
//! runtime.
//!
//! ## Rules
//! - A binding needs at least one trigger word (`on`, `or`, or `every`).
//! - Companions (`with*`) never fire the reaction; they only gate and
//!   enrich the bundle.
//! - Unset options default to priority NORMAL, no sync group, parallel
//!   instances allowed.
//!
//! ## Example
//! ```no_run
//! use std::time::Duration;
//! use turbine::{Args, Config, Plant, Priority};
//!
//! struct Tick;
//! struct Settings { verbose: bool }
//!
//! let plant = Plant::new(Config::default());
//! let handle = plant
//!     .installer("demo")
//!     .on::<Tick>()
//!     .with::<Settings>()
//!     .priority(Priority::High)
//!     .label("tick handler")
//!     .bind(|args: &Args| {
//!         let settings = args.get::<Settings>().unwrap();
//!         if settings.verbose {
//!             println!("tick");
//!         }
//!     })
//!     .unwrap();
//! # let _ = handle;
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::error::BindError;
use crate::events::{Event, TypeKey};
use crate::reactions::handle::ReactionHandle;
use crate::reactions::options::{Priority, ReactionOptions};
use crate::reactions::reaction::{OwnerToken, Reaction, ReactionIdent, WithSpec};

/// Seam between the builder and the runtime that registers reactions.
///
/// Implemented by the plant core; kept as a trait so the builder does not
/// depend on runtime internals.
pub(crate) trait Binder {
    /// Registers a fused reaction. `every` schedules a periodic fire;
    /// `network_listen` announces a network listener binding via a direct
    /// emit.
    fn bind_reaction(
        &self,
        reaction: Arc<Reaction>,
        every: Option<Duration>,
        network_listen: Option<TypeKey>,
    ) -> Result<ReactionHandle, BindError>;
}

/// Accumulates the words of one binding; terminal word is [`bind`](Self::bind).
pub struct OnBuilder<'a> {
    binder: &'a dyn Binder,
    owner: OwnerToken,
    triggers: Vec<TypeKey>,
    withs: Vec<WithSpec>,
    every: Option<Duration>,
    network_listen: Option<TypeKey>,
    options: ReactionOptions,
    label: Option<String>,
    fusion: Vec<String>,
}

impl<'a> OnBuilder<'a> {
    pub(crate) fn new(binder: &'a dyn Binder, owner: OwnerToken) -> Self {
        Self {
            binder,
            owner,
            triggers: Vec::new(),
            withs: Vec::new(),
            every: None,
            network_listen: None,
            options: ReactionOptions::default(),
            label: None,
            fusion: Vec::new(),
        }
    }

    /// Adds a trigger: an emit of `T` fires this reaction.
    pub(crate) fn trigger<T: Event>(mut self) -> Self {
        let key = TypeKey::of::<T>();
        self.fusion.push(format!("on<{}>", key.name()));
        self.triggers.push(key);
        self
    }

    /// Adds a further trigger type; the reaction fires on either.
    pub fn or<U: Event>(self) -> Self {
        self.trigger::<U>()
    }

    /// Bundles the latest `W` into the callback without firing on it.
    ///
    /// When no `W` was ever emitted, fires of this reaction are skipped
    /// until one is.
    pub fn with<W: Event>(mut self) -> Self {
        let key = TypeKey::of::<W>();
        self.fusion.push(format!("with<{}>", key.name()));
        self.withs.push(WithSpec {
            key,
            transient: false,
        });
        self
    }

    /// Like [`with`](Self::with), but `W` is consumed-on-read data: when
    /// the source has nothing current, the last value this reaction
    /// observed is used instead.
    pub fn with_transient<W: Event>(mut self) -> Self {
        let key = TypeKey::of::<W>();
        self.fusion.push(format!("with_transient<{}>", key.name()));
        self.withs.push(WithSpec {
            key,
            transient: true,
        });
        self
    }

    /// Fires this reaction periodically at `interval`.
    ///
    /// Best-effort timing: missed ticks coalesce instead of firing in a
    /// burst.
    pub fn every(mut self, interval: Duration) -> Self {
        self.fusion.push(format!("every({:?})", interval));
        self.every = Some(interval);
        self
    }

    /// Serializes this reaction with every other reaction sharing the
    /// group type `G`: at most one of them runs at a time, FIFO within
    /// the group.
    pub fn sync<G: Event>(mut self) -> Self {
        let key = TypeKey::of::<G>();
        self.fusion.push(format!("sync<{}>", key.name()));
        self.options.sync = Some(key);
        self
    }

    /// At most one scheduled-or-running task for this reaction; further
    /// submissions are dropped at emit time.
    pub fn single(mut self) -> Self {
        self.fusion.push("single".to_string());
        self.options.single = true;
        self
    }

    /// Queue priority for tasks of this reaction.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.fusion.push(format!("priority({})", priority.as_label()));
        self.options.priority = priority;
        self
    }

    /// User label shown first in the reaction's diagnostic identifier.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn listen(mut self, key: TypeKey) -> Self {
        self.network_listen = Some(key);
        self
    }

    /// Fuses the accumulated words and registers the reaction.
    ///
    /// This is the only fallible call on the public surface: an invalid
    /// word combination fails here and no reaction is created.
    pub fn bind<F>(self, callback: F) -> Result<ReactionHandle, BindError>
    where
        F: Fn(&crate::events::Args) + Send + Sync + 'static,
    {
        if self.triggers.is_empty() && self.every.is_none() {
            return Err(BindError::NoTrigger);
        }
        if self.every.is_some_and(|i| i.is_zero()) {
            return Err(BindError::ZeroInterval);
        }
        for (i, a) in self.triggers.iter().enumerate() {
            if self.triggers[..i].contains(a) {
                return Err(BindError::DuplicateTrigger { name: a.name() });
            }
        }

        let ident = ReactionIdent {
            label: self.label,
            fusion: self.fusion.join(" + "),
            callback: std::any::type_name::<F>(),
        };
        let reaction = Reaction::new(
            ident,
            self.owner,
            self.triggers,
            self.withs,
            self.options,
            Box::new(callback),
        );
        self.binder
            .bind_reaction(reaction, self.every, self.network_listen)
    }
}
