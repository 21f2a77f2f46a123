//! # Plant: the runtime that owns the dispatch machinery.
//!
//! One [`Plant`] owns the registry, the data store, the task queue, the
//! sync scheduler, the worker pool, and the periodic timer. Reactors are
//! installed into it, events are emitted through it, and shutdown drains
//! it. Multiple plants per process are independent.
//!
//! ## Architecture
//! ```text
//! emit(T) ──► DataStore.put ──► Registry.lookup(TypeKey(T))
//!                                   │ per reaction: single? gather withs
//!                                   ▼
//!                              TaskQueue (priority, FIFO) ──► WorkerPool
//!                                                              │ Sync admit
//!                                                              ▼
//!                                                           callback
//! every(interval) ──(timer thread)──► TaskQueue
//! ```
//!
//! ## Rules
//! - Emitting is infallible from the caller's view; every failure mode
//!   becomes a log record.
//! - INITIALIZE-scope emits buffer until [`start`](Plant::start) and
//!   replay in order as local emits.
//! - DIRECT-scope emits run matching callbacks inline on the emitting
//!   thread, honoring sync groups and ignoring priority.
//! - NETWORK-scope emits go to the installed tap only; no local
//!   reactions fire.
//! - Emits after shutdown are WARN no-ops.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::{BindError, RuntimeError};
use crate::events::{DataStore, Event, Payload, TypeKey};
use crate::logging::{LogBridge, LogSink, Logger};
use crate::net::{NetworkData, NetworkListen, NetworkSource, NetworkTap, Wire};
use crate::reactions::{Binder, Reaction, ReactionHandle};
use crate::runtime::reactor::{InstallCtx, Reactor, ReactorHandle};
use crate::runtime::registry::Registry;
use crate::scheduler::every::EveryScheduler;
use crate::scheduler::pool::{self, RunningSet, WorkerCtx, WorkerPool};
use crate::scheduler::queue::{Rejected, TaskQueue};
use crate::scheduler::sync::SyncScheduler;
use crate::scheduler::task::Task;

/// Emit scopes handled by the dispatch core. Transport scopes carry the
/// wire selector through to the network tap.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Scope {
    Local,
    Direct,
    Initialize,
    Network(Wire),
}

/// Runtime lifecycle states.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
enum State {
    Constructed = 0,
    Installing = 1,
    Running = 2,
    ShuttingDown = 3,
    Stopped = 4,
}

impl State {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => State::Constructed,
            1 => State::Installing,
            2 => State::Running,
            3 => State::ShuttingDown,
            _ => State::Stopped,
        }
    }
}

struct Installed {
    name: Arc<str>,
    handle: ReactorHandle,
    /// Present for `install`, absent for ad-hoc `installer` bindings.
    reactor: Option<Arc<dyn Reactor>>,
}

pub(crate) struct Core {
    config: Config,
    logger: Logger,
    state: AtomicU8,
    store: DataStore,
    registry: Registry,
    queue: Arc<TaskQueue>,
    sync: Arc<SyncScheduler>,
    running: Arc<RunningSet>,
    submit_seq: AtomicU64,
    init_buffer: Mutex<Vec<(TypeKey, Payload)>>,
    reactors: Mutex<Vec<Installed>>,
    tap: RwLock<Option<Arc<dyn NetworkTap>>>,
    pool: Mutex<Option<WorkerPool>>,
    every: Mutex<Option<EveryScheduler>>,
}

/// The reactive runtime. See the module docs for the data flow.
pub struct Plant {
    core: Arc<Core>,
}

impl Plant {
    /// Creates a plant with the default log bridge (the `log` crate).
    pub fn new(config: Config) -> Self {
        Self::with_sink(config, Arc::new(LogBridge))
    }

    /// Creates a plant routing all log records to `sink`.
    pub fn with_sink(config: Config, sink: Arc<dyn LogSink>) -> Self {
        let logger = Logger::runtime(config.log_level, sink);
        let core = Arc::new(Core {
            queue: Arc::new(TaskQueue::new(config.queue_bound)),
            sync: Arc::new(SyncScheduler::new()),
            running: Arc::new(RunningSet::new()),
            store: DataStore::new(),
            registry: Registry::new(),
            state: AtomicU8::new(State::Constructed as u8),
            submit_seq: AtomicU64::new(0),
            init_buffer: Mutex::new(Vec::new()),
            reactors: Mutex::new(Vec::new()),
            tap: RwLock::new(None),
            pool: Mutex::new(None),
            every: Mutex::new(None),
            logger: logger.clone(),
            config,
        });

        // The timer holds a weak core so a dropped plant stops firing.
        let weak = Arc::downgrade(&core);
        let submit = Arc::new(move |reaction: &Arc<Reaction>| {
            if let Some(core) = weak.upgrade() {
                core.submit_periodic(reaction);
            }
        });
        *core.every.lock() = Some(EveryScheduler::spawn(submit, logger));

        Self { core }
    }

    /// Installs a reactor: runs its `install` bindings and takes strong
    /// ownership of it until the plant stops or the handle is retired.
    pub fn install<R: Reactor>(&self, reactor: R) -> ReactorHandle {
        let name = reactor.name();
        let (handle, token, logger) = self.core.admit_reactor(name);
        let mut ctx = InstallCtx::new(self.core.as_ref(), token, logger);
        reactor.install(&mut ctx);
        self.core.reactors.lock().push(Installed {
            name: Arc::from(name),
            handle: handle.clone(),
            reactor: Some(Arc::new(reactor)),
        });
        handle
    }

    /// Binding surface for ad-hoc reactions without a [`Reactor`] type.
    ///
    /// The returned context binds reactions owned by an anonymous
    /// reactor named `name`; retire it via [`Plant::retire`].
    pub fn installer(&self, name: &str) -> InstallCtx<'_> {
        let (handle, token, logger) = self.core.admit_reactor(name);
        self.core.reactors.lock().push(Installed {
            name: Arc::from(name),
            handle,
            reactor: None,
        });
        InstallCtx::new(self.core.as_ref(), token, logger)
    }

    /// Retires the named reactor: its reactions stop scheduling, queued
    /// tasks drop, and the owned reactor value is released. Returns
    /// false when no such reactor exists.
    pub fn retire(&self, name: &str) -> bool {
        let mut reactors = self.core.reactors.lock();
        let mut found = false;
        for installed in reactors.iter_mut().filter(|i| &*i.name == name) {
            installed.handle.retire();
            installed.reactor.take();
            found = true;
        }
        found
    }

    /// Enters the running state: spawns the worker pool and replays
    /// buffered INITIALIZE emits in submission order.
    pub fn start(&self) {
        let core = &self.core;
        match core.state() {
            State::Constructed | State::Installing => {}
            state => {
                core.logger
                    .warn(&format!("start ignored in state {state:?}"));
                return;
            }
        }

        let workers = core.config.worker_count();
        *core.pool.lock() = Some(WorkerPool::spawn(workers, core.worker_ctx()));
        core.set_state(State::Running);
        core.logger.info(&format!("running with {workers} workers"));

        let buffered: Vec<(TypeKey, Payload)> = core.init_buffer.lock().drain(..).collect();
        for (key, payload) in buffered {
            core.emit_payload(Scope::Local, key, payload, &[]);
        }
    }

    /// Stops the runtime: closes the queue, lets workers drain it, and
    /// waits up to the configured grace for running callbacks.
    ///
    /// Idempotent only in the sense that a second call reports
    /// [`RuntimeError::AlreadyStopped`].
    pub fn shutdown(&self) -> Result<(), RuntimeError> {
        let core = &self.core;
        match core.state() {
            State::ShuttingDown | State::Stopped => return Err(RuntimeError::AlreadyStopped),
            _ => {}
        }
        core.set_state(State::ShuttingDown);
        core.logger.info("shutting down");

        if let Some(every) = core.every.lock().take() {
            every.shutdown();
        }
        core.queue.close();

        let pool = core.pool.lock().take();
        let result = match pool {
            Some(pool) => pool.join_with_grace(core.config.grace, &core.running),
            None => Ok(()),
        };

        core.set_state(State::Stopped);
        match &result {
            Ok(()) => core.logger.info("stopped"),
            Err(err) => core.logger.error(&format!("stop incomplete: {err}")),
        }
        result
    }

    /// True while the worker pool is draining the queue.
    pub fn is_running(&self) -> bool {
        self.core.state() == State::Running
    }

    /// Emits an event locally: stores it, then schedules every enabled
    /// reaction triggered by `T`.
    pub fn emit<T: Event>(&self, value: T) {
        self.core
            .emit_payload(Scope::Local, TypeKey::of::<T>(), Arc::new(value), &[]);
    }

    /// Emits with direct scope: matching callbacks run inline on this
    /// thread, honoring sync groups and ignoring priority.
    pub fn emit_direct<T: Event>(&self, value: T) {
        self.core
            .emit_payload(Scope::Direct, TypeKey::of::<T>(), Arc::new(value), &[]);
    }

    /// Emits with initialize scope: buffered until [`start`](Self::start),
    /// then replayed as a local emit.
    pub fn emit_init<T: Event>(&self, value: T) {
        self.core
            .emit_payload(Scope::Initialize, TypeKey::of::<T>(), Arc::new(value), &[]);
    }

    /// Emits with network scope: the payload goes to the installed
    /// [`NetworkTap`] and no local reaction fires.
    pub fn emit_net<T: Event>(&self, value: T) {
        self.core.emit_payload(
            Scope::Network(Wire::Any),
            TypeKey::of::<T>(),
            Arc::new(value),
            &[],
        );
    }

    /// Like [`emit_net`](Self::emit_net) pinned to UDP transport.
    pub fn emit_udp<T: Event>(&self, value: T) {
        self.core.emit_payload(
            Scope::Network(Wire::Udp),
            TypeKey::of::<T>(),
            Arc::new(value),
            &[],
        );
    }

    /// Like [`emit_net`](Self::emit_net) pinned to TCP transport.
    pub fn emit_tcp<T: Event>(&self, value: T) {
        self.core.emit_payload(
            Scope::Network(Wire::Tcp),
            TypeKey::of::<T>(),
            Arc::new(value),
            &[],
        );
    }

    /// Inbound network delivery: local-emits [`NetworkData<T>`] with the
    /// delivering source seeded as transient companion data.
    pub fn deliver_net<T: Event>(&self, value: T, source: NetworkSource) {
        let payload: Payload = Arc::new(NetworkData::new(Arc::new(value)));
        let source: Payload = Arc::new(source);
        let seeds = [(TypeKey::of::<NetworkSource>(), source)];
        self.core
            .emit_payload(Scope::Local, TypeKey::of::<NetworkData<T>>(), payload, &seeds);
    }

    /// Installs the outbound network collaborator.
    pub fn set_network_tap(&self, tap: Arc<dyn NetworkTap>) {
        *self.core.tap.write() = Some(tap);
    }

    /// Latest locally stored payload of type `T`, if any.
    pub fn latest<T: Event>(&self) -> Option<Arc<T>> {
        self.core
            .store
            .get(TypeKey::of::<T>())
            .and_then(|(p, _)| p.downcast::<T>().ok())
    }

    /// The runtime's own logger.
    pub fn logger(&self) -> Logger {
        self.core.logger.clone()
    }
}

impl Drop for Plant {
    fn drop(&mut self) {
        if !matches!(self.core.state(), State::Stopped) {
            let _ = self.shutdown();
        }
    }
}

impl Core {
    fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: State) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn worker_ctx(&self) -> WorkerCtx {
        WorkerCtx {
            queue: Arc::clone(&self.queue),
            sync: Arc::clone(&self.sync),
            running: Arc::clone(&self.running),
            logger: self.logger.clone(),
        }
    }

    fn admit_reactor(&self, name: &str) -> (ReactorHandle, crate::reactions::OwnerToken, Logger) {
        if self.state() == State::Constructed {
            self.set_state(State::Installing);
        }
        let token = crate::reactions::OwnerToken::new();
        let handle = ReactorHandle::new(name, token.clone());
        let logger = self.logger.for_reactor(name, self.config.log_level);
        self.logger.debug(&format!("installing reactor '{name}'"));
        (handle, token, logger)
    }

    /// The emit-to-dispatch pipeline. `seeds` carry per-dispatch
    /// transient companions (network deliveries).
    fn emit_payload(&self, scope: Scope, key: TypeKey, payload: Payload, seeds: &[(TypeKey, Payload)]) {
        match self.state() {
            State::ShuttingDown | State::Stopped => {
                self.logger
                    .warn(&format!("emit of {key} ignored: runtime stopped"));
                return;
            }
            state => {
                if scope == Scope::Initialize && state != State::Running {
                    self.init_buffer.lock().push((key, payload));
                    return;
                }
            }
        }

        match scope {
            Scope::Network(wire) => {
                let tap = self.tap.read().clone();
                match tap {
                    Some(tap) => tap.outbound(wire, key, payload),
                    None => self.logger.warn(&format!(
                        "network emit of {key} ({}) dropped: no tap installed",
                        wire.as_label()
                    )),
                }
            }
            Scope::Direct => {
                self.store.put(key, payload.clone());
                self.dispatch_direct(key, payload, seeds);
            }
            Scope::Local | Scope::Initialize => {
                self.store.put(key, payload.clone());
                self.dispatch_queued(key, payload, seeds);
            }
        }
    }

    /// Queue path: freeze one bundle per candidate and submit tasks in
    /// registry order.
    fn dispatch_queued(&self, key: TypeKey, payload: Payload, seeds: &[(TypeKey, Payload)]) {
        let Some(candidates) = self.registry.lookup(key) else {
            return;
        };
        for reaction in candidates.iter() {
            if !reaction.is_runnable() {
                continue;
            }
            if !reaction.acquire_slot() {
                self.logger.debug(&format!(
                    "dropping fire of '{}': single instance already in flight",
                    reaction.ident()
                ));
                continue;
            }
            match reaction.gather(Some((key, payload.clone())), seeds, &self.store) {
                None => {
                    reaction.release_slot();
                    self.logger.debug(&format!(
                        "skipping '{}': companion data not ready",
                        reaction.ident()
                    ));
                }
                Some(args) => {
                    let seq = self.submit_seq.fetch_add(1, Ordering::Relaxed);
                    self.submit(Task::new(Arc::clone(reaction), args, seq));
                }
            }
        }
    }

    /// Direct path: run candidates inline, honoring sync groups.
    fn dispatch_direct(&self, key: TypeKey, payload: Payload, seeds: &[(TypeKey, Payload)]) {
        let Some(candidates) = self.registry.lookup(key) else {
            return;
        };
        let ctx = self.worker_ctx();
        for reaction in candidates.iter() {
            if !reaction.is_runnable() {
                continue;
            }
            if !reaction.acquire_slot() {
                continue;
            }
            let Some(args) = reaction.gather(Some((key, payload.clone())), seeds, &self.store)
            else {
                reaction.release_slot();
                continue;
            };

            let group = reaction.options().sync;
            if let Some(group) = group {
                self.sync.admit_blocking(group);
            }
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                reaction.invoke(&args)
            }));
            if let Err(panic) = outcome {
                self.logger.error(&format!(
                    "reaction '{}' panicked: {}",
                    reaction.ident(),
                    pool::panic_message(&*panic)
                ));
            }
            reaction.release_slot();
            if let Some(group) = group {
                pool::hand_off_group(&ctx, group);
            }
        }
    }

    fn submit(&self, task: Task) {
        if let Some(group) = task.reaction.options().sync {
            self.sync.register(group, task.seq);
        }
        let rejected = match self.queue.push(task) {
            Ok(()) => return,
            Err(Rejected::Overflow(task)) => {
                self.logger.error(&format!(
                    "task queue full ({}): rejecting fire of '{}'",
                    self.config.queue_bound,
                    task.reaction.ident()
                ));
                task
            }
            Err(Rejected::Closed(task)) => {
                self.logger.warn(&format!(
                    "task queue closed: dropping fire of '{}'",
                    task.reaction.ident()
                ));
                task
            }
        };
        rejected.reaction.release_slot();
        if let Some(group) = rejected.reaction.options().sync {
            if let Some(resumed) = self.sync.forget(group, rejected.seq) {
                pool::push_resumed(&self.worker_ctx(), group, resumed);
            }
        }
    }

    /// Timer-thread entry: schedule one periodic fire, bypassing the
    /// store write.
    fn submit_periodic(&self, reaction: &Arc<Reaction>) {
        if matches!(self.state(), State::ShuttingDown | State::Stopped) {
            return;
        }
        if !reaction.is_runnable() {
            return;
        }
        if !reaction.acquire_slot() {
            return;
        }
        match reaction.gather(None, &[], &self.store) {
            None => reaction.release_slot(),
            Some(args) => {
                let seq = self.submit_seq.fetch_add(1, Ordering::Relaxed);
                self.submit(Task::new(Arc::clone(reaction), args, seq));
            }
        }
    }
}

impl Binder for Core {
    fn bind_reaction(
        &self,
        reaction: Arc<Reaction>,
        every: Option<Duration>,
        network_listen: Option<TypeKey>,
    ) -> Result<ReactionHandle, BindError> {
        if matches!(self.state(), State::ShuttingDown | State::Stopped) {
            return Err(BindError::ShuttingDown);
        }

        self.registry.bind(&reaction);
        let handle = ReactionHandle::new(reaction.id(), reaction.enabled_flag());
        self.logger
            .debug(&format!("bound reaction '{}'", reaction.ident()));

        if let Some(interval) = every {
            if let Some(scheduler) = self.every.lock().as_ref() {
                scheduler.register(Arc::clone(&reaction), interval);
            }
        }
        if let Some(key) = network_listen {
            let listen = NetworkListen {
                key,
                reaction: reaction.id(),
            };
            self.emit_payload(
                Scope::Direct,
                TypeKey::of::<NetworkListen>(),
                Arc::new(listen),
                &[],
            );
        }
        Ok(handle)
    }
}
