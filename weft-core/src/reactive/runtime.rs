//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, derivations
//! and bindings. It owns the tracking scope, the change sets of the update
//! scheduler and the garbage-collection queue.
//!
//! # How It Works
//!
//! 1. Signals are created through the runtime and keep a weak reference
//!    back to it.
//!
//! 2. When a derivation or binding reads a signal, the runtime's current
//!    tracking scope records it. After the run, the computation is added to
//!    the edge lists of every signal it read.
//!
//! 3. When an observed signal changes, the runtime:
//!    a. Opens a change set and schedules a flush
//!    b. Re-runs affected derivations until nothing else changes
//!    c. Re-runs affected bindings and patches the host tree
//!    d. Commits every changed signal
//!
//! # Threading
//!
//! A runtime is single-threaded (`!Send`). Several independent runtimes can
//! live in the same thread; nothing is global.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Instant;

use indexmap::IndexMap;
use tokio::sync::Notify;
use tracing::{debug, error};

use super::context::Deps;
use super::signal::{AnySignal, Signal, SignalId};
use super::subscriber::{Anchor, Listener};
use crate::config::Config;
use crate::error::{ComputationKind, ReactiveError, Result};
use crate::graph::Phase;
use crate::host::HostTree;

pub(crate) type ChangeSet = IndexMap<SignalId, Rc<dyn AnySignal>>;

pub(crate) struct RuntimeInner {
    pub(crate) host: Rc<dyn HostTree>,
    pub(crate) config: Config,

    /// Innermost tracking scope. `None` outside tracked computations.
    pub(crate) scope: RefCell<Option<Deps>>,

    /// Derivations created during the current binding run that still wait
    /// for the binding's anchor. `None` outside binding runs.
    pub(crate) new_derives: RefCell<Option<Vec<Rc<Listener>>>>,

    /// Signals changed since the last commit. `None` when no flush is open.
    pub(crate) changed: RefCell<Option<ChangeSet>>,

    /// Signals written during the current settle round.
    pub(crate) round: RefCell<Option<ChangeSet>>,

    pub(crate) phase: Cell<Phase>,
    pub(crate) flush_scheduled: Cell<bool>,

    /// Signals with registered edges since the last sweep.
    pub(crate) gc_queue: RefCell<IndexMap<SignalId, Weak<dyn AnySignal>>>,
    pub(crate) gc_due: Cell<Option<Instant>>,

    /// Wakes the async driver when a flush or a sweep gets scheduled.
    pub(crate) wake: Notify,

    /// Undrained failures, oldest first, capped at `config.max_diagnostics`.
    pub(crate) diagnostics: RefCell<VecDeque<ReactiveError>>,
}

/// Handle to a reactive runtime.
///
/// Cloning the handle is cheap and shares the same runtime.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use weft_core::{MemoryTree, Runtime};
///
/// let rt = Runtime::new(Rc::new(MemoryTree::new()));
/// let name = rt.signal("world".to_string());
/// let n = name.clone();
/// let greeting = rt.derive(move || format!("hello {}", n.get()));
///
/// name.set("weft".to_string());
/// rt.flush();
/// assert_eq!(greeting.get(), "hello weft");
/// ```
#[derive(Clone)]
pub struct Runtime {
    pub(crate) inner: Rc<RuntimeInner>,
}

impl Runtime {
    /// Create a runtime writing into `host`, with the default configuration.
    pub fn new(host: Rc<dyn HostTree>) -> Self {
        Self::build(host, Config::default())
    }

    /// Create a runtime with a custom configuration.
    pub fn with_config(host: Rc<dyn HostTree>, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(host, config))
    }

    fn build(host: Rc<dyn HostTree>, config: Config) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                host,
                config,
                scope: RefCell::new(None),
                new_derives: RefCell::new(None),
                changed: RefCell::new(None),
                round: RefCell::new(None),
                phase: Cell::new(Phase::Idle),
                flush_scheduled: Cell::new(false),
                gc_queue: RefCell::new(IndexMap::new()),
                gc_due: Cell::new(None),
                wake: Notify::new(),
                diagnostics: RefCell::new(VecDeque::new()),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<RuntimeInner> {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(inner: &Weak<RuntimeInner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    /// The host tree bindings write into.
    pub fn host(&self) -> &dyn HostTree {
        self.inner.host.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Create a new signal owned by this runtime.
    pub fn signal<T>(&self, value: T) -> Signal<T>
    where
        T: Clone + PartialEq + 'static,
    {
        Signal::new_in(self, value)
    }

    /// Current scheduler phase.
    pub fn phase(&self) -> Phase {
        self.inner.phase.get()
    }

    /// Drain the failures recorded since the last call.
    ///
    /// At most `Config::max_diagnostics` are kept between calls; older ones
    /// are discarded first.
    pub fn take_diagnostics(&self) -> Vec<ReactiveError> {
        self.inner.diagnostics.take().into()
    }

    pub(crate) fn report_failure(&self, kind: ComputationKind, message: String) {
        error!(%kind, %message, "reactive computation failed");
        self.report(ReactiveError::ComputationFailed { kind, message });
    }

    pub(crate) fn report(&self, err: ReactiveError) {
        let capacity = self.inner.config.max_diagnostics;
        if capacity == 0 {
            return;
        }
        let mut diagnostics = self.inner.diagnostics.borrow_mut();
        if diagnostics.len() >= capacity {
            diagnostics.pop_front();
            debug!(capacity, "diagnostics full, dropped the oldest");
        }
        diagnostics.push_back(err);
    }

    /// Whether a subscriber with this anchor survives pruning.
    pub(crate) fn is_anchor_connected(&self, anchor: Anchor) -> bool {
        match anchor {
            Anchor::Always => true,
            Anchor::Node(node) => self.host().is_connected(node),
            Anchor::Detached => false,
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("phase", &self.phase())
            .field("config", &self.inner.config)
            .field("flush_scheduled", &self.inner.flush_scheduled.get())
            .field("gc_queue", &self.inner.gc_queue.borrow().len())
            .finish()
    }
}
