//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a tracked computation (derivation or
//!    binding), it registers itself as a candidate dependency of that run.
//!
//! 2. When a signal is written with a value that differs from the current
//!    one, and anything observes it, the runtime marks it changed and
//!    schedules a flush.
//!
//! 3. An unobserved signal simply takes the new value; there is nothing to
//!    notify, so its previous value is synchronized on the spot.
//!
//! # Equality
//!
//! Writes are compared with `PartialEq` against the current value. Writing
//! a structurally equal value is a no-op: no flush, no re-runs.
//!
//! # Memory Layout
//!
//! Each signal consists of:
//! - A unique ID (8 bytes)
//! - The current value and the value as of the last committed flush
//! - Its edge lists (listeners and bindings), which grow with dependents

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use super::runtime::RuntimeInner;
use super::subscriber::{Binding, Listener};
use super::Runtime;

/// Unique identifier for a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(u64);

impl SignalId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// The consumers hanging off a signal.
#[derive(Default)]
pub(crate) struct Edges {
    pub(crate) listeners: Vec<Rc<Listener>>,
    pub(crate) bindings: Vec<Rc<Binding>>,
}

impl Edges {
    pub(crate) fn is_observed(&self) -> bool {
        !self.listeners.is_empty() || !self.bindings.is_empty()
    }
}

/// Type-erased view of a signal used by the scheduler and the collector.
pub(crate) trait AnySignal {
    fn id(&self) -> SignalId;

    /// Whether the current value differs from the last committed one.
    fn is_dirty(&self) -> bool;

    /// Snapshot the current value as the committed one.
    fn commit(&self);

    fn edges(&self) -> &RefCell<Edges>;
}

struct SignalCell<T> {
    id: SignalId,
    runtime: Weak<RuntimeInner>,
    raw: RefCell<T>,
    old: RefCell<T>,
    edges: RefCell<Edges>,
}

impl<T> AnySignal for SignalCell<T>
where
    T: Clone + PartialEq + 'static,
{
    fn id(&self) -> SignalId {
        self.id
    }

    fn is_dirty(&self) -> bool {
        *self.raw.borrow() != *self.old.borrow()
    }

    fn commit(&self) {
        let current = self.raw.borrow().clone();
        *self.old.borrow_mut() = current;
    }

    fn edges(&self) -> &RefCell<Edges> {
        &self.edges
    }
}

/// A reactive signal holding a value of type T.
///
/// Cloning a signal yields another handle to the same cell.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use weft_core::{MemoryTree, Runtime};
///
/// let rt = Runtime::new(Rc::new(MemoryTree::new()));
/// let count = rt.signal(0);
///
/// count.set(5);
/// assert_eq!(count.get(), 5);
/// ```
pub struct Signal<T>(Rc<SignalCell<T>>);

impl<T> Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    pub(crate) fn new_in(runtime: &Runtime, value: T) -> Self {
        Self(Rc::new(SignalCell {
            id: SignalId::next(),
            runtime: runtime.downgrade(),
            old: RefCell::new(value.clone()),
            raw: RefCell::new(value),
            edges: RefCell::new(Edges::default()),
        }))
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> SignalId {
        self.0.id
    }

    fn runtime(&self) -> Option<Runtime> {
        Runtime::upgrade(&self.0.runtime)
    }

    fn erased(&self) -> Rc<dyn AnySignal> {
        self.0.clone()
    }

    fn track(&self) {
        if let Some(runtime) = self.runtime() {
            runtime.track_read(self.erased());
        }
    }

    /// Get the current value.
    ///
    /// Inside a tracked computation this also registers the signal as a
    /// dependency of that computation.
    pub fn get(&self) -> T {
        self.track();
        self.0.raw.borrow().clone()
    }

    /// Borrow the current value, tracking the read.
    ///
    /// `f` must not write this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.0.raw.borrow())
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.0.raw.borrow().clone()
    }

    /// The value as of the last committed flush. Tracked like `get`.
    pub fn old(&self) -> T {
        self.track();
        self.0.old.borrow().clone()
    }

    /// Set a new value.
    ///
    /// Equal values are ignored. Otherwise observed signals schedule a
    /// flush and unobserved ones commit immediately.
    pub fn set(&self, value: T) {
        let runtime = self.runtime();
        if let Some(runtime) = &runtime {
            runtime.track_write(self.0.id);
        }

        if *self.0.raw.borrow() == value {
            return;
        }
        *self.0.raw.borrow_mut() = value;

        let observed = self.0.edges.borrow().is_observed();
        match runtime {
            Some(runtime) if observed => runtime.mark_changed(self.erased()),
            _ => self.0.commit(),
        }
    }

    /// Update the value using a function of the current one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.0.raw.borrow());
        self.set(next);
    }

    /// Whether a write is waiting for the next flush to commit.
    pub fn is_dirty(&self) -> bool {
        self.0.is_dirty()
    }

    /// Number of listener edges, including retired ones not yet pruned.
    pub fn listener_count(&self) -> usize {
        self.0.edges.borrow().listeners.len()
    }

    /// Number of binding edges, including retired ones not yet pruned.
    pub fn binding_count(&self) -> usize {
        self.0.edges.borrow().bindings.len()
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + PartialEq + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.0.id)
            .field("value", &self.0.raw.borrow())
            .field("old", &self.0.old.borrow())
            .field("listeners", &self.listener_count())
            .field("bindings", &self.binding_count())
            .finish()
    }
}
