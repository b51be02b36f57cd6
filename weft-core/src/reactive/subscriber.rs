//! Subscriber types for the reactive system.
//!
//! A subscriber is any computation hanging off a signal's edge lists:
//! a [`Listener`] re-runs a derivation, a [`Binding`] re-renders a host-tree
//! fragment. Every run of a computation creates a fresh subscriber; the
//! previous one is retired and lingers only until the next prune.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::Runtime;
use crate::host::{BindFn, FragmentHandle, NodeRef};

/// Unique identifier for a subscriber.
///
/// Used to deduplicate subscribers reachable from several changed signals
/// within one flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Decides whether a subscriber survives pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Anchor {
    /// Top-level derivations. Never collected.
    Always,
    /// Alive while the node is connected to the host tree.
    Node(NodeRef),
    /// Retired, or created inside a binding that has not placed its output yet.
    Detached,
}

pub(crate) type RerunFn = Rc<dyn Fn(&Runtime, Anchor)>;

/// A derivation edge: re-runs the derivation and writes its target signal.
pub(crate) struct Listener {
    id: SubscriberId,
    rerun: RerunFn,
    anchor: Cell<Anchor>,
}

impl Listener {
    pub(crate) fn new(rerun: RerunFn, anchor: Anchor) -> Rc<Self> {
        Rc::new(Self {
            id: SubscriberId::new(),
            rerun,
            anchor: Cell::new(anchor),
        })
    }

    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    pub(crate) fn anchor(&self) -> Anchor {
        self.anchor.get()
    }

    pub(crate) fn set_anchor(&self, anchor: Anchor) {
        self.anchor.set(anchor);
    }

    /// Re-run the derivation, handing the new listener the same anchor.
    pub(crate) fn run(&self, runtime: &Runtime) {
        (self.rerun)(runtime, self.anchor.get());
    }

    pub(crate) fn retire(&self) {
        self.anchor.set(Anchor::Detached);
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("anchor", &self.anchor.get())
            .finish()
    }
}

/// A binding edge: re-renders a fragment in place.
pub(crate) struct Binding {
    id: SubscriberId,
    render: BindFn,
    /// `None` once retired.
    output: RefCell<Option<FragmentHandle>>,
}

impl Binding {
    pub(crate) fn new(render: BindFn, output: FragmentHandle) -> Rc<Self> {
        Rc::new(Self {
            id: SubscriberId::new(),
            render,
            output: RefCell::new(Some(output)),
        })
    }

    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    pub(crate) fn render(&self) -> BindFn {
        Rc::clone(&self.render)
    }

    pub(crate) fn output(&self) -> Option<FragmentHandle> {
        self.output.borrow().clone()
    }

    pub(crate) fn anchor(&self) -> Anchor {
        match self.output.borrow().as_ref() {
            Some(handle) => Anchor::Node(handle.identity()),
            None => Anchor::Detached,
        }
    }

    pub(crate) fn retire(&self) {
        self.output.replace(None);
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("output", &self.output.borrow())
            .finish()
    }
}
