//! Edge Garbage Collection
//!
//! Every run of a computation adds fresh edges and retires the previous
//! subscriber, and host nodes can leave the tree at any time. Without
//! pruning, a signal's edge lists would grow forever and keep dead
//! computations alive.
//!
//! Pruning keeps only subscribers whose anchor is connected. It happens in
//! two places:
//!
//! - a flush prunes each changed signal before collecting its subscribers
//! - a periodic sweep prunes every signal that gained edges since the last
//!   sweep, so signals that never change again are cleaned up too
//!
//! The sweep is armed by the first edge registration after a sweep and fires
//! `gc_interval` later. The queue holds signals weakly.

use std::rc::{Rc, Weak};
use std::time::Instant;

use indexmap::IndexMap;
use tracing::debug;

use crate::reactive::{AnySignal, Binding, Listener, Runtime, SubscriberId};

impl Runtime {
    /// Queue `signal` for the next sweep, arming the sweep timer if needed.
    pub(crate) fn watch_for_gc(&self, signal: &Rc<dyn AnySignal>) {
        self.inner
            .gc_queue
            .borrow_mut()
            .entry(signal.id())
            .or_insert_with(|| Rc::downgrade(signal));

        if self.inner.gc_due.get().is_none() {
            self.inner.gc_due.set(Some(Instant::now() + self.inner.config.gc_interval()));
            self.inner.wake.notify_one();
        }
    }

    /// Drop disconnected subscribers from both edge lists of `signal`.
    ///
    /// Returns the number of edges removed.
    pub(crate) fn prune_edges(&self, signal: &dyn AnySignal) -> usize {
        self.prune_listeners(signal) + self.prune_bindings(signal)
    }

    fn prune_listeners(&self, signal: &dyn AnySignal) -> usize {
        let mut edges = signal.edges().borrow_mut();
        let before = edges.listeners.len();
        edges.listeners.retain(|listener| self.is_anchor_connected(listener.anchor()));
        before - edges.listeners.len()
    }

    fn prune_bindings(&self, signal: &dyn AnySignal) -> usize {
        let mut edges = signal.edges().borrow_mut();
        let before = edges.bindings.len();
        edges.bindings.retain(|binding| self.is_anchor_connected(binding.anchor()));
        before - edges.bindings.len()
    }

    /// Prune the listeners of `signals` and return the survivors,
    /// deduplicated in first-seen order.
    pub(crate) fn live_listeners(&self, signals: &[Rc<dyn AnySignal>]) -> Vec<Rc<Listener>> {
        let mut live: IndexMap<SubscriberId, Rc<Listener>> = IndexMap::new();
        for signal in signals {
            self.prune_listeners(signal.as_ref());
            for listener in &signal.edges().borrow().listeners {
                live.entry(listener.id()).or_insert_with(|| Rc::clone(listener));
            }
        }
        live.into_values().collect()
    }

    /// Like [`live_listeners`](Self::live_listeners), for bindings.
    pub(crate) fn live_bindings(&self, signals: &[Rc<dyn AnySignal>]) -> Vec<Rc<Binding>> {
        let mut live: IndexMap<SubscriberId, Rc<Binding>> = IndexMap::new();
        for signal in signals {
            self.prune_bindings(signal.as_ref());
            for binding in &signal.edges().borrow().bindings {
                live.entry(binding.id()).or_insert_with(|| Rc::clone(binding));
            }
        }
        live.into_values().collect()
    }

    /// Sweep every queued signal now and disarm the timer.
    ///
    /// Returns the number of edges removed.
    pub fn collect_garbage(&self) -> usize {
        self.inner.gc_due.set(None);
        let queue = self.inner.gc_queue.take();

        let mut live = 0;
        let mut pruned = 0;
        for signal in queue.values().filter_map(Weak::upgrade) {
            pruned += self.prune_edges(signal.as_ref());
            live += 1;
        }

        debug!(queued = queue.len(), live, pruned, "garbage collection sweep");
        pruned
    }

    /// Fire the sweep if it is due at `now`. Returns whether it ran.
    pub fn run_timers(&self, now: Instant) -> bool {
        match self.inner.gc_due.get() {
            Some(due) if due <= now => {
                self.collect_garbage();
                true
            }
            _ => false,
        }
    }

    /// When the next sweep is due, if one is armed.
    pub fn next_timer(&self) -> Option<Instant> {
        self.inner.gc_due.get()
    }

    /// Number of signals waiting for the next sweep.
    pub fn gc_queue_len(&self) -> usize {
        self.inner.gc_queue.borrow().len()
    }
}
