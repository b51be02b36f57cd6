//! Reactive Context
//!
//! The tracking scope records which signals a computation reads and writes
//! while it runs. Scopes are dynamically scoped: entering one swaps it into
//! the runtime's slot, and only the innermost scope receives registrations.
//! The previous scope comes back when the guard is dropped, including when
//! the computation panics.
//!
//! A read that is also written during the same run does not become an edge,
//! so a computation is never subscribed to its own writes.

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::signal::{AnySignal, Edges, SignalId};
use super::Runtime;
use crate::error::ComputationKind;

/// Signals touched by one run of a computation.
#[derive(Default)]
pub(crate) struct Deps {
    reads: IndexMap<SignalId, Rc<dyn AnySignal>>,
    writes: SmallVec<[SignalId; 4]>,
}

impl Deps {
    pub(crate) fn record_read(&mut self, signal: Rc<dyn AnySignal>) {
        let id = signal.id();
        self.reads.entry(id).or_insert(signal);
    }

    pub(crate) fn record_write(&mut self, id: SignalId) {
        if !self.writes.contains(&id) {
            self.writes.push(id);
        }
    }

    /// Signals read but not written: the ones that gain an edge.
    pub(crate) fn observed(self) -> impl Iterator<Item = Rc<dyn AnySignal>> {
        let writes = self.writes;
        self.reads
            .into_iter()
            .filter(move |(id, _)| !writes.contains(id))
            .map(|(_, signal)| signal)
    }

    pub(crate) fn read_count(&self) -> usize {
        self.reads.len()
    }
}

/// Guard that restores the previous scope when dropped.
struct ScopeGuard<'a> {
    slot: &'a RefCell<Option<Deps>>,
    /// `None` once restored.
    previous: Option<Option<Deps>>,
}

impl<'a> ScopeGuard<'a> {
    fn enter(slot: &'a RefCell<Option<Deps>>, scope: Option<Deps>) -> Self {
        let previous = slot.replace(scope);
        Self {
            slot,
            previous: Some(previous),
        }
    }

    /// Restore the previous scope and hand back what this one collected.
    fn exit(mut self) -> Deps {
        self.restore().unwrap_or_default()
    }

    fn restore(&mut self) -> Option<Deps> {
        let previous = self.previous.take()?;
        self.slot.replace(previous)
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.restore();
    }
}

impl Runtime {
    /// Run `f(arg)` inside a fresh tracking scope.
    ///
    /// A panic inside `f` is reported and turned into `None`; the caller
    /// keeps its previous value. The dependencies collected up to the panic
    /// are returned either way.
    pub(crate) fn tracked_run<A, R, F>(
        &self,
        kind: ComputationKind,
        f: F,
        arg: A,
    ) -> (Option<R>, Deps)
    where
        F: FnOnce(A) -> R,
    {
        let scope = ScopeGuard::enter(&self.inner.scope, Some(Deps::default()));
        let outcome = panic::catch_unwind(AssertUnwindSafe(move || f(arg)));
        let deps = scope.exit();

        match outcome {
            Ok(value) => (Some(value), deps),
            Err(payload) => {
                self.report_failure(kind, panic_message(payload.as_ref()));
                (None, deps)
            }
        }
    }

    /// Run `f` with tracking suspended: reads and writes inside it do not
    /// register with the enclosing computation.
    pub fn untrack<R>(&self, f: impl FnOnce() -> R) -> R {
        let _scope = ScopeGuard::enter(&self.inner.scope, None);
        f()
    }

    /// Whether a computation is currently being tracked.
    pub fn is_tracking(&self) -> bool {
        self.inner.scope.borrow().is_some()
    }

    pub(crate) fn track_read(&self, signal: Rc<dyn AnySignal>) {
        if let Some(deps) = self.inner.scope.borrow_mut().as_mut() {
            deps.record_read(signal);
        }
    }

    pub(crate) fn track_write(&self, id: SignalId) {
        if let Some(deps) = self.inner.scope.borrow_mut().as_mut() {
            deps.record_write(id);
        }
    }

    /// Add an edge on every observed signal and queue each for GC.
    pub(crate) fn register_edges(&self, deps: Deps, mut add: impl FnMut(&mut Edges)) {
        for signal in deps.observed() {
            self.watch_for_gc(&signal);
            add(&mut *signal.edges().borrow_mut());
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "computation panicked".to_owned()
    }
}
