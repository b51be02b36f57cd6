//! Derivations
//!
//! A derivation is a computation whose result is written into a target
//! signal. It subscribes to everything it reads, so when a dependency
//! changes the scheduler re-runs it during the settle phase of a flush.
//!
//! Unlike a lazy memo, a derivation is eager: the target signal always holds
//! the result of the most recent run.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use weft_core::{MemoryTree, Runtime};
//!
//! let rt = Runtime::new(Rc::new(MemoryTree::new()));
//! let count = rt.signal(2);
//! let c = count.clone();
//! let doubled = rt.derive(move || c.get() * 2);
//! assert_eq!(doubled.get(), 4);
//!
//! count.set(5);
//! rt.flush();
//! assert_eq!(doubled.get(), 10);
//! ```

use std::fmt::Display;
use std::rc::Rc;

use tracing::trace;

use super::signal::Signal;
use super::subscriber::{Anchor, Listener, RerunFn};
use super::Runtime;
use crate::error::ComputationKind;

type ComputeFn<T> = Rc<dyn Fn() -> Result<T, String>>;

impl Runtime {
    /// Create a signal holding the result of `f`, kept up to date.
    ///
    /// The signal starts from `T::default()` and is written with the first
    /// result immediately. If that first run fails, the default is kept.
    pub fn derive<T, F>(&self, f: F) -> Signal<T>
    where
        T: Clone + PartialEq + Default + 'static,
        F: Fn() -> T + 'static,
    {
        let target = self.signal(T::default());
        self.derive_into(f, &target);
        target
    }

    /// Keep `target` updated with the result of `f`.
    pub fn derive_into<T, F>(&self, f: F, target: &Signal<T>)
    where
        T: Clone + PartialEq + 'static,
        F: Fn() -> T + 'static,
    {
        let compute: ComputeFn<T> = Rc::new(move || Ok(f()));
        self.run_derivation(compute, target.clone(), None);
    }

    /// Like [`derive`](Self::derive), for computations that can fail.
    ///
    /// An `Err` is reported as a diagnostic and the target keeps its
    /// previous value.
    pub fn try_derive<T, E, F>(&self, f: F) -> Signal<T>
    where
        T: Clone + PartialEq + Default + 'static,
        E: Display,
        F: Fn() -> Result<T, E> + 'static,
    {
        let target = self.signal(T::default());
        let compute: ComputeFn<T> = Rc::new(move || f().map_err(|err| err.to_string()));
        self.run_derivation(compute, target.clone(), None);
        target
    }

    /// Run one derivation and subscribe a fresh listener to what it read.
    ///
    /// `anchor` is given for scheduler re-runs. Otherwise the listener is
    /// anchored to the enclosing binding, if any, or kept forever.
    fn run_derivation<T>(&self, compute: ComputeFn<T>, target: Signal<T>, anchor: Option<Anchor>)
    where
        T: Clone + PartialEq + 'static,
    {
        let rerun: RerunFn = {
            let compute = Rc::clone(&compute);
            let target = target.clone();
            Rc::new(move |runtime: &Runtime, anchor: Anchor| {
                runtime.run_derivation(Rc::clone(&compute), target.clone(), Some(anchor))
            })
        };

        let listener = Listener::new(rerun, anchor.unwrap_or(Anchor::Always));
        if anchor.is_none() {
            if let Some(pending) = self.inner.new_derives.borrow_mut().as_mut() {
                listener.set_anchor(Anchor::Detached);
                pending.push(Rc::clone(&listener));
            }
        }

        let (outcome, deps) = self.tracked_run(ComputationKind::Derivation, |()| compute(), ());

        // Written outside the scope so the write belongs to the caller.
        match outcome {
            Some(Ok(value)) => target.set(value),
            Some(Err(message)) => self.report_failure(ComputationKind::Derivation, message),
            None => {}
        }

        trace!(signal = %target.id(), reads = deps.read_count(), "derivation ran");
        self.register_edges(deps, |edges| edges.listeners.push(Rc::clone(&listener)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReactiveError;
    use crate::host::MemoryTree;
    use std::cell::Cell;

    fn runtime() -> Runtime {
        Runtime::new(Rc::new(MemoryTree::new()))
    }

    #[test]
    fn derive_computes_immediately() {
        let rt = runtime();
        let a = rt.signal(3);
        let a2 = a.clone();
        let squared = rt.derive(move || a2.get() * a2.get());

        assert_eq!(squared.get(), 9);
        assert_eq!(a.listener_count(), 1);
    }

    #[test]
    fn derive_tracks_changes() {
        let rt = runtime();
        let a = rt.signal(1);
        let b = rt.signal(2);
        let (a2, b2) = (a.clone(), b.clone());
        let sum = rt.derive(move || a2.get() + b2.get());

        a.set(10);
        rt.flush();
        assert_eq!(sum.get(), 12);

        b.set(20);
        rt.flush();
        assert_eq!(sum.get(), 30);
    }

    #[test]
    fn derive_into_uses_existing_target() {
        let rt = runtime();
        let source = rt.signal(1);
        let target = rt.signal(String::from("unset"));
        let s = source.clone();
        rt.derive_into(move || format!("v{}", s.get()), &target);

        assert_eq!(target.get(), "v1");

        source.set(2);
        rt.flush();
        assert_eq!(target.get(), "v2");
    }

    #[test]
    fn derive_reruns_only_on_change() {
        let rt = runtime();
        let runs = Rc::new(Cell::new(0));
        let a = rt.signal(1);
        let (a2, r) = (a.clone(), runs.clone());
        let _d = rt.derive(move || {
            r.set(r.get() + 1);
            a2.get()
        });
        assert_eq!(runs.get(), 1);

        a.set(1);
        rt.flush();
        assert_eq!(runs.get(), 1);

        a.set(2);
        rt.flush();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn try_derive_keeps_previous_value_on_error() {
        let rt = runtime();
        let input = rt.signal("4".to_string());
        let i = input.clone();
        let parsed = rt.try_derive(move || i.get().parse::<i64>());
        assert_eq!(parsed.get(), 4);

        input.set("four".to_string());
        rt.flush();

        assert_eq!(parsed.get(), 4);
        let diagnostics = rt.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics[0],
            ReactiveError::ComputationFailed {
                kind: ComputationKind::Derivation,
                ..
            }
        ));

        // Still subscribed after the failure.
        input.set("7".to_string());
        rt.flush();
        assert_eq!(parsed.get(), 7);
    }

    #[test]
    fn panicking_derivation_is_contained() {
        let rt = runtime();
        let a = rt.signal(1);
        let a2 = a.clone();
        let d = rt.derive(move || {
            let v = a2.get();
            if v == 0 {
                panic!("division by zero");
            }
            100 / v
        });
        assert_eq!(d.get(), 100);

        a.set(0);
        rt.flush();
        assert_eq!(d.get(), 100);
        assert_eq!(rt.take_diagnostics().len(), 1);

        a.set(4);
        rt.flush();
        assert_eq!(d.get(), 25);
    }

    #[test]
    fn self_written_signals_are_not_subscribed() {
        let rt = runtime();
        let a = rt.signal(1);
        let scratch = rt.signal(0);
        let (a2, s2) = (a.clone(), scratch.clone());
        let _d = rt.derive(move || {
            s2.set(a2.get());
            s2.get()
        });

        assert_eq!(a.listener_count(), 1);
        assert_eq!(scratch.listener_count(), 0);
    }
}
