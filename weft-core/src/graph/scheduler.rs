//! Update Scheduler
//!
//! The scheduler batches signal writes and applies them in one flush.
//!
//! # Algorithm
//!
//! 1. The first write to an observed signal opens the change set and
//!    schedules a flush. Later writes join the same set.
//! 2. Settle: starting from the changed signals that actually differ from
//!    their committed value, re-run every connected listener. Signals
//!    written during a round seed the next round. Stop when a round writes
//!    nothing, or after `max_settle_rounds` rounds.
//! 3. Commit: re-run the connected bindings of every dirty signal and swap
//!    their new fragments into the host tree.
//! 4. Snapshot every touched signal (`old = raw`) and close the change set.
//!
//! Derivations therefore always settle before any binding observes them.
//! Writes made by bindings during the commit open a fresh change set and
//! schedule the next flush; a flush never re-enters itself.

use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::error::{ReactiveError, Result};
use crate::reactive::{AnySignal, ChangeSet, Runtime};

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing to do.
    #[default]
    Idle,
    /// A flush is scheduled but has not started.
    Pending,
    /// Re-running derivations.
    Settling,
    /// Re-running bindings and committing values.
    Committing,
}

/// What one flush did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    /// Settle rounds run.
    pub rounds: usize,
    /// `false` if settling hit the round bound.
    pub converged: bool,
    pub derivations_run: usize,
    pub bindings_run: usize,
    pub signals_committed: usize,
}

impl FlushReport {
    /// A flush that found nothing to do.
    pub fn idle() -> Self {
        Self {
            rounds: 0,
            converged: true,
            derivations_run: 0,
            bindings_run: 0,
            signals_committed: 0,
        }
    }

    /// Turn a non-converged flush into an error.
    pub fn into_result(self) -> Result<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(ReactiveError::NonConvergence { rounds: self.rounds })
        }
    }
}

impl Runtime {
    /// Record a change to an observed signal.
    pub(crate) fn mark_changed(&self, signal: Rc<dyn AnySignal>) {
        let id = signal.id();
        trace!(signal = %id, "signal changed");

        if let Some(round) = self.inner.round.borrow_mut().as_mut() {
            round.entry(id).or_insert_with(|| Rc::clone(&signal));
        }

        let mut changed = self.inner.changed.borrow_mut();
        match changed.as_mut() {
            Some(set) => {
                set.entry(id).or_insert(signal);
            }
            None => {
                let mut set = ChangeSet::new();
                set.insert(id, signal);
                *changed = Some(set);
                drop(changed);
                self.schedule_flush();
            }
        }
    }

    fn schedule_flush(&self) {
        self.inner.flush_scheduled.set(true);
        if self.inner.phase.get() == Phase::Idle {
            self.inner.phase.set(Phase::Pending);
        }
        self.inner.wake.notify_one();
        trace!("flush scheduled");
    }

    /// Whether a flush has been scheduled and not run yet.
    pub fn has_pending_flush(&self) -> bool {
        self.inner.flush_scheduled.get()
    }

    /// Run scheduled flushes until none is left.
    ///
    /// A binding that writes signals during commit schedules a follow-up
    /// flush, which runs here as well.
    pub fn run_microtasks(&self) -> Vec<FlushReport> {
        let mut reports = Vec::new();
        while self.has_pending_flush() {
            reports.push(self.flush());
        }
        reports
    }

    /// Run scheduled flushes, then any timer that is due.
    pub fn tick(&self) -> Vec<FlushReport> {
        let reports = self.run_microtasks();
        self.run_timers(std::time::Instant::now());
        reports
    }

    /// Settle derivations and commit bindings for everything changed so far.
    ///
    /// Calling this while a flush is already running does nothing.
    pub fn flush(&self) -> FlushReport {
        if matches!(self.phase(), Phase::Settling | Phase::Committing) {
            return FlushReport::idle();
        }
        self.inner.flush_scheduled.set(false);

        let mut report = FlushReport::idle();
        self.settle(&mut report);
        self.commit(&mut report);

        let next = if self.has_pending_flush() {
            Phase::Pending
        } else {
            Phase::Idle
        };
        self.inner.phase.set(next);

        debug!(
            rounds = report.rounds,
            derivations = report.derivations_run,
            bindings = report.bindings_run,
            signals = report.signals_committed,
            converged = report.converged,
            "flush complete"
        );
        report
    }

    fn settle(&self, report: &mut FlushReport) {
        self.inner.phase.set(Phase::Settling);
        let max_rounds = self.inner.config.max_settle_rounds;

        let mut pending: Vec<Rc<dyn AnySignal>> = match self.inner.changed.borrow().as_ref() {
            Some(changed) => changed.values().filter(|s| s.is_dirty()).cloned().collect(),
            None => Vec::new(),
        };

        loop {
            let listeners = self.live_listeners(&pending);
            if listeners.is_empty() {
                break;
            }
            if report.rounds >= max_rounds {
                report.converged = false;
                warn!(rounds = report.rounds, "derivations did not settle, committing anyway");
                self.report(ReactiveError::NonConvergence {
                    rounds: report.rounds,
                });
                break;
            }

            self.inner.round.replace(Some(ChangeSet::new()));
            for listener in listeners {
                listener.run(self);
                listener.retire();
                report.derivations_run += 1;
            }
            report.rounds += 1;

            pending = self
                .inner
                .round
                .take()
                .map(|round| round.into_values().collect())
                .unwrap_or_default();
        }
    }

    fn commit(&self, report: &mut FlushReport) {
        self.inner.phase.set(Phase::Committing);

        let touched: Vec<Rc<dyn AnySignal>> = self
            .inner
            .changed
            .take()
            .map(|changed| changed.into_values().collect())
            .unwrap_or_default();
        let dirty: Vec<Rc<dyn AnySignal>> =
            touched.iter().filter(|s| s.is_dirty()).cloned().collect();

        for binding in self.live_bindings(&dirty) {
            // An earlier binding in this commit may have detached this one.
            if !self.is_anchor_connected(binding.anchor()) {
                continue;
            }
            let Some(previous) = binding.output() else {
                continue;
            };
            let output = self.run_binding(binding.render(), Some(&previous));
            self.replace_fragment(&previous, &output);
            binding.retire();
            report.bindings_run += 1;
        }

        // Signals rewritten by a binding stay dirty for the follow-up flush.
        let rewritten = self.inner.changed.borrow();
        for signal in &touched {
            if rewritten.as_ref().is_some_and(|set| set.contains_key(&signal.id())) {
                continue;
            }
            signal.commit();
            report.signals_committed += 1;
        }
    }
}
