//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, derivations and
//! bindings. These primitives form the foundation of weft's fine-grained
//! reactivity.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracked computation, the signal records that computation as a
//! dependent. When the signal's value changes, the runtime schedules a flush
//! that re-runs every dependent.
//!
//! ## Derivations
//!
//! A Derivation computes a value from other signals and writes it into a
//! target signal. Derivations are eager and settle before any binding runs,
//! so bindings never observe a half-updated graph.
//!
//! ## Bindings
//!
//! A Binding maps a computation onto a fragment of the host tree: a node, a
//! placeholder, or a marker-bracketed list region. On change the fragment is
//! replaced in place.
//!
//! # Implementation Notes
//!
//! Every run of a computation creates a fresh subscriber and registers it on
//! the signals that run read; the previous subscriber is retired. Stale
//! edges are pruned lazily, when a flush walks a changed signal and by the
//! periodic sweep in [`crate::graph`].

mod bind;
mod context;
mod derive;
mod props;
mod runtime;
mod signal;
mod subscriber;

pub use runtime::Runtime;
pub use signal::{Signal, SignalId};
pub use subscriber::SubscriberId;

pub(crate) use runtime::ChangeSet;
pub(crate) use signal::AnySignal;
pub(crate) use subscriber::{Binding, Listener};
