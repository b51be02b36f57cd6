//! Dependency Graph Maintenance
//!
//! The dependency graph itself is distributed: each signal owns the edge
//! lists of the computations that read it. This module implements the two
//! processes that walk those edges.
//!
//! # Overview
//!
//! - `scheduler`: batches writes into flushes, settles derivations round by
//!   round, then commits bindings and snapshots signal values
//! - `gc`: prunes edges to subscribers that were retired or whose output
//!   left the host tree
//!
//! # Design Decisions
//!
//! 1. Edges live on the signals rather than in a central graph, so a write
//!    finds its dependents without a lookup.
//!
//! 2. Edges are never removed eagerly. A re-run registers fresh edges and
//!    retires the old subscriber; pruning drops it later. This keeps a
//!    re-run free of bookkeeping for the edges it no longer needs.
//!
//! 3. All edge lists are snapshotted before iteration, since running a
//!    subscriber appends to the very lists being walked.

mod gc;
mod scheduler;

pub use scheduler::{FlushReport, Phase};
