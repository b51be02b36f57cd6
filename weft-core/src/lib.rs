//! Weft Core
//!
//! This crate provides the core runtime for the weft fine-grained reactive
//! UI engine. It implements:
//!
//! - Reactive primitives (signals, derivations, bindings)
//! - A batched update scheduler that settles derivations before committing
//! - Marker-bracketed list regions for list-valued bindings
//! - Periodic pruning of dependency edges to disconnected consumers
//!
//! The host tree (typically a DOM) is an external collaborator reached
//! through the [`HostTree`] trait. [`MemoryTree`] is an in-memory
//! implementation for tests and headless use.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: the runtime, signals, dependency tracking, derivations and bindings
//! - `graph`: the update scheduler and the edge garbage collector
//! - `host`: the host-tree interface, fragments and list regions
//! - `driver`: an async loop running flushes and sweeps on `tokio`
//! - `config`, `error`: runtime configuration and error types
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use weft_core::{Child, MemoryTree, Runtime};
//!
//! let tree = Rc::new(MemoryTree::new());
//! let rt = Runtime::new(tree.clone());
//!
//! // Create a signal
//! let count = rt.signal(0i64);
//!
//! // Create a derived value
//! let c = count.clone();
//! let doubled = rt.derive(move || c.get() * 2);
//!
//! // Bind it into the tree
//! let root = tree.document();
//! rt.attach(root, vec![Child::from("doubled: "), Child::signal(&doubled)]);
//!
//! // Update the signal and flush
//! count.set(5);
//! rt.flush();
//! assert_eq!(tree.text_content(root), "doubled: 10");
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod graph;
pub mod host;
pub mod reactive;

pub use config::Config;
pub use error::{ComputationKind, ReactiveError, Result};
pub use graph::{FlushReport, Phase};
pub use host::{
    Child, Event, EventHandler, Fragment, FragmentHandle, HostError, HostTree, ListRegion,
    MemoryTree, NodeRef, Primitive, PropValue,
};
pub use reactive::{Runtime, Signal, SignalId};
