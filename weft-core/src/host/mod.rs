//! Host Tree
//!
//! The host tree is the external mutable tree (typically a document object
//! model) that bindings write into. The core never inspects tree contents
//! beyond node identity and connectivity; everything else is delegated to
//! an implementation of [`HostTree`].
//!
//! # Modules
//!
//! - `fragment`: what binding functions return and what `bind` hands back
//! - `list`: marker-bracketed regions for list-valued bindings
//! - `memory`: an in-memory host tree used by tests and headless embedders

mod fragment;
mod list;
mod memory;

pub use fragment::{BindFn, Child, Fragment, FragmentHandle, SignalSource};
pub use list::ListRegion;
pub use memory::MemoryTree;

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

/// Opaque handle to a node owned by the host tree.
///
/// Handles are issued by the host and compared by identity only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(u64);

impl NodeRef {
    /// Wrap a host-issued raw identifier.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw identifier value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A primitive value that can be rendered as text or assigned as a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Str(s) => f.write_str(s),
            Primitive::Int(n) => write!(f, "{n}"),
            Primitive::Float(n) => write!(f, "{n}"),
            Primitive::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Primitive {
    fn from(s: &str) -> Self {
        Primitive::Str(s.to_owned())
    }
}

impl From<String> for Primitive {
    fn from(s: String) -> Self {
        Primitive::Str(s)
    }
}

impl From<i64> for Primitive {
    fn from(n: i64) -> Self {
        Primitive::Int(n)
    }
}

impl From<i32> for Primitive {
    fn from(n: i32) -> Self {
        Primitive::Int(i64::from(n))
    }
}

impl From<u32> for Primitive {
    fn from(n: u32) -> Self {
        Primitive::Int(i64::from(n))
    }
}

impl From<f64> for Primitive {
    fn from(n: f64) -> Self {
        Primitive::Float(n)
    }
}

impl From<bool> for Primitive {
    fn from(b: bool) -> Self {
        Primitive::Bool(b)
    }
}

/// A property value handed to [`HostTree::set_property`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropValue {
    #[default]
    Null,
    Primitive(Primitive),
}

impl From<Primitive> for PropValue {
    fn from(p: Primitive) -> Self {
        PropValue::Primitive(p)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Primitive(s.into())
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Primitive(s.into())
    }
}

impl From<i64> for PropValue {
    fn from(n: i64) -> Self {
        PropValue::Primitive(n.into())
    }
}

impl From<f64> for PropValue {
    fn from(n: f64) -> Self {
        PropValue::Primitive(n.into())
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Primitive(b.into())
    }
}

impl From<Option<Primitive>> for PropValue {
    fn from(p: Option<Primitive>) -> Self {
        p.map_or(PropValue::Null, PropValue::Primitive)
    }
}

/// An event delivered to an [`EventHandler`].
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub target: NodeRef,
}

/// A host event callback.
///
/// Handlers compare by identity, so the same handler can later be removed
/// from the node it was registered on.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Event) + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    fn addr(&self) -> *const u8 {
        Rc::as_ptr(&self.0) as *const u8
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventHandler").field(&self.addr()).finish()
    }
}

/// Errors raised by a host tree implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("unknown node {0}")]
    UnknownNode(NodeRef),

    #[error("invalid property `{key}` on node {node}")]
    InvalidProperty { node: NodeRef, key: String },

    #[error("node {0} does not accept properties")]
    NotAnElement(NodeRef),
}

/// The external tree the core writes into.
///
/// All methods take `&self`; implementations are expected to use interior
/// mutability, since binding functions may create nodes while the runtime
/// is in the middle of a flush.
pub trait HostTree {
    /// Create an element node of the given kind, optionally namespaced.
    fn create_node(&self, kind: &str, namespace: Option<&str>) -> NodeRef;

    /// Create a text node.
    fn create_text(&self, text: &str) -> NodeRef;

    /// Create an invisible marker node (a comment in a DOM).
    fn create_marker(&self, label: &str) -> NodeRef;

    fn set_property(&self, node: NodeRef, key: &str, value: &PropValue) -> Result<(), HostError>;

    fn remove_property(&self, node: NodeRef, key: &str) -> Result<(), HostError>;

    fn add_event_listener(&self, node: NodeRef, event: &str, handler: &EventHandler);

    fn remove_event_listener(&self, node: NodeRef, event: &str, handler: &EventHandler);

    /// Append `child` as the last child of `parent`, detaching it first.
    fn append_child(&self, parent: NodeRef, child: NodeRef);

    /// Insert `node` into `parent` immediately before `reference`.
    fn insert_before(&self, parent: NodeRef, node: NodeRef, reference: NodeRef);

    /// Put `new` where `old` is and detach `old`. No-op if `old` has no parent.
    fn replace_node(&self, old: NodeRef, new: NodeRef);

    /// Detach `node` from its parent.
    fn remove_node(&self, node: NodeRef);

    /// Whether `node` is reachable from the tree's root.
    fn is_connected(&self, node: NodeRef) -> bool;

    fn parent(&self, node: NodeRef) -> Option<NodeRef>;

    fn next_sibling(&self, node: NodeRef) -> Option<NodeRef>;
}
