//! Fragments
//!
//! [`Fragment`] is what a binding function returns. [`FragmentHandle`] is
//! what the runtime hands back after placing it: a single node, an empty
//! placeholder, or a list region. [`Child`] is the tagged input accepted by
//! `Runtime::attach`.

use std::fmt;
use std::rc::Rc;

use super::{HostTree, ListRegion, NodeRef, Primitive};
use crate::reactive::Signal;

/// Output of a binding function.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Fragment {
    /// No content.
    #[default]
    Empty,
    /// An existing host node.
    Node(NodeRef),
    /// Text, materialized as a new text node.
    Text(String),
    /// A run of sibling fragments. Nested lists are flattened.
    List(Vec<Fragment>),
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Fragment::Text(text.into())
    }

    pub fn list<I, F>(items: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Fragment>,
    {
        Fragment::List(items.into_iter().map(Into::into).collect())
    }

    /// Flatten nested lists into host nodes, creating text nodes on the way.
    /// Empty items are dropped.
    pub(crate) fn flatten_into(self, host: &dyn HostTree, out: &mut Vec<NodeRef>) {
        match self {
            Fragment::Empty => {}
            Fragment::Node(node) => out.push(node),
            Fragment::Text(text) => out.push(host.create_text(&text)),
            Fragment::List(items) => {
                for item in items {
                    item.flatten_into(host, out);
                }
            }
        }
    }
}

impl From<()> for Fragment {
    fn from(_: ()) -> Self {
        Fragment::Empty
    }
}

impl From<NodeRef> for Fragment {
    fn from(node: NodeRef) -> Self {
        Fragment::Node(node)
    }
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Fragment::Text(text.to_owned())
    }
}

impl From<String> for Fragment {
    fn from(text: String) -> Self {
        Fragment::Text(text)
    }
}

impl From<Primitive> for Fragment {
    fn from(p: Primitive) -> Self {
        Fragment::Text(p.to_string())
    }
}

impl From<i64> for Fragment {
    fn from(n: i64) -> Self {
        Fragment::Text(n.to_string())
    }
}

impl From<i32> for Fragment {
    fn from(n: i32) -> Self {
        Fragment::Text(n.to_string())
    }
}

impl From<u32> for Fragment {
    fn from(n: u32) -> Self {
        Fragment::Text(n.to_string())
    }
}

impl From<usize> for Fragment {
    fn from(n: usize) -> Self {
        Fragment::Text(n.to_string())
    }
}

impl From<f64> for Fragment {
    fn from(n: f64) -> Self {
        Fragment::Text(n.to_string())
    }
}

impl From<bool> for Fragment {
    fn from(b: bool) -> Self {
        Fragment::Text(b.to_string())
    }
}

impl<T: Into<Fragment>> From<Option<T>> for Fragment {
    fn from(value: Option<T>) -> Self {
        value.map_or(Fragment::Empty, Into::into)
    }
}

impl<T: Into<Fragment>> From<Vec<T>> for Fragment {
    fn from(items: Vec<T>) -> Self {
        Fragment::list(items)
    }
}

/// A fragment placed by the runtime.
///
/// The identity node is what the scheduler tracks for replacement and what
/// decides connectivity for garbage collection.
#[derive(Debug, Clone)]
pub enum FragmentHandle {
    /// A single content node.
    Node(NodeRef),
    /// The binding currently has no content; the marker holds its position.
    Placeholder(NodeRef),
    /// A marker-bracketed run of nodes.
    List(Rc<ListRegion>),
}

impl FragmentHandle {
    /// The node standing for the whole fragment.
    pub fn identity(&self) -> NodeRef {
        match self {
            FragmentHandle::Node(node) | FragmentHandle::Placeholder(node) => *node,
            FragmentHandle::List(region) => region.start(),
        }
    }

    /// The content node, if this fragment is a single node.
    pub fn node(&self) -> Option<NodeRef> {
        match self {
            FragmentHandle::Node(node) => Some(*node),
            _ => None,
        }
    }

    pub fn list(&self) -> Option<&Rc<ListRegion>> {
        match self {
            FragmentHandle::List(region) => Some(region),
            _ => None,
        }
    }

    /// Whether the binding produced no content.
    pub fn is_empty(&self) -> bool {
        matches!(self, FragmentHandle::Placeholder(_))
    }

    /// Nodes to append, in order, to place this fragment.
    pub fn placement(&self) -> Vec<NodeRef> {
        match self {
            FragmentHandle::Node(node) | FragmentHandle::Placeholder(node) => vec![*node],
            FragmentHandle::List(region) => region.placement(),
        }
    }

    pub(crate) fn insert_before(&self, host: &dyn HostTree, reference: NodeRef) {
        match self {
            FragmentHandle::List(region) => {
                region.insert_before(host, reference);
            }
            _ => {
                if let Some(parent) = host.parent(reference) {
                    host.insert_before(parent, self.identity(), reference);
                }
            }
        }
    }

    pub(crate) fn remove(&self, host: &dyn HostTree) {
        match self {
            FragmentHandle::List(region) => region.remove(host),
            _ => host.remove_node(self.identity()),
        }
    }
}

impl PartialEq for FragmentHandle {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for FragmentHandle {}

/// A signal that can be rendered directly as a child.
pub trait SignalSource {
    fn read_fragment(&self) -> Fragment;
}

impl<T> SignalSource for Signal<T>
where
    T: Clone + PartialEq + Into<Fragment> + 'static,
{
    fn read_fragment(&self) -> Fragment {
        self.get().into()
    }
}

/// A binding function: receives the previous content node, if any.
pub type BindFn = Rc<dyn Fn(Option<NodeRef>) -> Fragment>;

/// A child passed to `Runtime::attach`.
#[derive(Clone)]
pub enum Child {
    Empty,
    Primitive(Primitive),
    Node(NodeRef),
    /// An already-produced fragment.
    Fragment(FragmentHandle),
    /// A signal rendered through an implicit binding.
    Signal(Rc<dyn SignalSource>),
    /// A binding function.
    Computation(BindFn),
    List(Vec<Child>),
}

impl Child {
    pub fn signal<T>(signal: &Signal<T>) -> Self
    where
        T: Clone + PartialEq + Into<Fragment> + 'static,
    {
        Child::Signal(Rc::new(signal.clone()))
    }

    pub fn computation<F>(f: F) -> Self
    where
        F: Fn(Option<NodeRef>) -> Fragment + 'static,
    {
        Child::Computation(Rc::new(f))
    }
}

impl From<NodeRef> for Child {
    fn from(node: NodeRef) -> Self {
        Child::Node(node)
    }
}

impl From<FragmentHandle> for Child {
    fn from(handle: FragmentHandle) -> Self {
        Child::Fragment(handle)
    }
}

impl From<Primitive> for Child {
    fn from(p: Primitive) -> Self {
        Child::Primitive(p)
    }
}

impl From<&str> for Child {
    fn from(s: &str) -> Self {
        Child::Primitive(s.into())
    }
}

impl From<String> for Child {
    fn from(s: String) -> Self {
        Child::Primitive(s.into())
    }
}

impl From<i64> for Child {
    fn from(n: i64) -> Self {
        Child::Primitive(n.into())
    }
}

impl From<Vec<Child>> for Child {
    fn from(children: Vec<Child>) -> Self {
        Child::List(children)
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(value: Option<T>) -> Self {
        value.map_or(Child::Empty, Into::into)
    }
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Empty => f.write_str("Empty"),
            Child::Primitive(p) => f.debug_tuple("Primitive").field(p).finish(),
            Child::Node(n) => f.debug_tuple("Node").field(n).finish(),
            Child::Fragment(h) => f.debug_tuple("Fragment").field(h).finish(),
            Child::Signal(_) => f.write_str("Signal(..)"),
            Child::Computation(_) => f.write_str("Computation(..)"),
            Child::List(items) => f.debug_tuple("List").field(items).finish(),
        }
    }
}
