//! Bindings
//!
//! A binding maps a reactive computation onto a fragment of the host tree.
//! The binding function receives the node it previously produced (if that
//! output was a single node) and returns a [`Fragment`]. Whenever a signal it
//! read changes, the scheduler re-runs it during the commit phase and swaps
//! the new output in where the old one was.
//!
//! | Returned fragment | Placed as                                    |
//! |-------------------|----------------------------------------------|
//! | `Node`            | the node itself                              |
//! | `Text`            | a new text node                              |
//! | `List`            | a [`ListRegion`], updated in place on re-run |
//! | `Empty`           | a placeholder marker holding the position    |

use std::rc::Rc;

use tracing::trace;

use super::subscriber::{Anchor, Binding};
use super::Runtime;
use crate::error::ComputationKind;
use crate::host::{BindFn, Child, Fragment, FragmentHandle, ListRegion, NodeRef};

impl Runtime {
    /// Bind a computation to a host-tree fragment.
    ///
    /// The returned handle is not placed anywhere; attach it to a connected
    /// parent, otherwise the binding is pruned by the next flush or sweep.
    pub fn bind<F>(&self, f: F) -> FragmentHandle
    where
        F: Fn(Option<NodeRef>) -> Fragment + 'static,
    {
        self.run_binding(Rc::new(f), None)
    }

    /// Append children to `parent`, binding any signals and computations.
    ///
    /// List fragments are expanded into their marker-bracketed run.
    pub fn attach<I>(&self, parent: NodeRef, children: I) -> NodeRef
    where
        I: IntoIterator,
        I::Item: Into<Child>,
    {
        for child in children {
            self.attach_child(parent, child.into());
        }
        parent
    }

    /// Bind `f` against a node that already exists in the tree.
    ///
    /// `f` is handed `existing` on its first run; if it returns it
    /// unchanged the node is adopted in place, otherwise the output
    /// replaces it.
    pub fn hydrate<F>(&self, existing: NodeRef, f: F) -> FragmentHandle
    where
        F: Fn(Option<NodeRef>) -> Fragment + 'static,
    {
        let previous = FragmentHandle::Node(existing);
        let output = self.run_binding(Rc::new(f), Some(&previous));
        self.replace_fragment(&previous, &output);
        output
    }

    fn attach_child(&self, parent: NodeRef, child: Child) {
        let host = self.host();
        match child {
            Child::Empty => {}
            Child::Primitive(value) => {
                let text = host.create_text(&value.to_string());
                host.append_child(parent, text);
            }
            Child::Node(node) => host.append_child(parent, node),
            Child::Fragment(handle) => self.append_handle(parent, &handle),
            Child::Signal(source) => {
                let handle = self.bind(move |_| source.read_fragment());
                self.append_handle(parent, &handle);
            }
            Child::Computation(render) => {
                let handle = self.run_binding(render, None);
                self.append_handle(parent, &handle);
            }
            Child::List(children) => {
                for child in children {
                    self.attach_child(parent, child);
                }
            }
        }
    }

    fn append_handle(&self, parent: NodeRef, handle: &FragmentHandle) {
        for node in handle.placement() {
            self.host().append_child(parent, node);
        }
    }

    /// Run one binding and subscribe a fresh [`Binding`] to what it read.
    ///
    /// A failed run keeps `previous` as its output.
    pub(crate) fn run_binding(
        &self,
        render: BindFn,
        previous: Option<&FragmentHandle>,
    ) -> FragmentHandle {
        let outer = self.inner.new_derives.replace(Some(Vec::new()));
        let (fragment, deps) = self.tracked_run(
            ComputationKind::Binding,
            |prev| render(prev),
            previous.and_then(FragmentHandle::node),
        );
        let created = self.inner.new_derives.replace(outer).unwrap_or_default();

        let output = match fragment {
            Some(fragment) => self.materialize(fragment, previous),
            None => match previous {
                Some(previous) => previous.clone(),
                None => FragmentHandle::Placeholder(self.host().create_marker("empty")),
            },
        };

        let binding = Binding::new(Rc::clone(&render), output.clone());
        trace!(node = %output.identity(), reads = deps.read_count(), "binding ran");
        self.register_edges(deps, |edges| edges.bindings.push(Rc::clone(&binding)));

        let anchor = Anchor::Node(output.identity());
        for listener in created {
            listener.set_anchor(anchor);
        }
        output
    }

    fn materialize(&self, fragment: Fragment, previous: Option<&FragmentHandle>) -> FragmentHandle {
        let host = self.host();
        match fragment {
            Fragment::Empty => match previous {
                Some(FragmentHandle::Placeholder(marker)) => FragmentHandle::Placeholder(*marker),
                _ => FragmentHandle::Placeholder(host.create_marker("empty")),
            },
            Fragment::Node(node) => FragmentHandle::Node(node),
            Fragment::Text(text) => FragmentHandle::Node(host.create_text(&text)),
            list @ Fragment::List(_) => {
                let mut nodes = Vec::new();
                list.flatten_into(host, &mut nodes);
                match previous.and_then(FragmentHandle::list) {
                    Some(region) => {
                        region.update(host, nodes);
                        FragmentHandle::List(Rc::clone(region))
                    }
                    None => FragmentHandle::List(ListRegion::create(host, nodes)),
                }
            }
        }
    }

    /// Put `new` where `old` currently is.
    pub(crate) fn replace_fragment(&self, old: &FragmentHandle, new: &FragmentHandle) {
        if old == new {
            return;
        }
        let host = self.host();
        match (old, new) {
            (FragmentHandle::List(region), _) => {
                new.insert_before(host, region.start());
                old.remove(host);
            }
            (_, FragmentHandle::List(region)) => {
                // The new run may reuse the old node, so it cannot serve as
                // the insertion reference. The end marker takes its slot.
                let end = region.end();
                host.replace_node(old.identity(), end);
                if let Some(parent) = host.parent(end) {
                    host.insert_before(parent, region.start(), end);
                    for node in region.nodes() {
                        host.insert_before(parent, node, end);
                    }
                }
            }
            _ => host.replace_node(old.identity(), new.identity()),
        }
    }
}
