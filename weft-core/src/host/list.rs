//! List Regions
//!
//! A binding may yield a variable-length run of sibling nodes with no owning
//! wrapper element. The run is bracketed by two marker nodes; the start
//! marker is the region's stable identity, so the scheduler can track and
//! replace the whole run as a unit.
//!
//! Updates are a full replace of everything between the markers. Items that
//! appear in both the old and new sequence are not moved or reused.

use std::cell::RefCell;
use std::rc::Rc;

use super::{HostTree, NodeRef};

/// A marker-bracketed run of sibling nodes.
///
/// Invariant: once placed, the nodes physically between `start` and `end`
/// equal `nodes()`, in order.
#[derive(Debug)]
pub struct ListRegion {
    start: NodeRef,
    end: NodeRef,
    nodes: RefCell<Vec<NodeRef>>,
}

impl ListRegion {
    /// Allocate two fresh markers around `nodes`.
    ///
    /// Nothing is placed in the tree; callers put `placement()` into a
    /// parent contiguously.
    pub fn create(host: &dyn HostTree, nodes: Vec<NodeRef>) -> Rc<Self> {
        Rc::new(Self {
            start: host.create_marker("list-start"),
            end: host.create_marker("list-end"),
            nodes: RefCell::new(nodes),
        })
    }

    pub fn start(&self) -> NodeRef {
        self.start
    }

    pub fn end(&self) -> NodeRef {
        self.end
    }

    /// The content nodes currently owned by the region.
    pub fn nodes(&self) -> Vec<NodeRef> {
        self.nodes.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    /// Start marker, content nodes, end marker.
    pub fn placement(&self) -> Vec<NodeRef> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::with_capacity(nodes.len() + 2);
        out.push(self.start);
        out.extend(nodes.iter().copied());
        out.push(self.end);
        out
    }

    /// Place the whole region immediately before `reference`.
    ///
    /// Returns `false` if `reference` has no parent.
    pub fn insert_before(&self, host: &dyn HostTree, reference: NodeRef) -> bool {
        let Some(parent) = host.parent(reference) else {
            return false;
        };
        for node in self.placement() {
            host.insert_before(parent, node, reference);
        }
        true
    }

    /// Replace the region's content with `new_nodes`.
    ///
    /// If the markers are not placed yet, only the stored sequence changes.
    pub fn update(&self, host: &dyn HostTree, new_nodes: Vec<NodeRef>) {
        if let Some(parent) = host.parent(self.start) {
            self.clear_interior(host);
            for node in &new_nodes {
                host.insert_before(parent, *node, self.end);
            }
        }
        *self.nodes.borrow_mut() = new_nodes;
    }

    /// Remove the content nodes and both markers from the tree.
    pub fn remove(&self, host: &dyn HostTree) {
        self.clear_interior(host);
        host.remove_node(self.start);
        host.remove_node(self.end);
    }

    fn clear_interior(&self, host: &dyn HostTree) {
        let mut current = host.next_sibling(self.start);
        while let Some(node) = current {
            if node == self.end {
                break;
            }
            current = host.next_sibling(node);
            host.remove_node(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryTree;

    fn texts(tree: &MemoryTree, items: &[&str]) -> Vec<NodeRef> {
        items.iter().map(|s| tree.create_text(s)).collect()
    }

    #[test]
    fn create_allocates_distinct_markers() {
        let tree = MemoryTree::new();
        let a = ListRegion::create(&tree, vec![]);
        let b = ListRegion::create(&tree, vec![]);

        assert_ne!(a.start(), a.end());
        assert_ne!(a.start(), b.start());
        assert!(tree.is_marker(a.start()));
        assert!(a.is_empty());
    }

    #[test]
    fn update_replaces_interior() {
        let tree = MemoryTree::new();
        let root = tree.document();
        let region = ListRegion::create(&tree, texts(&tree, &["1", "2", "3"]));
        for node in region.placement() {
            tree.append_child(root, node);
        }
        let old = region.nodes();

        region.update(&tree, texts(&tree, &["1", "2", "3", "4"]));

        assert_eq!(region.len(), 4);
        assert_eq!(tree.text_content(root), "1234");
        assert_eq!(tree.children(root), region.placement());
        assert!(old.iter().all(|n| !tree.is_connected(*n)));
    }

    #[test]
    fn update_leaves_surrounding_siblings_alone() {
        let tree = MemoryTree::new();
        let root = tree.document();
        let before = tree.create_text("<");
        let after = tree.create_text(">");
        tree.append_child(root, before);
        let region = ListRegion::create(&tree, texts(&tree, &["a"]));
        for node in region.placement() {
            tree.append_child(root, node);
        }
        tree.append_child(root, after);

        region.update(&tree, texts(&tree, &["b", "c"]));
        assert_eq!(tree.text_content(root), "<bc>");

        region.update(&tree, vec![]);
        assert_eq!(tree.text_content(root), "<>");
        assert_eq!(tree.children(root).len(), 4);
    }

    #[test]
    fn insert_before_and_remove() {
        let tree = MemoryTree::new();
        let root = tree.document();
        let anchor = tree.create_text("x");
        tree.append_child(root, anchor);

        let region = ListRegion::create(&tree, texts(&tree, &["a", "b"]));
        assert!(region.insert_before(&tree, anchor));
        assert_eq!(tree.text_content(root), "abx");

        region.remove(&tree);
        assert_eq!(tree.children(root), vec![anchor]);
        assert!(!tree.is_connected(region.start()));
    }

    #[test]
    fn unplaced_update_only_stores() {
        let tree = MemoryTree::new();
        let region = ListRegion::create(&tree, vec![]);
        let fresh = texts(&tree, &["q"]);

        region.update(&tree, fresh.clone());
        assert_eq!(region.nodes(), fresh);
        assert!(!region.insert_before(&tree, tree.create_text("detached")));
    }
}
