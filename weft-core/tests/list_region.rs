//! Property tests for list regions.

use std::rc::Rc;

use proptest::prelude::*;

use weft_core::{HostTree, ListRegion, MemoryTree, NodeRef, Runtime};

fn interior(tree: &MemoryTree, region: &ListRegion) -> Vec<NodeRef> {
    let mut out = Vec::new();
    let mut current = tree.next_sibling(region.start());
    while let Some(node) = current {
        if node == region.end() {
            break;
        }
        out.push(node);
        current = tree.next_sibling(node);
    }
    out
}

fn sequences() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec("[a-z]{1,3}", 0..6), 1..8)
}

proptest! {
    /// Whatever the update sequence, the nodes between the markers are the stored ones.
    #[test]
    fn interior_matches_stored_nodes(updates in sequences()) {
        let tree = MemoryTree::new();
        let root = tree.document();
        let head = tree.create_text("<");
        let tail = tree.create_text(">");
        tree.append_child(root, head);
        let region = ListRegion::create(&tree, Vec::new());
        for node in region.placement() {
            tree.append_child(root, node);
        }
        tree.append_child(root, tail);

        for items in updates {
            let nodes: Vec<NodeRef> = items.iter().map(|s| tree.create_text(s)).collect();
            region.update(&tree, nodes.clone());

            prop_assert_eq!(interior(&tree, &region), nodes);
            prop_assert_eq!(tree.text_content(root), format!("<{}>", items.concat()));
            let children = tree.children(root);
            prop_assert_eq!(children.first(), Some(&head));
            prop_assert_eq!(children.last(), Some(&tail));
            prop_assert_eq!(children.len(), items.len() + 4);
        }
    }

    /// A list binding renders every value of its signal, flush after flush.
    #[test]
    fn list_binding_tracks_signal(updates in sequences()) {
        let tree = Rc::new(MemoryTree::new());
        let rt = Runtime::new(tree.clone());
        let root = tree.document();
        let items = rt.signal(Vec::<String>::new());
        let i = items.clone();
        let handle = rt.bind(move |_| i.get().into());
        rt.attach(root, [handle.clone()]);

        for next in updates {
            items.set(next.clone());
            rt.flush();

            prop_assert_eq!(tree.text_content(root), next.concat());
            let region = handle.list().expect("list output");
            prop_assert_eq!(interior(&tree, region), region.nodes());
            prop_assert!(!items.is_dirty());
        }
    }
}
