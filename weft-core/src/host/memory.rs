//! In-Memory Host Tree
//!
//! A small arena-backed tree that implements [`HostTree`]. Node 0 is the
//! document root; a node is connected when its parent chain reaches it.

use std::cell::RefCell;

use indexmap::IndexMap;

use super::{Event, EventHandler, HostError, HostTree, NodeRef, PropValue};

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element { tag: String, namespace: Option<String> },
    Text(String),
    Marker(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
    props: IndexMap<String, PropValue>,
    handlers: Vec<(String, EventHandler)>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            props: IndexMap::new(),
            handlers: Vec::new(),
        }
    }
}

/// An in-memory [`HostTree`].
#[derive(Debug)]
pub struct MemoryTree {
    nodes: RefCell<Vec<NodeData>>,
}

impl MemoryTree {
    /// Create a tree holding only the document root.
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(vec![NodeData::new(NodeKind::Document)]),
        }
    }

    /// The document root. Always connected.
    pub fn document(&self) -> NodeRef {
        NodeRef::from_raw(0)
    }

    /// Total number of nodes ever created, including the document.
    pub fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.nodes
            .borrow()
            .get(index(node))
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// The text of a text node, `None` for any other kind.
    pub fn text(&self, node: NodeRef) -> Option<String> {
        match self.nodes.borrow().get(index(node)).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => Some(text.clone()),
            _ => None,
        }
    }

    pub fn tag(&self, node: NodeRef) -> Option<String> {
        match self.nodes.borrow().get(index(node)).map(|n| &n.kind) {
            Some(NodeKind::Element { tag, .. }) => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn namespace(&self, node: NodeRef) -> Option<String> {
        match self.nodes.borrow().get(index(node)).map(|n| &n.kind) {
            Some(NodeKind::Element { namespace, .. }) => namespace.clone(),
            _ => None,
        }
    }

    pub fn is_marker(&self, node: NodeRef) -> bool {
        matches!(
            self.nodes.borrow().get(index(node)).map(|n| &n.kind),
            Some(NodeKind::Marker(_))
        )
    }

    pub fn property(&self, node: NodeRef, key: &str) -> Option<PropValue> {
        self.nodes
            .borrow()
            .get(index(node))
            .and_then(|n| n.props.get(key).cloned())
    }

    pub fn handler_count(&self, node: NodeRef, event: &str) -> usize {
        self.nodes
            .borrow()
            .get(index(node))
            .map(|n| n.handlers.iter().filter(|(e, _)| e == event).count())
            .unwrap_or(0)
    }

    /// Invoke every handler registered for `event` on `node`.
    ///
    /// Returns the number of handlers called.
    pub fn dispatch(&self, node: NodeRef, event: &str) -> usize {
        // Handlers may mutate the tree, so release the borrow first.
        let handlers: Vec<EventHandler> = self
            .nodes
            .borrow()
            .get(index(node))
            .map(|n| {
                n.handlers
                    .iter()
                    .filter(|(e, _)| e == event)
                    .map(|(_, h)| h.clone())
                    .collect()
            })
            .unwrap_or_default();

        let payload = Event {
            name: event.to_owned(),
            target: node,
        };
        for handler in &handlers {
            handler.call(&payload);
        }
        handlers.len()
    }

    /// Concatenated text of all text descendants, markers excluded.
    pub fn text_content(&self, node: NodeRef) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeRef, out: &mut String) {
        if let Some(text) = self.text(node) {
            out.push_str(&text);
            return;
        }
        for child in self.children(node) {
            self.collect_text(child, out);
        }
    }

    /// Render a subtree as compact markup, e.g. `<ul><!--s-->a<!--e--></ul>`.
    ///
    /// Properties are not rendered.
    pub fn to_markup(&self, node: NodeRef) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn write_markup(&self, node: NodeRef, out: &mut String) {
        let kind = match self.nodes.borrow().get(index(node)) {
            Some(data) => data.kind.clone(),
            None => return,
        };
        match kind {
            NodeKind::Text(text) => out.push_str(&text),
            NodeKind::Marker(label) => {
                out.push_str("<!--");
                out.push_str(&label);
                out.push_str("-->");
            }
            NodeKind::Document => {
                for child in self.children(node) {
                    self.write_markup(child, out);
                }
            }
            NodeKind::Element { tag, .. } => {
                out.push('<');
                out.push_str(&tag);
                out.push('>');
                for child in self.children(node) {
                    self.write_markup(child, out);
                }
                out.push_str("</");
                out.push_str(&tag);
                out.push('>');
            }
        }
    }

    fn push(&self, kind: NodeKind) -> NodeRef {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(NodeData::new(kind));
        NodeRef::from_raw((nodes.len() - 1) as u64)
    }

    fn detach(nodes: &mut [NodeData], node: NodeRef) {
        let Some(parent) = nodes.get(index(node)).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = nodes.get_mut(index(parent)) {
            p.children.retain(|c| *c != node);
        }
        if let Some(n) = nodes.get_mut(index(node)) {
            n.parent = None;
        }
    }

    fn exists(nodes: &[NodeData], node: NodeRef) -> bool {
        index(node) < nodes.len()
    }

    /// Whether `ancestor` is `node` or one of its ancestors. Moving an
    /// ancestor under its own descendant would create a cycle.
    fn is_inclusive_ancestor(nodes: &[NodeData], ancestor: NodeRef, node: NodeRef) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = nodes.get(index(n)).and_then(|data| data.parent);
        }
        false
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

fn index(node: NodeRef) -> usize {
    node.raw() as usize
}

impl HostTree for MemoryTree {
    fn create_node(&self, kind: &str, namespace: Option<&str>) -> NodeRef {
        self.push(NodeKind::Element {
            tag: kind.to_owned(),
            namespace: namespace.map(str::to_owned),
        })
    }

    fn create_text(&self, text: &str) -> NodeRef {
        self.push(NodeKind::Text(text.to_owned()))
    }

    fn create_marker(&self, label: &str) -> NodeRef {
        self.push(NodeKind::Marker(label.to_owned()))
    }

    fn set_property(&self, node: NodeRef, key: &str, value: &PropValue) -> Result<(), HostError> {
        let mut nodes = self.nodes.borrow_mut();
        let data = nodes
            .get_mut(index(node))
            .ok_or(HostError::UnknownNode(node))?;
        if !matches!(data.kind, NodeKind::Element { .. }) {
            return Err(HostError::NotAnElement(node));
        }
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(HostError::InvalidProperty {
                node,
                key: key.to_owned(),
            });
        }
        data.props.insert(key.to_owned(), value.clone());
        Ok(())
    }

    fn remove_property(&self, node: NodeRef, key: &str) -> Result<(), HostError> {
        let mut nodes = self.nodes.borrow_mut();
        let data = nodes
            .get_mut(index(node))
            .ok_or(HostError::UnknownNode(node))?;
        data.props.shift_remove(key);
        Ok(())
    }

    fn add_event_listener(&self, node: NodeRef, event: &str, handler: &EventHandler) {
        if let Some(data) = self.nodes.borrow_mut().get_mut(index(node)) {
            data.handlers.push((event.to_owned(), handler.clone()));
        }
    }

    fn remove_event_listener(&self, node: NodeRef, event: &str, handler: &EventHandler) {
        if let Some(data) = self.nodes.borrow_mut().get_mut(index(node)) {
            data.handlers.retain(|(e, h)| !(e == event && h == handler));
        }
    }

    fn append_child(&self, parent: NodeRef, child: NodeRef) {
        let mut nodes = self.nodes.borrow_mut();
        if !Self::exists(&nodes, parent)
            || !Self::exists(&nodes, child)
            || Self::is_inclusive_ancestor(&nodes, child, parent)
        {
            return;
        }
        Self::detach(&mut nodes, child);
        nodes[index(parent)].children.push(child);
        nodes[index(child)].parent = Some(parent);
    }

    fn insert_before(&self, parent: NodeRef, node: NodeRef, reference: NodeRef) {
        let mut nodes = self.nodes.borrow_mut();
        if !Self::exists(&nodes, parent)
            || !Self::exists(&nodes, node)
            || node == reference
            || Self::is_inclusive_ancestor(&nodes, node, parent)
        {
            return;
        }
        Self::detach(&mut nodes, node);
        let siblings = &mut nodes[index(parent)].children;
        match siblings.iter().position(|c| *c == reference) {
            Some(pos) => siblings.insert(pos, node),
            None => siblings.push(node),
        }
        nodes[index(node)].parent = Some(parent);
    }

    fn replace_node(&self, old: NodeRef, new: NodeRef) {
        if old == new {
            return;
        }
        let mut nodes = self.nodes.borrow_mut();
        if !Self::exists(&nodes, old) || !Self::exists(&nodes, new) {
            return;
        }
        let Some(parent) = nodes[index(old)].parent else {
            return;
        };
        if Self::is_inclusive_ancestor(&nodes, new, parent) {
            return;
        }
        Self::detach(&mut nodes, new);
        let siblings = &mut nodes[index(parent)].children;
        if let Some(pos) = siblings.iter().position(|c| *c == old) {
            siblings[pos] = new;
        }
        nodes[index(old)].parent = None;
        nodes[index(new)].parent = Some(parent);
    }

    fn remove_node(&self, node: NodeRef) {
        Self::detach(&mut self.nodes.borrow_mut(), node);
    }

    fn is_connected(&self, node: NodeRef) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = Some(node);
        while let Some(n) = current {
            match nodes.get(index(n)) {
                Some(data) if matches!(data.kind, NodeKind::Document) => return true,
                Some(data) => current = data.parent,
                None => return false,
            }
        }
        false
    }

    fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.nodes.borrow().get(index(node)).and_then(|n| n.parent)
    }

    fn next_sibling(&self, node: NodeRef) -> Option<NodeRef> {
        let nodes = self.nodes.borrow();
        let parent = nodes.get(index(node))?.parent?;
        let siblings = &nodes.get(index(parent))?.children;
        let pos = siblings.iter().position(|c| *c == node)?;
        siblings.get(pos + 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_is_connected_and_fresh_nodes_are_not() {
        let tree = MemoryTree::new();
        let div = tree.create_node("div", None);

        assert!(tree.is_connected(tree.document()));
        assert!(!tree.is_connected(div));

        tree.append_child(tree.document(), div);
        assert!(tree.is_connected(div));
    }

    #[test]
    fn insert_before_and_siblings() {
        let tree = MemoryTree::new();
        let root = tree.document();
        let a = tree.create_text("a");
        let c = tree.create_text("c");
        tree.append_child(root, a);
        tree.append_child(root, c);

        let b = tree.create_text("b");
        tree.insert_before(root, b, c);

        assert_eq!(tree.children(root), vec![a, b, c]);
        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.next_sibling(c), None);
        assert_eq!(tree.text_content(root), "abc");
    }

    #[test]
    fn replace_node_swaps_in_place() {
        let tree = MemoryTree::new();
        let root = tree.document();
        let old = tree.create_text("old");
        let tail = tree.create_text("!");
        tree.append_child(root, old);
        tree.append_child(root, tail);

        let new = tree.create_text("new");
        tree.replace_node(old, new);

        assert_eq!(tree.children(root), vec![new, tail]);
        assert!(!tree.is_connected(old));
        assert_eq!(tree.parent(new), Some(root));
    }

    #[test]
    fn removing_an_ancestor_disconnects_descendants() {
        let tree = MemoryTree::new();
        let outer = tree.create_node("div", None);
        let inner = tree.create_text("x");
        tree.append_child(outer, inner);
        tree.append_child(tree.document(), outer);
        assert!(tree.is_connected(inner));

        tree.remove_node(outer);
        assert!(!tree.is_connected(inner));
        assert_eq!(tree.parent(inner), Some(outer));
    }

    #[test]
    fn properties_and_handlers() {
        let tree = MemoryTree::new();
        let button = tree.create_node("button", None);
        let text = tree.create_text("t");

        tree.set_property(button, "title", &"hello".into()).unwrap();
        assert_eq!(tree.property(button, "title"), Some("hello".into()));
        assert_eq!(
            tree.set_property(text, "title", &"x".into()),
            Err(HostError::NotAnElement(text))
        );
        assert!(tree.set_property(button, "", &"x".into()).is_err());

        let handler = EventHandler::new(|_| {});
        tree.add_event_listener(button, "click", &handler);
        assert_eq!(tree.dispatch(button, "click"), 1);
        tree.remove_event_listener(button, "click", &handler);
        assert_eq!(tree.handler_count(button, "click"), 0);
    }

    #[test]
    fn refuses_to_move_a_node_under_its_descendant() {
        let tree = MemoryTree::new();
        let root = tree.document();
        let outer = tree.create_node("div", None);
        let inner = tree.create_node("span", None);
        let leaf = tree.create_text("x");
        tree.append_child(root, outer);
        tree.append_child(outer, inner);
        tree.append_child(inner, leaf);

        tree.append_child(inner, outer);
        tree.append_child(outer, outer);
        tree.insert_before(inner, outer, leaf);
        tree.insert_before(root, root, outer);
        tree.replace_node(leaf, outer);

        assert_eq!(tree.parent(outer), Some(root));
        assert_eq!(tree.children(inner), vec![leaf]);
        assert_eq!(tree.children(root), vec![outer]);
        assert!(tree.is_connected(leaf));
        assert_eq!(tree.text_content(root), "x");
        assert_eq!(tree.to_markup(root), "<div><span>x</span></div>");
    }

    #[test]
    fn element_metadata() {
        let tree = MemoryTree::new();
        let svg = tree.create_node("svg", Some("http://www.w3.org/2000/svg"));
        let text = tree.create_text("t");

        assert_eq!(tree.tag(svg), Some("svg".to_string()));
        assert_eq!(tree.namespace(svg), Some("http://www.w3.org/2000/svg".to_string()));
        assert_eq!(tree.tag(text), None);
        assert_eq!(tree.namespace(text), None);
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn markup_rendering() {
        let tree = MemoryTree::new();
        let ul = tree.create_node("ul", None);
        let start = tree.create_marker("s");
        let li = tree.create_node("li", None);
        let text = tree.create_text("a");
        tree.append_child(li, text);
        tree.append_child(ul, start);
        tree.append_child(ul, li);

        assert_eq!(tree.to_markup(ul), "<ul><!--s--><li>a</li></ul>");
    }
}
