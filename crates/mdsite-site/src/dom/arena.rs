//! Arena-backed document tree.
//!
//! Every node lives in one vector and refers to its relatives by index, so a
//! rewrite pass can mutate attributes or splice in new nodes without any
//! shared ownership between parents and children.

use html5ever::{ns, LocalName, QualName};

/// Index of a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Element attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

impl Attribute {
    /// Attribute in the null namespace, as produced for plain HTML attributes.
    pub fn new(key: &str, value: impl Into<String>) -> Self {
        Self {
            name: QualName::new(None, ns!(), LocalName::from(key)),
            value: value.into(),
        }
    }
}

/// Payload of a node.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Tree root.
    Document,
    /// `<!DOCTYPE ...>`
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    /// Element with its qualified name and attributes in source order.
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
    },
    Text(String),
    Comment(String),
}

/// A node and its links to the rest of the tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }
}

/// A parsed HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only its root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
        }
    }

    /// The document root.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of allocated nodes, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        self.alloc(NodeData::Element { name, attrs })
    }

    /// Create an HTML element with no attributes.
    pub fn create_html_element(&mut self, tag: &str) -> NodeId {
        let name = QualName::new(None, ns!(html), LocalName::from(tag));
        self.create_element(name, Vec::new())
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Comment(text.into()))
    }

    pub fn create_doctype(&mut self, name: String, public_id: String, system_id: String) -> NodeId {
        self.alloc(NodeData::Doctype {
            name,
            public_id,
            system_id,
        })
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// `child` must be detached.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last = self.node(parent).last_child;

        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.prev_sibling = last;
            node.next_sibling = None;
        }

        match last {
            Some(last) => self.node_mut(last).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.node_mut(parent).last_child = Some(child);
    }

    /// Append text to `parent`, merging with a trailing text node.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(last) = self.node(parent).last_child {
            if let NodeData::Text(existing) = &mut self.node_mut(last).data {
                existing.push_str(text);
                return;
            }
        }
        let node = self.create_text(text);
        self.append(parent, node);
    }

    /// Insert the detached node `new` immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, new: NodeId) {
        let (parent, prev) = {
            let node = self.node(sibling);
            (node.parent, node.prev_sibling)
        };

        {
            let node = self.node_mut(new);
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = Some(sibling);
        }
        self.node_mut(sibling).prev_sibling = Some(new);

        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = Some(new),
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).first_child = Some(new);
                }
            }
        }
    }

    /// Insert text before `sibling`, merging with a preceding text node.
    pub fn insert_text_before(&mut self, sibling: NodeId, text: &str) {
        if let Some(prev) = self.node(sibling).prev_sibling {
            if let NodeData::Text(existing) = &mut self.node_mut(prev).data {
                existing.push_str(text);
                return;
            }
        }
        let node = self.create_text(text);
        self.insert_before(sibling, node);
    }

    /// Unlink a node (and its subtree) from its parent and siblings.
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let node = self.node(id);
            (node.parent, node.prev_sibling, node.next_sibling)
        };

        match prev {
            Some(prev) => self.node_mut(prev).next_sibling = next,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).first_child = next;
                }
            }
        }
        match next {
            Some(next) => self.node_mut(next).prev_sibling = prev,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).last_child = prev;
                }
            }
        }

        let node = self.node_mut(id);
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Iterate over the direct children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// All nodes of the subtree rooted at `id`, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            order.push(current);
            let mut child = self.node(current).last_child;
            while let Some(c) = child {
                stack.push(c);
                child = self.node(c).prev_sibling;
            }
        }

        order
    }

    /// Deepest element nesting level below the root.
    pub fn max_depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root(), 0usize)];

        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for child in self.children(id) {
                let child_depth = if self.is_element(child) { depth + 1 } else { depth };
                stack.push((child, child_depth));
            }
        }

        deepest
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Element { .. })
    }

    /// Local tag name of an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element { name, .. } => Some(&*name.local),
            _ => None,
        }
    }

    /// First element with the given local tag name, in document order.
    pub fn find_first(&self, tag: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&id| self.tag_name(id) == Some(tag))
    }

    /// Attributes of an element; empty for other node kinds.
    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        match &self.node(id).data {
            NodeData::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    /// Value of the attribute `key`.
    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| &*a.name.local == key)
            .map(|a| a.value.as_str())
    }

    /// Set the attribute `key`, replacing an existing value or appending a
    /// new attribute. Returns `false` when `id` is not an element.
    pub fn set_attr(&mut self, id: NodeId, key: &str, value: impl Into<String>) -> bool {
        let NodeData::Element { attrs, .. } = &mut self.node_mut(id).data else {
            return false;
        };

        let value = value.into();
        match attrs.iter_mut().find(|a| &*a.name.local == key) {
            Some(existing) => existing.value = value,
            None => attrs.push(Attribute::new(key, value)),
        }
        true
    }

    /// Text of the first direct text child.
    pub fn first_text_child(&self, id: NodeId) -> Option<&str> {
        self.children(id).find_map(|child| match &self.node(child).data {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.create_html_element("body");
        let a = doc.create_html_element("p");
        let b = doc.create_html_element("p");
        let root = doc.root();
        doc.append(root, body);
        doc.append(body, a);
        doc.append(body, b);
        (doc, body, a, b)
    }

    #[test]
    fn append_links_siblings() {
        let (doc, body, a, b) = sample();

        assert_eq!(doc.children(body).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(doc.node(a).next_sibling, Some(b));
        assert_eq!(doc.node(b).prev_sibling, Some(a));
        assert_eq!(doc.node(b).parent, Some(body));
    }

    #[test]
    fn insert_before_first_child() {
        let (mut doc, body, a, b) = sample();
        let c = doc.create_html_element("h1");
        doc.insert_before(a, c);

        assert_eq!(doc.children(body).collect::<Vec<_>>(), vec![c, a, b]);
        assert_eq!(doc.node(body).first_child, Some(c));
    }

    #[test]
    fn detach_relinks_neighbours() {
        let (mut doc, body, a, b) = sample();
        doc.detach(a);

        assert_eq!(doc.children(body).collect::<Vec<_>>(), vec![b]);
        assert_eq!(doc.node(b).prev_sibling, None);
        assert_eq!(doc.node(a).parent, None);
    }

    #[test]
    fn descendants_are_pre_order() {
        let (mut doc, body, a, b) = sample();
        let text = doc.create_text("x");
        doc.append(a, text);

        let order = doc.descendants(doc.root());
        assert_eq!(order, vec![doc.root(), body, a, text, b]);
    }

    #[test]
    fn append_text_merges() {
        let (mut doc, _, a, _) = sample();
        doc.append_text(a, "Hello, ");
        doc.append_text(a, "world");

        assert_eq!(doc.children(a).count(), 1);
        assert_eq!(doc.first_text_child(a), Some("Hello, world"));
    }

    #[test]
    fn set_attr_keeps_keys_unique() {
        let (mut doc, _, a, _) = sample();
        assert!(doc.set_attr(a, "class", "one"));
        assert!(doc.set_attr(a, "class", "two"));

        assert_eq!(doc.attrs(a).len(), 1);
        assert_eq!(doc.attr(a, "class"), Some("two"));
    }

    #[test]
    fn set_attr_ignores_non_elements() {
        let mut doc = Document::new();
        let text = doc.create_text("x");
        assert!(!doc.set_attr(text, "id", "nope"));
    }

    #[test]
    fn max_depth_counts_elements() {
        let (mut doc, _, a, _) = sample();
        let em = doc.create_html_element("em");
        doc.append(a, em);
        doc.append_text(em, "deep");

        assert_eq!(doc.max_depth(), 3);
    }
}
