//! Arena-allocated document tree.
//!
//! Every node lives in one `Vec` owned by [`DomTree`] and is addressed by a
//! stable [`NodeId`]. A node owns the ordered list of its children's ids and
//! keeps a non-owning `parent_id` back-reference. All relinking goes through
//! the methods here, which update both directions in one call.

use std::collections::BTreeMap;

/// Attribute map of an element, keyed by attribute name.
pub type AttrMap = BTreeMap<String, String>;

/// Namespace of HTML elements.
pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Stable index of a node inside a [`DomTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single `name="value"` pair on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Name as written in markup, prefix included (`xlink:href`).
    pub name: String,
    pub value: String,
    /// Namespace of a foreign attribute; empty for ordinary ones.
    pub namespace: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), namespace: String::new() }
    }

    /// A prefixed foreign attribute such as `xlink:href`.
    pub fn namespaced(name: impl Into<String>, value: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), namespace: namespace.into() }
    }

    /// The name without its prefix
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) if !self.namespace.is_empty() => local,
            _ => &self.name,
        }
    }
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The document root.
    Document,
    /// `<!DOCTYPE ...>` declaration.
    Doctype { name: String, public_id: String, system_id: String },
    /// Element with its tag name, namespace and attributes in source order.
    /// HTML tag names are lowercase; SVG and MathML keep their mixed case.
    Element { name: String, namespace: String, attrs: Vec<Attribute> },
    /// Character data.
    Text(String),
    /// Comment text, without the `<!--` `-->` delimiters.
    Comment(String),
}

/// A node in the tree
#[derive(Debug, Clone)]
pub struct DomNode {
    /// What this node is
    pub data: NodeData,
    /// Parent node ID (if attached)
    pub parent_id: Option<NodeId>,
    /// Child node IDs in document order
    pub child_ids: Vec<NodeId>,
}

impl DomNode {
    fn new(data: NodeData) -> Self {
        Self { data, parent_id: None, child_ids: Vec::new() }
    }
}

/// A single-rooted document tree.
///
/// Detached nodes stay in the arena until the tree is dropped; a tree lives
/// for one document only.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<DomNode>,
    root: NodeId,
}

impl DomTree {
    /// Create a tree holding only a document root
    pub fn new() -> Self {
        Self { nodes: vec![DomNode::new(NodeData::Document)], root: NodeId(0) }
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DomNode::new(data));
        id
    }

    /// The document root
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id.0)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut DomNode> {
        self.nodes.get_mut(id.0)
    }

    /// Total number of nodes ever allocated, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a detached HTML element
    pub fn create_element(&mut self, name: &str, attrs: Vec<Attribute>) -> NodeId {
        self.create_element_ns(HTML_NAMESPACE, &name.to_ascii_lowercase(), attrs)
    }

    /// Create a detached element in `namespace`, keeping `name` as given
    pub fn create_element_ns(&mut self, namespace: &str, name: &str, attrs: Vec<Attribute>) -> NodeId {
        self.alloc(NodeData::Element { name: name.to_string(), namespace: namespace.to_string(), attrs })
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Comment(text.to_string()))
    }

    /// Create a detached doctype node
    pub fn create_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> NodeId {
        self.alloc(NodeData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        })
    }

    /// Payload of a node
    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.get(id).map(|node| &node.data)
    }

    /// Parent of a node, `None` for the root and for detached nodes
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent_id
    }

    /// Children of a node in document order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|node| node.child_ids.as_slice()).unwrap_or(&[])
    }

    /// Whether the node currently has a parent
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.parent(id).is_some()
    }

    /// Index of the node within its parent's children
    pub fn position(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// Whether `ancestor` is `id` itself or one of its ancestors
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Detach a node from its parent. Returns `false` if it had none.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.child_ids.retain(|&child| child != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent_id = None;
        }
        true
    }

    /// Insert `child` into `parent`'s children at `index` (clamped to the
    /// end), detaching it from any previous parent first.
    ///
    /// Refuses to link a node under itself or one of its descendants, and
    /// refuses to move the root.
    pub fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) -> bool {
        if self.get(parent).is_none() || self.get(child).is_none() || child == self.root {
            return false;
        }
        if self.is_ancestor_or_self(child, parent) {
            return false;
        }
        self.detach(child);
        if let Some(parent_node) = self.get_mut(parent) {
            let index = index.min(parent_node.child_ids.len());
            parent_node.child_ids.insert(index, child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent_id = Some(parent);
        }
        true
    }

    /// Append `child` as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.insert_at(parent, usize::MAX, child)
    }

    /// Insert `child` as the first child of `parent`
    pub fn prepend(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.insert_at(parent, 0, child)
    }

    /// Insert `child` immediately before `sibling`
    pub fn insert_before(&mut self, sibling: NodeId, child: NodeId) -> bool {
        if child == sibling {
            return false;
        }
        let Some(parent) = self.parent(sibling) else {
            return false;
        };
        if self.is_ancestor_or_self(child, parent) {
            return false;
        }
        self.detach(child);
        match self.position(sibling) {
            Some(index) => self.insert_at(parent, index, child),
            None => false,
        }
    }

    /// Copy a node and its whole subtree. The copy is detached.
    pub fn deep_clone(&mut self, id: NodeId) -> Option<NodeId> {
        let data = self.data(id)?.clone();
        let copy = self.alloc(data);

        let mut pending = vec![(id, copy)];
        while let Some((source, target)) = pending.pop() {
            let children = self.children(source).to_vec();
            for child in children {
                let Some(data) = self.data(child).cloned() else {
                    continue;
                };
                let child_copy = self.alloc(data);
                self.link_last(target, child_copy);
                pending.push((child, child_copy));
            }
        }
        Some(copy)
    }

    /// Namespace of an element
    pub fn namespace(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { namespace, .. } => Some(namespace.as_str()),
            _ => None,
        }
    }

    /// Append a freshly allocated node, which cannot close a cycle.
    fn link_last(&mut self, parent: NodeId, child: NodeId) {
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.child_ids.push(child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent_id = Some(parent);
        }
    }

    /// Tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Whether the node is an element
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Element { .. }))
    }

    /// Attributes of an element in source order; empty for other nodes
    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        match self.data(id) {
            Some(NodeData::Element { attrs, .. }) => attrs.as_slice(),
            _ => &[],
        }
    }

    /// Mutable attributes of an element
    pub fn attrs_mut(&mut self, id: NodeId) -> Option<&mut Vec<Attribute>> {
        match &mut self.get_mut(id)?.data {
            NodeData::Element { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    /// Value of the first attribute called `name`
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Attributes as a map. The first occurrence of a duplicated key wins.
    pub fn attr_map(&self, id: NodeId) -> AttrMap {
        let mut map = AttrMap::new();
        for attr in self.attrs(id) {
            map.entry(attr.name.clone()).or_insert_with(|| attr.value.clone());
        }
        map
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}
