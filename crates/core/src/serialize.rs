//! Markup serialization of tree nodes.
//!
//! [`SerializableNode`] feeds a subtree to html5ever's HTML serializer,
//! which owns the fragment serialization rules (void elements, raw-text
//! elements, escaping, foreign attribute prefixes).

use std::collections::VecDeque;
use std::io;

use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};
use html5ever::{LocalName, Namespace, Prefix, QualName};

use crate::dom_tree::{Attribute, DomTree, NodeData, NodeId};
use crate::walk::descendants;

/// A node of a [`DomTree`] as seen by the html5ever serializer.
pub struct SerializableNode<'a> {
    tree: &'a DomTree,
    id: NodeId,
    shallow: bool,
}

impl<'a> SerializableNode<'a> {
    pub fn new(tree: &'a DomTree, id: NodeId) -> Self {
        Self { tree, id, shallow: false }
    }

    /// Serialize the node itself without any of its children.
    fn shallow(tree: &'a DomTree, id: NodeId) -> Self {
        Self { tree, id, shallow: true }
    }
}

enum SerializeOp {
    Open(NodeId),
    Close(QualName),
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let tree = self.tree;
        let mut ops = VecDeque::new();
        match traversal_scope {
            TraversalScope::IncludeNode => ops.push_back(SerializeOp::Open(self.id)),
            TraversalScope::ChildrenOnly(_) => {
                ops.extend(tree.children(self.id).iter().map(|&child| SerializeOp::Open(child)));
            }
        }

        while let Some(op) = ops.pop_front() {
            let id = match op {
                SerializeOp::Open(id) => id,
                SerializeOp::Close(name) => {
                    serializer.end_elem(name)?;
                    continue;
                }
            };
            let descend = !(self.shallow && id == self.id);
            match tree.data(id) {
                Some(NodeData::Element { name, namespace, attrs }) => {
                    let qual_name = element_name(namespace, name);
                    let attr_names: Vec<QualName> = attrs.iter().map(attribute_name).collect();
                    let attr_refs = attr_names.iter().zip(attrs).map(|(name, attr)| (name, attr.value.as_str()));
                    serializer.start_elem(qual_name.clone(), attr_refs)?;

                    ops.push_front(SerializeOp::Close(qual_name));
                    if descend {
                        for &child in tree.children(id).iter().rev() {
                            ops.push_front(SerializeOp::Open(child));
                        }
                    }
                }
                Some(NodeData::Document) if descend => {
                    for &child in tree.children(id).iter().rev() {
                        ops.push_front(SerializeOp::Open(child));
                    }
                }
                Some(NodeData::Doctype { name, .. }) => serializer.write_doctype(name)?,
                Some(NodeData::Text(text)) => serializer.write_text(text)?,
                Some(NodeData::Comment(text)) => serializer.write_comment(text)?,
                Some(NodeData::Document) | None => {}
            }
        }
        Ok(())
    }
}

fn element_name(namespace: &str, name: &str) -> QualName {
    QualName::new(None, Namespace::from(namespace), LocalName::from(name))
}

fn attribute_name(attr: &Attribute) -> QualName {
    if attr.namespace.is_empty() {
        return QualName::new(None, Namespace::from(""), LocalName::from(attr.name.as_str()));
    }
    let prefix = attr.name.split_once(':').map(|(prefix, _)| Prefix::from(prefix));
    QualName::new(prefix, Namespace::from(attr.namespace.as_str()), LocalName::from(attr.local_name()))
}

fn write(node: &SerializableNode<'_>, traversal_scope: TraversalScope) -> String {
    let opts = SerializeOpts { traversal_scope, ..SerializeOpts::default() };
    let mut out = Vec::new();
    if let Err(err) = serialize(&mut out, node, opts) {
        tracing::warn!(error = %err, "markup serialization stopped early");
    }
    String::from_utf8(out).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

/// Render a node and its subtree
pub fn render(tree: &DomTree, id: NodeId) -> String {
    write(&SerializableNode::new(tree, id), TraversalScope::IncludeNode)
}

/// Render only the children of a node. Text under a raw-text parent such
/// as `script` stays unescaped.
pub fn render_children(tree: &DomTree, id: NodeId) -> String {
    let parent = match tree.data(id) {
        Some(NodeData::Element { name, namespace, .. }) => Some(element_name(namespace, name)),
        _ => None,
    };
    write(&SerializableNode::new(tree, id), TraversalScope::ChildrenOnly(parent))
}

/// Render the children of a node, framed by its own start and end tag
/// turned into comments.
///
/// A `<body class="x">` yields `<!--<body class="x">-->` ... `<!--</body>-->`.
/// A start tag that would end its comment early (an attribute value holding
/// `-->`) is framed as the bare tag instead.
pub fn render_children_commenting_parent(tree: &DomTree, id: NodeId) -> String {
    let shell = write(&SerializableNode::shallow(tree, id), TraversalScope::IncludeNode);
    let end_tag = tree.tag_name(id).map(|name| format!("</{name}>")).unwrap_or_default();
    let (start, end) = match shell.strip_suffix(end_tag.as_str()) {
        Some(start) if !end_tag.is_empty() => (start, end_tag.as_str()),
        _ => (shell.as_str(), ""),
    };
    let bare;
    let start = if is_comment_safe(start) {
        start
    } else {
        bare = tree.tag_name(id).map(|name| format!("<{name}>")).unwrap_or_default();
        tracing::warn!(tag = %bare, "start tag cannot be commented out, framing with the bare tag");
        bare.as_str()
    };

    let mut out = String::new();
    out.push_str("<!--");
    out.push_str(start);
    out.push_str("-->");
    out.push_str(&render_children(tree, id));
    out.push_str("<!--");
    out.push_str(end);
    out.push_str("-->");
    out
}

/// Whether `text` can be written between `<!--` and `-->` and read back as
/// the same single comment.
pub fn is_comment_safe(text: &str) -> bool {
    !(text.starts_with('>') || text.starts_with("->") || text.contains("-->") || text.contains("--!>"))
}

/// Concatenated text of all descendant text nodes
pub fn text_content(tree: &DomTree, id: NodeId) -> String {
    descendants(tree, id)
        .filter_map(|node| match tree.data(node) {
            Some(NodeData::Text(text)) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}
