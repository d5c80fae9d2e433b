//! HTML parsing into the arena tree.
//!
//! This module provides the [`Document`] type. Parsing itself is delegated
//! to `scraper` (html5ever); the resulting tree is copied once into a
//! [`DomTree`] which the rest of the crate queries and rewrites.
//!
//! # Example
//!
//! ```rust
//! use docsan_core::Document;
//!
//! let html = r#"
//!     <html>
//!         <head><title>Report</title></head>
//!         <body><p class="annotatable" id="p1">Paragraph</p></body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! assert_eq!(doc.title(), Some("Report".to_string()));
//! assert!(doc.body().is_some());
//! ```

use scraper::node::Element;
use scraper::{Html, Node};

use crate::dom_tree::{Attribute, DomTree, NodeId};
use crate::select::Selector;
use crate::serialize::{render_children, text_content};
use crate::walk::find_first;
use crate::{DocsanError, Result};

/// A parsed HTML document.
///
/// Owns its tree exclusively; every request parses its own document.
#[derive(Debug, Clone)]
pub struct Document {
    tree: DomTree,
}

impl Document {
    /// Parses HTML from a string.
    ///
    /// The parser is lenient like a browser: malformed markup is repaired,
    /// and a missing `html`, `head` or `body` is synthesized.
    ///
    /// # Example
    ///
    /// ```rust
    /// use docsan_core::Document;
    ///
    /// let doc = Document::parse("<p>unclosed").unwrap();
    /// assert!(doc.head().is_some());
    /// ```
    pub fn parse(html: &str) -> Result<Self> {
        let parsed = Html::parse_document(html);
        let mut tree = DomTree::new();

        let mut pending = vec![(parsed.tree.root(), tree.root())];
        while let Some((source, target)) = pending.pop() {
            for child in source.children() {
                if let Some(id) = copy_node(&mut tree, child.value()) {
                    tree.append(target, id);
                    pending.push((child, id));
                }
            }
        }

        Ok(Self { tree })
    }

    /// Parses HTML from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DocsanError::InvalidEncoding`] if the bytes are not UTF-8.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self> {
        let html = std::str::from_utf8(bytes).map_err(|_| DocsanError::InvalidEncoding)?;
        Self::parse(html)
    }

    /// Wraps an already built tree.
    pub fn from_tree(tree: DomTree) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    pub fn into_tree(self) -> DomTree {
        self.tree
    }

    /// The first `head` element
    pub fn head(&self) -> Option<NodeId> {
        find_first(&self.tree, self.tree.root(), &Selector::element("head"))
    }

    /// The first `body` element
    pub fn body(&self) -> Option<NodeId> {
        find_first(&self.tree, self.tree.root(), &Selector::element("body"))
    }

    /// Text of the first `title` element inside `head`.
    pub fn title(&self) -> Option<String> {
        let head = self.head()?;
        let title = find_first(&self.tree, head, &Selector::element("title"))?;
        Some(text_content(&self.tree, title))
    }

    /// Serializes the whole document, doctype included.
    pub fn to_html(&self) -> String {
        render_children(&self.tree, self.tree.root())
    }
}

/// Copy one parser node into the arena, detached. Node kinds the
/// pipeline has no use for (processing instructions, fragments) are dropped.
fn copy_node(tree: &mut DomTree, node: &Node) -> Option<NodeId> {
    match node {
        Node::Element(element) => {
            let name = &element.name;
            Some(tree.create_element_ns(&name.ns, &name.local, copy_attrs(element)))
        }
        Node::Text(text) => Some(tree.create_text(&text.text)),
        Node::Comment(comment) => Some(tree.create_comment(&comment.comment)),
        Node::Doctype(doctype) => Some(tree.create_doctype(doctype.name(), doctype.public_id(), doctype.system_id())),
        _ => None,
    }
}

/// Attributes in source order. Foreign ones (`xlink:href`, `xml:lang`)
/// keep their prefix and namespace.
fn copy_attrs(element: &Element) -> Vec<Attribute> {
    element
        .attrs
        .iter()
        .map(|(name, value)| match &name.prefix {
            Some(prefix) => Attribute::namespaced(format!("{prefix}:{}", name.local), &**value, &*name.ns),
            None if name.ns.is_empty() => Attribute::new(&*name.local, &**value),
            None => Attribute::namespaced(&*name.local, &**value, &*name.ns),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom_tree::NodeData;
    use crate::walk::find_all;

    const SAMPLE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Test &amp; Page</title>
</head>
<body class="doc">
    <h1>Heading</h1>
    <p class="content">Paragraph 1</p>
    <!-- note -->
    <p class="content">Paragraph 2</p>
</body>
</html>"#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Test & Page".to_string()));
    }

    #[test]
    fn test_head_and_body() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let body = doc.body().unwrap();
        assert_eq!(doc.tree().attr(body, "class"), Some("doc"));
        assert_eq!(doc.tree().tag_name(doc.head().unwrap()), Some("head"));
    }

    #[test]
    fn test_child_order_preserved() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let tree = doc.tree();
        let paragraphs = find_all(tree, tree.root(), &Selector::element("p"));
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(text_content(tree, paragraphs[0]), "Paragraph 1");
        assert_eq!(text_content(tree, paragraphs[1]), "Paragraph 2");
    }

    #[test]
    fn test_comments_and_doctype_kept() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let tree = doc.tree();
        let first = tree.children(tree.root())[0];
        assert!(matches!(tree.data(first), Some(NodeData::Doctype { name, .. }) if name == "html"));

        let body = doc.body().unwrap();
        let has_comment = tree
            .children(body)
            .iter()
            .any(|&c| matches!(tree.data(c), Some(NodeData::Comment(text)) if text == " note "));
        assert!(has_comment);
    }

    #[test]
    fn test_parents_link_back() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let tree = doc.tree();
        for id in crate::walk::descendants(tree, tree.root()) {
            for &child in tree.children(id) {
                assert_eq!(tree.parent(child), Some(id));
            }
        }
    }

    #[test]
    fn test_missing_structure_is_synthesized() {
        let doc = Document::parse("<p>bare</p>").unwrap();
        assert!(doc.head().is_some());
        assert!(doc.body().is_some());
        assert_eq!(doc.title(), None);
    }

    #[test]
    fn test_parse_bytes_invalid_utf8() {
        let result = Document::parse_bytes(&[0x3c, 0x70, 0x3e, 0xff, 0xfe]);
        assert!(matches!(result, Err(DocsanError::InvalidEncoding)));
    }

    #[test]
    fn test_attribute_source_order() {
        let doc = Document::parse(r#"<a title="t" href="/x" class="c">a</a>"#).unwrap();
        let tree = doc.tree();
        let link = find_first(tree, tree.root(), &Selector::element("a")).unwrap();
        let names: Vec<&str> = tree.attrs(link).iter().map(|attr| attr.name.as_str()).collect();
        assert_eq!(names, ["title", "href", "class"]);
    }

    #[test]
    fn test_svg_xlink_href_round_trip() {
        let html = r##"<!DOCTYPE html><html><head></head><body><svg xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="#icon"></use></svg></body></html>"##;
        let doc = Document::parse(html).unwrap();
        let tree = doc.tree();
        let svg_use = find_first(tree, tree.root(), &Selector::element("use")).unwrap();
        assert_eq!(tree.attr(svg_use, "xlink:href"), Some("#icon"));
        assert_eq!(tree.namespace(svg_use), Some("http://www.w3.org/2000/svg"));
        assert_eq!(doc.to_html(), html);
    }

    #[test]
    fn test_to_html() {
        let doc = Document::parse("<!DOCTYPE html><html><head></head><body><p>a &lt; b</p></body></html>").unwrap();
        assert_eq!(
            doc.to_html(),
            "<!DOCTYPE html><html><head></head><body><p>a &lt; b</p></body></html>"
        );
    }
}
