//! Node predicates and their combinators.
//!
//! A [`Selector`] is a plain value: build it once, share it by reference
//! between threads, evaluate it against one node at a time. No selector
//! looks at a node's parent, children or siblings.
//!
//! # Example
//!
//! ```rust
//! use docsan_core::{Document, Selector, find_all};
//!
//! let doc = Document::parse(r#"<a href="/x">in</a><a href="http://e.org">out</a>"#).unwrap();
//! let external = Selector::and([Selector::element("a"), Selector::attr_not_prefix("href", "/")]);
//! let tree = doc.tree();
//! assert_eq!(find_all(tree, tree.root(), &external).len(), 1);
//! ```

use crate::dom_tree::{DomTree, NodeId};

/// Test applied to the value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrTest {
    /// The attribute exists, whatever its value.
    Present,
    Equals(String),
    Prefix(String),
    NotPrefix(String),
    Contains(String),
}

impl AttrTest {
    fn accepts(&self, value: &str) -> bool {
        match self {
            AttrTest::Present => true,
            AttrTest::Equals(expected) => value == expected,
            AttrTest::Prefix(prefix) => value.starts_with(prefix.as_str()),
            AttrTest::NotPrefix(prefix) => !value.starts_with(prefix.as_str()),
            AttrTest::Contains(needle) => value.contains(needle.as_str()),
        }
    }
}

/// A predicate over a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// An element with this tag name.
    Element(String),
    /// Any element.
    AnyElement,
    /// An element whose attribute `key` passes `test`. A missing attribute
    /// never matches.
    Attr { key: String, test: AttrTest },
    /// All inner selectors match. Empty matches everything.
    And(Vec<Selector>),
    /// At least one inner selector matches. Empty matches nothing.
    Or(Vec<Selector>),
    Not(Box<Selector>),
}

impl Selector {
    pub fn element(tag: &str) -> Self {
        Selector::Element(tag.to_ascii_lowercase())
    }

    pub fn any_element() -> Self {
        Selector::AnyElement
    }

    pub fn attr_equals(key: &str, value: &str) -> Self {
        Self::attr(key, AttrTest::Equals(value.to_string()))
    }

    pub fn has_attr(key: &str) -> Self {
        Self::attr(key, AttrTest::Present)
    }

    pub fn attr_prefix(key: &str, prefix: &str) -> Self {
        Self::attr(key, AttrTest::Prefix(prefix.to_string()))
    }

    /// The attribute exists and its value does not start with `prefix`.
    pub fn attr_not_prefix(key: &str, prefix: &str) -> Self {
        Self::attr(key, AttrTest::NotPrefix(prefix.to_string()))
    }

    pub fn attr_contains(key: &str, needle: &str) -> Self {
        Self::attr(key, AttrTest::Contains(needle.to_string()))
    }

    fn attr(key: &str, test: AttrTest) -> Self {
        Selector::Attr { key: key.to_string(), test }
    }

    pub fn and(selectors: impl IntoIterator<Item = Selector>) -> Self {
        Selector::And(selectors.into_iter().collect())
    }

    pub fn or(selectors: impl IntoIterator<Item = Selector>) -> Self {
        Selector::Or(selectors.into_iter().collect())
    }

    pub fn not(selector: Selector) -> Self {
        Selector::Not(Box::new(selector))
    }

    /// Evaluate against one node. Ids foreign to `tree` never match.
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        match self {
            Selector::Element(tag) => tree.tag_name(id).is_some_and(|name| name.eq_ignore_ascii_case(tag)),
            Selector::AnyElement => tree.is_element(id),
            Selector::Attr { key, test } => tree.attr(id, key).is_some_and(|value| test.accepts(value)),
            Selector::And(selectors) => selectors.iter().all(|s| s.matches(tree, id)),
            Selector::Or(selectors) => selectors.iter().any(|s| s.matches(tree, id)),
            Selector::Not(selector) => !selector.matches(tree, id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom_tree::Attribute;
    use rstest::rstest;

    fn node(tag: &str, attrs: &[(&str, &str)]) -> (DomTree, NodeId) {
        let mut tree = DomTree::new();
        let attrs = attrs.iter().map(|(k, v)| Attribute::new(*k, *v)).collect();
        let id = tree.create_element(tag, attrs);
        (tree, id)
    }

    #[rstest]
    #[case(Selector::element("div"), true)]
    #[case(Selector::element("DIV"), true)]
    #[case(Selector::element("span"), false)]
    #[case(Selector::any_element(), true)]
    #[case(Selector::has_attr("onclick"), true)]
    #[case(Selector::has_attr("href"), false)]
    #[case(Selector::attr_equals("id", "intro"), true)]
    #[case(Selector::attr_equals("id", "intr"), false)]
    #[case(Selector::attr_prefix("id", "in"), true)]
    #[case(Selector::attr_prefix("id", "tro"), false)]
    #[case(Selector::attr_not_prefix("id", "tro"), true)]
    #[case(Selector::attr_not_prefix("id", "in"), false)]
    #[case(Selector::attr_not_prefix("href", "#"), false)]
    #[case(Selector::attr_contains("class", "annotatable"), true)]
    #[case(Selector::attr_contains("class", "chapter-table"), false)]
    #[case(Selector::attr_contains("title", ""), false)]
    fn test_leaf_selectors(#[case] selector: Selector, #[case] expected: bool) {
        let (tree, id) = node("div", &[("id", "intro"), ("class", "para annotatable"), ("onclick", "go()")]);
        assert_eq!(selector.matches(&tree, id), expected);
    }

    #[rstest]
    #[case(Selector::and([Selector::element("p"), Selector::has_attr("id")]), true)]
    #[case(Selector::and([Selector::element("p"), Selector::has_attr("lang")]), false)]
    #[case(Selector::and([]), true)]
    #[case(Selector::or([Selector::element("div"), Selector::has_attr("id")]), true)]
    #[case(Selector::or([Selector::element("div"), Selector::has_attr("lang")]), false)]
    #[case(Selector::or([]), false)]
    #[case(Selector::not(Selector::element("p")), false)]
    #[case(Selector::not(Selector::attr_contains("class", "dyncal-button")), true)]
    fn test_combinators(#[case] selector: Selector, #[case] expected: bool) {
        let (tree, id) = node("p", &[("id", "p1")]);
        assert_eq!(selector.matches(&tree, id), expected);
    }

    #[test]
    fn test_non_elements_never_match_attr() {
        let mut tree = DomTree::new();
        let text = tree.create_text("id");
        assert!(!Selector::any_element().matches(&tree, text));
        assert!(!Selector::has_attr("id").matches(&tree, text));
        assert!(Selector::not(Selector::has_attr("id")).matches(&tree, text));
    }

    #[test]
    fn test_duplicate_attribute_first_wins() {
        let (tree, id) = node("div", &[("id", "first"), ("id", "second")]);
        assert!(Selector::attr_equals("id", "first").matches(&tree, id));
        assert!(!Selector::attr_equals("id", "second").matches(&tree, id));
    }

    #[test]
    fn test_element_matches_foreign_case() {
        let mut tree = DomTree::new();
        let id = tree.create_element_ns("http://www.w3.org/2000/svg", "foreignObject", Vec::new());
        assert!(Selector::element("foreignObject").matches(&tree, id));
        assert!(Selector::element("foreignobject").matches(&tree, id));
    }

    #[test]
    fn test_selector_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Selector>();
    }
}
