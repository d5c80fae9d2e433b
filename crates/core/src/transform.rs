//! Tree rewriting primitives.
//!
//! Each single-node operation only acts on a node that currently has a
//! parent; on a detached node (or the document root) it does nothing and
//! returns `false`/`None`. The `*_all` forms query the tree once, then apply
//! the operation to every match and return how many nodes changed.

use crate::dom_tree::{Attribute, DomTree, NodeId};
use crate::select::Selector;
use crate::serialize::{is_comment_safe, render};
use crate::walk::find_all;

/// Prefix that renames an attribute out of the way
pub const DISABLED_ATTRIBUTE_PREFIX: &str = "xxx";

/// Where [`insert_child_at`] puts the new child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    First,
    Last,
}

/// Replace `node` with a comment holding its serialized markup.
///
/// Markup that would close the comment early (a script holding `-->`) is
/// never written: the node is removed instead and `None` is returned.
/// Returns the comment's id.
pub fn replace_with_comment(tree: &mut DomTree, node: NodeId) -> Option<NodeId> {
    if !tree.is_attached(node) {
        return None;
    }
    let markup = render(tree, node);
    if !is_comment_safe(&markup) {
        tracing::warn!(tag = tree.tag_name(node).unwrap_or_default(), "markup ends its comment early, removing node");
        tree.detach(node);
        return None;
    }
    let comment = tree.create_comment(&markup);
    swap(tree, node, comment).then_some(comment)
}

/// Replace `node` with a copy of its first child.
///
/// Only the first child survives: later children are dropped along with
/// `node`'s own tag and attributes. A node without children is removed.
/// Returns the id of the copy, `None` when the node was removed or nothing
/// happened.
pub fn replace_with_content(tree: &mut DomTree, node: NodeId) -> Option<NodeId> {
    if !tree.is_attached(node) {
        return None;
    }
    let Some(&first) = tree.children(node).first() else {
        tree.detach(node);
        return None;
    };
    let dropped = tree.children(node).len() - 1;
    if dropped > 0 {
        tracing::debug!(dropped, "replacing node with first child only");
    }
    let copy = tree.deep_clone(first)?;
    swap(tree, node, copy).then_some(copy)
}

/// Detach `node` from its parent
pub fn remove(tree: &mut DomTree, node: NodeId) -> bool {
    tree.detach(node)
}

/// Put a new `tag` element at `node`'s position and move `node` into it.
///
/// Siblings of `node` keep their order. Returns the wrapper's id.
pub fn wrap(tree: &mut DomTree, node: NodeId, tag: &str, attrs: Vec<Attribute>) -> Option<NodeId> {
    if !tree.is_attached(node) {
        return None;
    }
    let wrapper = tree.create_element(tag, attrs);
    if !tree.insert_before(node, wrapper) {
        return None;
    }
    tree.append(wrapper, node);
    Some(wrapper)
}

/// Insert `new_element` as first or last child of `anchor`.
pub fn insert_child_at(tree: &mut DomTree, anchor: NodeId, new_element: NodeId, position: Position) -> bool {
    if !tree.is_attached(anchor) {
        return false;
    }
    match position {
        Position::First => tree.prepend(anchor, new_element),
        Position::Last => tree.append(anchor, new_element),
    }
}

/// Rename the first `name` attribute of `node` by prefixing it with
/// [`DISABLED_ATTRIBUTE_PREFIX`]. The value is left untouched.
pub fn disable_attribute(tree: &mut DomTree, node: NodeId, name: &str) -> bool {
    if !tree.is_attached(node) {
        return false;
    }
    let Some(attrs) = tree.attrs_mut(node) else {
        return false;
    };
    match attrs.iter_mut().find(|attr| attr.name == name) {
        Some(attr) => {
            attr.name = format!("{DISABLED_ATTRIBUTE_PREFIX}{name}");
            true
        }
        None => false,
    }
}

/// [`replace_with_comment`] every match under `root`
pub fn replace_all_with_comments(tree: &mut DomTree, root: NodeId, selector: &Selector) -> usize {
    apply_all(tree, root, selector, |tree, node| {
        let attached = tree.is_attached(node);
        replace_with_comment(tree, node);
        attached
    })
}

/// [`replace_with_content`] every match under `root`
pub fn replace_all_with_content(tree: &mut DomTree, root: NodeId, selector: &Selector) -> usize {
    apply_all(tree, root, selector, |tree, node| {
        let attached = tree.is_attached(node);
        replace_with_content(tree, node);
        attached
    })
}

/// [`remove`] every match under `root`
pub fn remove_all(tree: &mut DomTree, root: NodeId, selector: &Selector) -> usize {
    apply_all(tree, root, selector, remove)
}

/// [`wrap`] every match under `root` in its own new element
pub fn wrap_all(tree: &mut DomTree, root: NodeId, selector: &Selector, tag: &str, attrs: &[Attribute]) -> usize {
    apply_all(tree, root, selector, |tree, node| wrap(tree, node, tag, attrs.to_vec()).is_some())
}

/// [`disable_attribute`] on every match under `root`
pub fn disable_attribute_all(tree: &mut DomTree, root: NodeId, selector: &Selector, name: &str) -> usize {
    apply_all(tree, root, selector, |tree, node| disable_attribute(tree, node, name))
}

fn apply_all<F>(tree: &mut DomTree, root: NodeId, selector: &Selector, mut op: F) -> usize
where
    F: FnMut(&mut DomTree, NodeId) -> bool,
{
    let matches = find_all(tree, root, selector);
    matches.into_iter().filter(|&node| op(tree, node)).count()
}

/// Put `replacement` where `node` is and detach `node`.
fn swap(tree: &mut DomTree, node: NodeId, replacement: NodeId) -> bool {
    if !tree.insert_before(node, replacement) {
        return false;
    }
    tree.detach(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use crate::dom_tree::NodeData;
    use crate::serialize::render_children;
    use crate::walk::find_first;

    fn parse(html: &str) -> (DomTree, NodeId) {
        let doc = Document::parse(html).unwrap();
        let body = doc.body().unwrap();
        (doc.into_tree(), body)
    }

    fn first(tree: &DomTree, selector: &Selector) -> NodeId {
        find_first(tree, tree.root(), selector).unwrap()
    }

    #[test]
    fn test_replace_with_comment() {
        let (mut tree, body) = parse(r#"<p>a</p><div><script src="x.js">var x = 1 < 2;</script></div><p>b</p>"#);
        let script = first(&tree, &Selector::element("script"));
        let original = render(&tree, script);

        let comment = replace_with_comment(&mut tree, script).unwrap();
        assert_eq!(tree.data(comment), Some(&NodeData::Comment(original.clone())));
        assert!(!tree.is_attached(script));
        assert_eq!(
            render_children(&tree, body),
            r#"<p>a</p><div><!--<script src="x.js">var x = 1 < 2;</script>--></div><p>b</p>"#
        );
    }

    #[test]
    fn test_replace_with_comment_round_trip() {
        let (mut tree, body) = parse(r#"<span>s</span><div class="x"><p title="a &amp; b">c &lt; d<br></p></div>"#);
        let div = first(&tree, &Selector::element("div"));
        let original = render(&tree, div);
        replace_with_comment(&mut tree, div);

        let (reparsed, reparsed_body) = parse(&render_children(&tree, body));
        let comment = reparsed.children(reparsed_body)[1];
        let Some(NodeData::Comment(text)) = reparsed.data(comment) else {
            panic!("expected a comment");
        };
        let (again, again_body) = parse(text);
        assert_eq!(render_children(&again, again_body), original);
    }

    #[test]
    fn test_replace_with_comment_cannot_break_out() {
        let (mut tree, body) =
            parse(r#"<p>a</p><script>var s = "--><img src=x onerror=alert(1)>";</script><p>b</p>"#);
        let script = first(&tree, &Selector::element("script"));

        assert_eq!(replace_with_comment(&mut tree, script), None);
        assert!(!tree.is_attached(script));
        let html = render_children(&tree, body);
        assert_eq!(html, "<p>a</p><p>b</p>");

        let (reparsed, _) = parse(&html);
        assert_eq!(find_first(&reparsed, reparsed.root(), &Selector::element("img")), None);
    }

    #[test]
    fn test_replace_all_with_comments_counts_removed() {
        let (mut tree, body) = parse("<script>a()</script><script>x = '--!>'</script>");
        let changed = replace_all_with_comments(&mut tree, body, &Selector::element("script"));
        assert_eq!(changed, 2);
        assert_eq!(render_children(&tree, body), "<!--<script>a()</script>-->");
    }

    #[test]
    fn test_replace_with_comment_detached_is_noop() {
        let mut tree = DomTree::new();
        let loose = tree.create_element("script", Vec::new());
        let root = tree.root();
        assert_eq!(replace_with_comment(&mut tree, loose), None);
        assert_eq!(replace_with_comment(&mut tree, root), None);
    }

    #[test]
    fn test_replace_with_content_keeps_first_child() {
        let (mut tree, body) = parse(r#"<div id="w"><span class="s"><b>deep</b></span><i>dropped</i></div><p>after</p>"#);
        let div = first(&tree, &Selector::element("div"));
        let copy = replace_with_content(&mut tree, div).unwrap();
        assert_eq!(tree.parent(copy), Some(body));
        assert_eq!(render_children(&tree, body), r#"<span class="s"><b>deep</b></span><p>after</p>"#);
    }

    #[test]
    fn test_replace_with_content_empty_node_removed() {
        let (mut tree, body) = parse("<p>x</p><span></span><p>y</p>");
        let span = first(&tree, &Selector::element("span"));
        assert_eq!(replace_with_content(&mut tree, span), None);
        assert_eq!(render_children(&tree, body), "<p>x</p><p>y</p>");
    }

    #[test]
    fn test_replace_all_with_content() {
        let (mut tree, body) = parse("<font>a</font><p><font>b</font></p><font></font>");
        let changed = replace_all_with_content(&mut tree, body, &Selector::element("font"));
        assert_eq!(changed, 3);
        assert_eq!(render_children(&tree, body), "a<p>b</p>");
    }

    #[test]
    fn test_remove_all() {
        let (mut tree, body) = parse(r#"<p id="keep">k</p><p id="drop">d</p><div><p id="drop">d2</p></div>"#);
        let removed = remove_all(&mut tree, body, &Selector::attr_equals("id", "drop"));
        assert_eq!(removed, 2);
        assert_eq!(render_children(&tree, body), r#"<p id="keep">k</p><div></div>"#);
    }

    #[test]
    fn test_wrap_keeps_position_and_siblings() {
        let (mut tree, body) = parse(r#"<p>before</p><table class="chapter-table"><tbody><tr><td>1</td></tr></tbody></table><p>after</p>"#);
        let table = first(&tree, &Selector::element("table"));
        let wrapper = wrap(&mut tree, table, "div", vec![Attribute::new("class", "w")]).unwrap();

        assert_eq!(tree.parent(table), Some(wrapper));
        assert_eq!(tree.children(wrapper), &[table]);
        assert_eq!(tree.position(wrapper), Some(1));
        assert_eq!(
            render_children(&tree, body),
            r#"<p>before</p><div class="w"><table class="chapter-table"><tbody><tr><td>1</td></tr></tbody></table></div><p>after</p>"#
        );
    }

    #[test]
    fn test_wrap_all_nested() {
        let (mut tree, body) = parse("<section><section>x</section></section>");
        let wrapped = wrap_all(&mut tree, body, &Selector::element("section"), "div", &[]);
        assert_eq!(wrapped, 2);
        assert_eq!(render_children(&tree, body), "<div><section><div><section>x</section></div></section></div>");
    }

    #[test]
    fn test_insert_child_at() {
        let (mut tree, body) = parse(r#"<p id="x">text</p>"#);
        let p = first(&tree, &Selector::element("p"));
        let head = tree.create_element("span", Vec::new());
        let tail = tree.create_element("em", Vec::new());
        assert!(insert_child_at(&mut tree, p, head, Position::First));
        assert!(insert_child_at(&mut tree, p, tail, Position::Last));
        assert_eq!(render_children(&tree, body), r#"<p id="x"><span></span>text<em></em></p>"#);
    }

    #[test]
    fn test_insert_child_at_detached_anchor() {
        let mut tree = DomTree::new();
        let anchor = tree.create_element("div", Vec::new());
        let child = tree.create_element("span", Vec::new());
        assert!(!insert_child_at(&mut tree, anchor, child, Position::First));
        assert!(!tree.is_attached(child));
    }

    #[test]
    fn test_disable_attribute() {
        let (mut tree, _) = parse(r#"<button class="x" onclick="go()">b</button>"#);
        let button = first(&tree, &Selector::element("button"));
        assert!(disable_attribute(&mut tree, button, "onclick"));
        assert_eq!(tree.attr(button, "onclick"), None);
        assert_eq!(tree.attr(button, "xxxonclick"), Some("go()"));
        assert!(!disable_attribute(&mut tree, button, "onclick"));
    }

    #[test]
    fn test_disable_attribute_all_counts() {
        let (mut tree, body) = parse(r#"<a onclick="a()">1</a><b onclick="b()">2</b><i>3</i>"#);
        let count = disable_attribute_all(&mut tree, body, &Selector::has_attr("onclick"), "onclick");
        assert_eq!(count, 2);
        assert!(render_children(&tree, body).contains(r#"<a xxxonclick="a()">"#));
    }
}
