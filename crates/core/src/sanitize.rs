//! Whole-document sanitizing.
//!
//! Unlike [`Assembler`](crate::Assembler), which only sanitizes the body,
//! this keeps the full document and returns it as markup.

use crate::select::Selector;
use crate::transform::replace_all_with_comments;
use crate::{Document, Result};

/// Scripts and stylesheet links anywhere in the document
fn active_content() -> Selector {
    Selector::or([
        Selector::element("script"),
        Selector::and([Selector::element("link"), Selector::attr_equals("rel", "stylesheet")]),
    ])
}

/// Comments out active content in `document` and returns how many nodes changed.
pub fn sanitize_document(document: &mut Document) -> usize {
    let tree = document.tree_mut();
    let root = tree.root();
    let count = replace_all_with_comments(tree, root, &active_content());
    tracing::debug!(count, "commented out active content");
    count
}

/// Parses `html`, comments out every script and stylesheet link, and
/// renders the whole document again, doctype included.
pub fn sanitize_html(html: &str) -> Result<String> {
    let mut document = Document::parse(html)?;
    sanitize_document(&mut document);
    Ok(document.to_html())
}
