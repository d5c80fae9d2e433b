pub mod assemble;
pub mod dom_tree;
pub mod error;
pub mod fetch;
pub mod parse;
pub mod record;
pub mod sanitize;
pub mod select;
pub mod serialize;
pub mod transform;
pub mod walk;

pub use assemble::{Assembler, AssemblerConfig, GENERATOR, MetaAllowList, UNKNOWN_DOC_ID};
#[doc(hidden)]
pub use dom_tree::{AttrMap, Attribute, DomNode, DomTree, HTML_NAMESPACE, NodeData, NodeId};
pub use error::{DocsanError, Result};
pub use fetch::{fetch_file, fetch_stdin};
pub use parse::Document;
pub use record::{DocumentRecord, JsonPayload, Slot, SlotShape, SlotWarning};
pub use sanitize::{sanitize_document, sanitize_html};
pub use select::{AttrTest, Selector};
pub use serialize::{
    SerializableNode, is_comment_safe, render, render_children, render_children_commenting_parent, text_content,
};
pub use transform::{
    DISABLED_ATTRIBUTE_PREFIX, Position, disable_attribute, disable_attribute_all, insert_child_at, remove,
    remove_all, replace_all_with_comments, replace_all_with_content, replace_with_comment, replace_with_content, wrap,
    wrap_all,
};
pub use walk::{Descendants, descendants, find_all, find_first};

/// Generator tag for records produced by this version of the crate
pub fn generated_tag() -> String {
    format!("docsan {}", env!("CARGO_PKG_VERSION"))
}

/// Parses `html` and assembles its record in one call.
///
/// # Example
///
/// ```rust
/// use docsan_core::{AssemblerConfig, assemble_html};
///
/// let record = assemble_html("<p>hi</p>", &AssemblerConfig::default()).unwrap();
/// assert_eq!(record.doc_id, "unknown");
/// assert_eq!(record.body, "<!--<body>--><p>hi</p><!--</body>-->");
/// ```
pub fn assemble_html(html: &str, config: &AssemblerConfig) -> Result<DocumentRecord> {
    let document = Document::parse(html)?;
    Ok(Assembler::new(config.clone()).assemble(document))
}
