//! Document assembly: turns a parsed document into a [`DocumentRecord`].
//!
//! The [`Assembler`] builds every selector it needs once, at construction.
//! It holds no per-document state, so a single instance can be shared by
//! reference between concurrent requests, each owning its own [`Document`].
//!
//! # Example
//!
//! ```rust
//! use docsan_core::{Assembler, AssemblerConfig, Document, MetaAllowList};
//!
//! let assembler = Assembler::new(AssemblerConfig {
//!     meta_names: MetaAllowList::new(["docid"]),
//!     generated: "docsan 1.0.0".to_string(),
//! });
//!
//! let html = r#"<html><head><title>Guide</title><meta name="docid" content="g-1"></head>
//! <body><p>Text</p></body></html>"#;
//! let record = assembler.assemble(Document::parse(html).unwrap());
//! assert_eq!(record.title, "Guide");
//! assert_eq!(record.doc_id, "g-1");
//! assert_eq!(record.outline.as_str(), "{}");
//! ```

use std::collections::HashSet;

use tracing::{debug, info, info_span, warn};

use crate::Document;
use crate::dom_tree::{AttrMap, Attribute, DomTree, NodeId};
use crate::record::{DocumentRecord, JsonPayload, Slot, SlotWarning};
use crate::select::Selector;
use crate::serialize::{render_children_commenting_parent, text_content};
use crate::transform::{Position, disable_attribute_all, insert_child_at, remove_all, replace_all_with_comments, wrap_all};
use crate::walk::{find_all, find_first};

/// Value of the `data-generator` attribute on every element this crate adds
pub const GENERATOR: &str = "docsan";

/// Fallback document id
pub const UNKNOWN_DOC_ID: &str = "unknown";

/// Head script that is dropped along with the slots but is not one
const TOC_SCRIPT_ID: &str = "script_toc";

/// Set of `meta` names allowed into the record.
///
/// Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaAllowList {
    names: HashSet<String>,
}

impl MetaAllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { names: names.into_iter().map(Into::into).collect() }
    }

    pub fn allows(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Configuration injected by the embedding application.
#[derive(Debug, Clone, Default)]
pub struct AssemblerConfig {
    /// Which named metas are kept. Metas without a `name` are always kept.
    pub meta_names: MetaAllowList,
    /// Copied into the record's `generated` field.
    pub generated: String,
}

/// Kind of placeholder injected into annotatable elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Notice,
    SeeAlso,
}

impl Placeholder {
    fn id_prefix(self) -> &'static str {
        match self {
            Placeholder::Notice => "notice_",
            Placeholder::SeeAlso => "seealso_",
        }
    }

    fn class(self) -> &'static str {
        match self {
            Placeholder::Notice => "ib-notice",
            Placeholder::SeeAlso => "ib-seealso",
        }
    }

    fn position(self) -> Position {
        match self {
            Placeholder::Notice => Position::First,
            Placeholder::SeeAlso => Position::Last,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Placeholder::Notice => "notice",
            Placeholder::SeeAlso => "seealso",
        }
    }

    fn existing(self) -> Selector {
        Selector::and([Selector::element("div"), Selector::attr_prefix("id", self.id_prefix())])
    }
}

/// Selectors used by the pipeline, built once.
#[derive(Debug, Clone)]
struct Selectors {
    head: Selector,
    body: Selector,
    title: Selector,
    meta: Selector,
    slots: Vec<(Slot, Selector)>,
    dropped_scripts: Selector,
    kept_scripts: Selector,
    notice_placeholder: Selector,
    seealso_placeholder: Selector,
    annotatable: Selector,
    commented_out: Selector,
    chapter_tables: Selector,
    click_handlers: Selector,
}

impl Selectors {
    fn new() -> Self {
        let script_with_id = |id: &str| Selector::and([Selector::element("script"), Selector::attr_equals("id", id)]);

        let slots: Vec<(Slot, Selector)> =
            Slot::ALL.iter().map(|&slot| (slot, script_with_id(slot.script_id()))).collect();

        let dropped_ids = Slot::ALL
            .iter()
            .map(|slot| slot.script_id())
            .chain([TOC_SCRIPT_ID])
            .map(|id| Selector::attr_equals("id", id));
        let dropped_scripts = Selector::and([Selector::element("script"), Selector::or(dropped_ids)]);
        let kept_scripts = Selector::and([Selector::element("script"), Selector::not(dropped_scripts.clone())]);

        Self {
            head: Selector::element("head"),
            body: Selector::element("body"),
            title: Selector::element("title"),
            meta: Selector::element("meta"),
            slots,
            dropped_scripts,
            kept_scripts,
            notice_placeholder: Placeholder::Notice.existing(),
            seealso_placeholder: Placeholder::SeeAlso.existing(),
            annotatable: Selector::and([
                Selector::any_element(),
                Selector::attr_contains("class", "annotatable"),
                Selector::has_attr("id"),
            ]),
            commented_out: Selector::or([
                Selector::element("script"),
                Selector::and([Selector::element("link"), Selector::attr_equals("rel", "stylesheet")]),
                Selector::and([Selector::element("p"), Selector::attr_contains("class", "compare-to")]),
            ]),
            chapter_tables: Selector::and([
                Selector::element("table"),
                Selector::attr_contains("class", "chapter-table"),
            ]),
            click_handlers: Selector::and([
                Selector::any_element(),
                Selector::has_attr("onclick"),
                Selector::not(Selector::attr_contains("class", "dyncal-button")),
            ]),
        }
    }

    fn placeholder(&self, kind: Placeholder) -> &Selector {
        match kind {
            Placeholder::Notice => &self.notice_placeholder,
            Placeholder::SeeAlso => &self.seealso_placeholder,
        }
    }
}

/// Runs the assembly pipeline.
#[derive(Debug, Clone)]
pub struct Assembler {
    config: AssemblerConfig,
    selectors: Selectors,
}

impl Assembler {
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config, selectors: Selectors::new() }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Rewrites `document` and collects everything the record needs.
    ///
    /// Never fails: missing structure and malformed slot payloads fall back
    /// to empty values. Fallbacks are listed in the record's `warnings`.
    pub fn assemble(&self, document: Document) -> DocumentRecord {
        let mut tree = document.into_tree();
        let root = tree.root();
        let sel = &self.selectors;

        let head = find_first(&tree, root, &sel.head);
        let body = find_first(&tree, root, &sel.body);

        let title = head
            .and_then(|head| find_first(&tree, head, &sel.title))
            .map(|title| text_content(&tree, title))
            .unwrap_or_default();

        let metas = head.map(|head| self.metas(&tree, head)).unwrap_or_default();
        let doc_id = doc_id(&metas);

        let span = info_span!("assemble", doc_id = %doc_id);
        let _guard = span.enter();

        let mut warnings = Vec::new();
        let mut payloads = Slot::ALL.map(|slot| JsonPayload::empty(slot.shape()));
        for (index, (slot, selector)) in sel.slots.iter().enumerate() {
            if let Some(script) = head.and_then(|head| find_first(&tree, head, selector)) {
                match JsonPayload::parse(&text_content(&tree, script)) {
                    Ok(payload) => payloads[index] = payload,
                    Err(err) => {
                        let warning = SlotWarning { slot: *slot, message: err.to_string() };
                        warn!(slot = %slot, error = %err, "invalid JSON payload, using default");
                        warnings.push(warning);
                    }
                }
            }
        }

        let scripts = head
            .map(|head| {
                find_all(&tree, head, &sel.kept_scripts)
                    .into_iter()
                    .map(|script| tree.attr_map(script))
                    .collect()
            })
            .unwrap_or_default();

        if let Some(body) = body {
            self.add_placeholders(&mut tree, body, Placeholder::Notice);
            self.add_placeholders(&mut tree, body, Placeholder::SeeAlso);
        }

        let removed = remove_all(&mut tree, root, &sel.dropped_scripts);
        debug!(removed, "removed slot scripts");

        let body_markup = match body {
            Some(body) => {
                self.sanitize_body(&mut tree, body);
                render_children_commenting_parent(&tree, body)
            }
            None => String::new(),
        };

        let [outline, sumtab, links, seealso, tables, lookup, specialcopyrights] = payloads;
        DocumentRecord {
            generated: self.config.generated.clone(),
            title,
            metas,
            outline,
            sumtab,
            links,
            seealso,
            tables,
            lookup,
            specialcopyrights,
            scripts,
            body: body_markup,
            doc_id,
            warnings,
        }
    }

    /// Attribute maps of head metas that pass the allow-list.
    fn metas(&self, tree: &DomTree, head: NodeId) -> Vec<AttrMap> {
        find_all(tree, head, &self.selectors.meta)
            .into_iter()
            .map(|meta| tree.attr_map(meta))
            .filter(|attrs| attrs.get("name").is_none_or(|name| self.config.meta_names.allows(name)))
            .collect()
    }

    /// Adds a placeholder `div` to every annotatable element under `body`,
    /// unless a placeholder of this kind already exists anywhere under it.
    fn add_placeholders(&self, tree: &mut DomTree, body: NodeId, kind: Placeholder) -> usize {
        if find_first(tree, body, self.selectors.placeholder(kind)).is_some() {
            debug!(kind = kind.label(), "placeholders already present");
            return 0;
        }

        let targets = find_all(tree, body, &self.selectors.annotatable);
        let mut added = 0;
        for target in targets {
            let id = tree.attr(target, "id").unwrap_or_default();
            let attrs = vec![
                Attribute::new("id", format!("{}{}", kind.id_prefix(), id)),
                Attribute::new("class", kind.class()),
                Attribute::new("data-generator", GENERATOR),
            ];
            let div = tree.create_element("div", attrs);
            if insert_child_at(tree, target, div, kind.position()) {
                added += 1;
            }
        }
        if added > 0 {
            info!("adding {} {} placeholders", added, kind.label());
        }
        added
    }

    /// Comments out scripts and stylesheets, wraps chapter tables and
    /// disables click handlers.
    fn sanitize_body(&self, tree: &mut DomTree, body: NodeId) {
        let sel = &self.selectors;

        let commented = replace_all_with_comments(tree, body, &sel.commented_out);
        if commented > 0 {
            debug!(count = commented, "commented out scripts and stylesheets");
        }

        let wrapper_attrs = [Attribute::new("class", "ib-table-wrapper"), Attribute::new("data-generator", GENERATOR)];
        let wrapped = wrap_all(tree, body, &sel.chapter_tables, "div", &wrapper_attrs);
        if wrapped > 0 {
            info!("wrapping {} tables", wrapped);
        }

        let disabled = disable_attribute_all(tree, body, &sel.click_handlers, "onclick");
        if disabled > 0 {
            info!("disabling {} onclick events", disabled);
        }
    }
}

/// `content` of the first meta named `docid` (any case).
fn doc_id(metas: &[AttrMap]) -> String {
    metas
        .iter()
        .find(|meta| meta.get("name").is_some_and(|name| name.eq_ignore_ascii_case("docid")))
        .and_then(|meta| meta.get("content"))
        .cloned()
        .unwrap_or_else(|| UNKNOWN_DOC_ID.to_string())
}
