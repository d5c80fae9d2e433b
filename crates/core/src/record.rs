//! Document record output type.
//!
//! This module defines [`DocumentRecord`], the JSON document handed to
//! downstream publishing tools, and the embedded-JSON [`Slot`]s it carries.

use std::fmt;
use std::io::Write;

use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;

use crate::Result;
use crate::dom_tree::AttrMap;

/// Shape of an empty slot payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotShape {
    Object,
    Array,
}

impl SlotShape {
    /// The empty JSON value of this shape
    pub fn empty_json(self) -> &'static str {
        match self {
            SlotShape::Object => "{}",
            SlotShape::Array => "[]",
        }
    }
}

/// A well-known embedded-JSON location: a `<script id="...">` in `head`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Outline,
    Sumtab,
    Links,
    SeeAlso,
    Tables,
    Lookup,
    SpecialCopyrights,
}

impl Slot {
    pub const ALL: [Slot; 7] = [
        Slot::Outline,
        Slot::Sumtab,
        Slot::Links,
        Slot::SeeAlso,
        Slot::Tables,
        Slot::Lookup,
        Slot::SpecialCopyrights,
    ];

    /// The `id` of the script element holding this slot
    pub fn script_id(self) -> &'static str {
        match self {
            Slot::Outline => "outline",
            Slot::Sumtab => "sumtab",
            Slot::Links => "links",
            Slot::SeeAlso => "references",
            Slot::Tables => "tables",
            Slot::Lookup => "lookup",
            Slot::SpecialCopyrights => "specialcopyrights",
        }
    }

    /// Field name in the JSON record
    pub fn field_name(self) -> &'static str {
        match self {
            Slot::SeeAlso => "seealso",
            other => other.script_id(),
        }
    }

    pub fn shape(self) -> SlotShape {
        match self {
            Slot::Tables | Slot::Lookup => SlotShape::Array,
            _ => SlotShape::Object,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// A syntactically valid JSON value kept as text and emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPayload(String);

impl JsonPayload {
    /// Validate `text` as JSON. Surrounding whitespace is dropped.
    pub fn parse(text: &str) -> std::result::Result<Self, serde_json::Error> {
        let raw: &RawValue = serde_json::from_str(text)?;
        Ok(Self(raw.get().to_string()))
    }

    /// The empty value of `shape`
    pub fn empty(shape: SlotShape) -> Self {
        Self(shape.empty_json().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Serialize for JsonPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let raw: &RawValue = serde_json::from_str(&self.0).map_err(S::Error::custom)?;
        raw.serialize(serializer)
    }
}

/// A slot payload that could not be used as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotWarning {
    pub slot: Slot,
    pub message: String,
}

impl fmt::Display for SlotWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid JSON in slot {}: {}", self.slot, self.message)
    }
}

/// The assembled output for one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    /// Generator tag supplied by the embedding application.
    pub generated: String,

    /// Text of the head's `title`, empty if none.
    pub title: String,

    /// Attribute maps of the allow-listed `meta` elements, in document order.
    pub metas: Vec<AttrMap>,

    pub outline: JsonPayload,
    pub sumtab: JsonPayload,
    pub links: JsonPayload,
    pub seealso: JsonPayload,
    pub tables: JsonPayload,
    pub lookup: JsonPayload,
    pub specialcopyrights: JsonPayload,

    /// Attribute maps of the head scripts that are not slots.
    pub scripts: Vec<AttrMap>,

    /// Sanitized body markup framed by the commented-out body tag.
    pub body: String,

    /// Document id from the `docid` meta, `"unknown"` if absent.
    #[serde(skip)]
    pub doc_id: String,

    /// Slots that fell back to their default.
    #[serde(skip)]
    pub warnings: Vec<SlotWarning>,
}

impl DocumentRecord {
    /// Payload of a slot
    pub fn slot(&self, slot: Slot) -> &JsonPayload {
        match slot {
            Slot::Outline => &self.outline,
            Slot::Sumtab => &self.sumtab,
            Slot::Links => &self.links,
            Slot::SeeAlso => &self.seealso,
            Slot::Tables => &self.tables,
            Slot::Lookup => &self.lookup,
            Slot::SpecialCopyrights => &self.specialcopyrights,
        }
    }

    /// Encodes the record, indented with two spaces when `pretty`.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty { serde_json::to_string_pretty(self)? } else { serde_json::to_string(self)? };
        Ok(json)
    }

    /// Writes the encoded record to `writer`.
    pub fn write_json<W: Write>(&self, writer: W, pretty: bool) -> Result<()> {
        if pretty {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_json::to_writer(writer, self)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_record() -> DocumentRecord {
        let payload = |slot: Slot| JsonPayload::empty(slot.shape());
        DocumentRecord {
            generated: "docsan test".to_string(),
            title: "Title".to_string(),
            metas: vec![AttrMap::from([("name".to_string(), "docid".to_string())])],
            outline: payload(Slot::Outline),
            sumtab: payload(Slot::Sumtab),
            links: payload(Slot::Links),
            seealso: payload(Slot::SeeAlso),
            tables: payload(Slot::Tables),
            lookup: payload(Slot::Lookup),
            specialcopyrights: payload(Slot::SpecialCopyrights),
            scripts: Vec::new(),
            body: "<!--<body>--><!--</body>-->".to_string(),
            doc_id: "X".to_string(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_slot_ids_and_shapes() {
        assert_eq!(Slot::SeeAlso.script_id(), "references");
        assert_eq!(Slot::SeeAlso.field_name(), "seealso");
        assert_eq!(Slot::Tables.shape(), SlotShape::Array);
        assert_eq!(Slot::Lookup.shape(), SlotShape::Array);
        assert_eq!(Slot::SpecialCopyrights.shape(), SlotShape::Object);
    }

    #[test]
    fn test_json_payload_parse() {
        let payload = JsonPayload::parse("  {\"a\": [1, 2]}\n").unwrap();
        assert_eq!(payload.as_str(), "{\"a\": [1, 2]}");
        assert!(JsonPayload::parse("{not json").is_err());
        assert!(JsonPayload::parse("").is_err());
    }

    #[test]
    fn test_payload_serialized_verbatim() {
        let payload = JsonPayload::parse(r#"{"b":1,"a":2}"#).unwrap();
        assert_eq!(serde_json::to_string(&payload).unwrap(), r#"{"b":1,"a":2}"#);
    }

    #[test]
    fn test_record_field_names() {
        let json = empty_record().to_json(false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let object = value.as_object().unwrap();
        for field in [
            "generated", "title", "metas", "outline", "sumtab", "links", "seealso", "tables", "lookup",
            "specialcopyrights", "scripts", "body",
        ] {
            assert!(object.contains_key(field), "missing {field}");
        }
        assert_eq!(object.len(), 12);
        assert!(json.contains(r#""outline":{}"#));
        assert!(json.contains(r#""tables":[]"#));
    }

    #[test]
    fn test_record_pretty() {
        let record = empty_record();
        let pretty = record.to_json(true).unwrap();
        assert!(pretty.contains("\n  \"title\": \"Title\""));

        let mut buffer = Vec::new();
        record.write_json(&mut buffer, true).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), pretty);
    }

    #[test]
    fn test_slot_warning_display() {
        let warning = SlotWarning { slot: Slot::SeeAlso, message: "EOF".to_string() };
        assert_eq!(warning.to_string(), "invalid JSON in slot seealso: EOF");
    }
}
