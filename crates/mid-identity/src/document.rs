//! # Documents and Attribute Subsets
//!
//! A document is an arbitrary JSON object of attributes (a passport, a
//! driver's licence, an insurance card). The engine never interprets the
//! attribute values; it only selects subsets of them and canonicalizes those.

use std::collections::BTreeMap;

use mid_core::DocumentId;
use serde_json::{Map, Value};

/// One identity document: attribute name to value.
pub type Document = Map<String, Value>;

/// Per-document list of attribute names to commit to, keyed by document id.
pub type SelectiveAttributes = BTreeMap<DocumentId, Vec<String>>;

/// Name of the attribute that identifies a document within an identity.
pub const ID_ATTRIBUTE: &str = "id";

/// Identifier of `document` at position `index` of the submitted list.
///
/// A string `id` is used verbatim. Any other non-null `id` is rendered as
/// compact JSON. Without an `id` the position is used.
pub fn document_id(document: &Document, index: usize) -> DocumentId {
    claimed_id(document).unwrap_or_else(|| DocumentId(index.to_string()))
}

/// The identifier a document carries itself, without positional fallback.
pub fn claimed_id(document: &Document) -> Option<DocumentId> {
    match document.get(ID_ATTRIBUTE) {
        Some(Value::String(s)) => Some(DocumentId(s.clone())),
        Some(Value::Null) | None => None,
        Some(other) => Some(DocumentId(other.to_string())),
    }
}

/// Keep only the attributes named in `names` that the document has.
pub fn select_attributes<S: AsRef<str>>(document: &Document, names: &[S]) -> Document {
    names
        .iter()
        .filter_map(|name| {
            let name = name.as_ref();
            document
                .get(name)
                .map(|value| (name.to_string(), value.clone()))
        })
        .collect()
}

/// The committed subset for issuance: the selective list when present and
/// non-empty, otherwise every attribute.
pub fn committed_subset(document: &Document, names: Option<&[String]>) -> Document {
    match names {
        Some(names) if !names.is_empty() => select_attributes(document, names),
        _ => document.clone(),
    }
}
