// Document I/O - raw records read from content files and resolved documents

mod front_matter;

pub use front_matter::{parse_document, read_document, split_front_matter};

use crate::path;
use serde::{Deserialize, Serialize};

/// A document body in its original and rendered forms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    pub raw: String,
    pub html: String,
}

/// Path-derived metadata carried by every document under `_raw`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInfo {
    pub source_file_path: String,
    pub source_file_name: String,
    pub source_file_dir: String,
    pub content_type: String,
    pub flattened_path: String,
}

impl RawInfo {
    pub fn from_path(relative_path: &str) -> Self {
        let normalized = path::normalize_separators(relative_path);
        let (dir, name) = path::split_dir(&normalized);
        RawInfo {
            source_file_dir: if dir.is_empty() { ".".into() } else { dir.to_string() },
            source_file_name: name.to_string(),
            content_type: "markdown".into(),
            flattened_path: path::flatten(&normalized),
            source_file_path: normalized,
        }
    }
}

/// A parsed content file whose front matter has not been checked yet
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// Path relative to the content root, `/`-separated
    pub path: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub body: Body,
}

/// A fully resolved document: declared and computed fields plus `_raw`
/// path metadata and the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(flatten)]
    fields: serde_json::Map<String, serde_json::Value>,
    #[serde(rename = "_raw")]
    raw: RawInfo,
    body: Body,
}

impl Document {
    /// A document with no fields yet, for the given relative file path.
    pub fn new(type_name: impl Into<String>, relative_path: &str, body: Body) -> Self {
        let raw = RawInfo::from_path(relative_path);
        Document {
            id: raw.source_file_path.clone(),
            type_name: type_name.into(),
            fields: serde_json::Map::new(),
            raw,
            body,
        }
    }

    pub(crate) fn insert(&mut self, name: String, value: serde_json::Value) {
        self.fields.insert(name, value);
    }

    /// Source file path relative to the content root
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.fields
    }

    pub fn raw(&self) -> &RawInfo {
        &self.raw
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn flattened_path(&self) -> &str {
        &self.raw.flattened_path
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.as_str())
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|v| v.as_f64())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|v| v.as_bool())
    }

    /// The `url` computed field, when the type defines one.
    pub fn url(&self) -> Option<&str> {
        self.get_str("url")
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
