use crate::document::Document;
use crate::error::BoxError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A computed-field resolution function. Receives the in-progress document
/// (declared fields, `_raw`, body and earlier computed fields).
pub type ResolveFn =
    Arc<dyn Fn(&Document) -> Result<serde_json::Value, BoxError> + Send + Sync>;

/// Field kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Date,
    List,
    Enum,
    Json,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::List => "list",
            FieldKind::Enum => "enum",
            FieldKind::Json => "json",
        }
    }

    /// Kinds a list may hold.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            FieldKind::String | FieldKind::Number | FieldKind::Boolean | FieldKind::Date | FieldKind::Json
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Definition of a single field of a document type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    /// Allowed values of an `enum` field
    #[serde(default)]
    pub options: Option<Vec<String>>,
    /// Item kind of a `list` field
    #[serde(default)]
    pub of: Option<FieldKind>,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        FieldSpec {
            kind,
            required: false,
            description: None,
            default: None,
            options: None,
            of: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    pub fn json() -> Self {
        Self::new(FieldKind::Json)
    }

    pub fn list_of(item: FieldKind) -> Self {
        FieldSpec {
            of: Some(item),
            ..Self::new(FieldKind::List)
        }
    }

    pub fn enumeration<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldSpec {
            options: Some(options.into_iter().map(Into::into).collect()),
            ..Self::new(FieldKind::Enum)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Human-readable form of what this spec accepts, used in type errors.
    pub fn expected(&self) -> String {
        match (self.kind, &self.options, self.of) {
            (FieldKind::Enum, Some(options), _) => format!("one of [{}]", options.join(", ")),
            (FieldKind::List, _, Some(item)) => format!("list of {item}"),
            (kind, _, _) => kind.to_string(),
        }
    }
}

/// A field derived at build time from the rest of the document.
#[derive(Clone)]
pub struct ComputedField {
    pub name: String,
    pub spec: FieldSpec,
    resolve: ResolveFn,
}

impl ComputedField {
    pub fn new(name: impl Into<String>, spec: FieldSpec, resolve: ResolveFn) -> Self {
        ComputedField {
            name: name.into(),
            spec,
            resolve,
        }
    }

    pub fn resolve(&self, document: &Document) -> Result<serde_json::Value, BoxError> {
        (self.resolve)(document)
    }
}

impl fmt::Debug for ComputedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedField")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Definition of one class of content: which files belong to it, which
/// front-matter fields they declare and which fields are derived.
#[derive(Debug, Clone)]
pub struct DocumentType {
    pub name: String,
    pub file_path_pattern: String,
    pub description: Option<String>,
    pub fields: Vec<(String, FieldSpec)>,
    pub computed_fields: Vec<ComputedField>,
}

impl DocumentType {
    pub fn new(name: impl Into<String>, file_path_pattern: impl Into<String>) -> Self {
        DocumentType {
            name: name.into(),
            file_path_pattern: file_path_pattern.into(),
            description: None,
            fields: Vec::new(),
            computed_fields: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), spec));
        self
    }

    pub fn computed<F>(mut self, name: impl Into<String>, spec: FieldSpec, resolve: F) -> Self
    where
        F: Fn(&Document) -> Result<serde_json::Value, BoxError> + Send + Sync + 'static,
    {
        self.computed_fields
            .push(ComputedField::new(name, spec, Arc::new(resolve)));
        self
    }

    pub fn computed_field(mut self, field: ComputedField) -> Self {
        self.computed_fields.push(field);
        self
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, spec)| spec)
    }

    /// Name the collection is published under, e.g. `Post` -> `allPosts`.
    pub fn collection_name(&self) -> String {
        collection_name(&self.name)
    }
}

/// `all` + the pluralized type name.
pub fn collection_name(type_name: &str) -> String {
    format!("all{}", pluralize(type_name))
}

/// Naive pluralization of English words.
pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    let consonant_y = lower.ends_with('y')
        && !matches!(
            lower.chars().rev().nth(1),
            Some('a' | 'e' | 'i' | 'o' | 'u')
        );
    if consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}
