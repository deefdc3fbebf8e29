use super::parser::TypeDef;
use super::types::{DocumentType, FieldKind, FieldSpec};
use crate::error::{FolioError, Result};
use crate::locator;
use crate::resolver;
use std::collections::HashSet;
use std::sync::Arc;

/// Keys every resolved document carries besides its schema fields.
pub const RESERVED_FIELDS: &[&str] = &["_id", "_raw", "type", "body"];

/// Opaque reference to a registered document type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeHandle {
    index: usize,
    name: String,
}

impl TypeHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone)]
struct RegisteredType {
    definition: Arc<DocumentType>,
    matcher: glob::Pattern,
}

/// Collects document type definitions before a build.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    types: Vec<RegisteredType>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document type. Fails on a duplicate type name or an
    /// inconsistent field set.
    pub fn register(&mut self, definition: DocumentType) -> Result<TypeHandle> {
        if self.get(&definition.name).is_some() {
            return Err(FolioError::DuplicateType(definition.name));
        }
        validate_definition(&definition)?;
        let matcher = compile_matcher(&definition)?;

        let handle = TypeHandle {
            index: self.types.len(),
            name: definition.name.clone(),
        };
        log::debug!(
            "Registered document type {} ({})",
            definition.name,
            definition.file_path_pattern
        );
        self.types.push(RegisteredType {
            definition: Arc::new(definition),
            matcher,
        });
        Ok(handle)
    }

    pub fn get(&self, name: &str) -> Option<&DocumentType> {
        self.types
            .iter()
            .find(|t| t.definition.name == name)
            .map(|t| t.definition.as_ref())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Freeze the registry. Only a sealed registry can be built.
    pub fn seal(self) -> SealedRegistry {
        SealedRegistry {
            types: self.types.into(),
        }
    }
}

/// Immutable set of document types, shared by a store and its rebuilds.
#[derive(Debug, Clone)]
pub struct SealedRegistry {
    types: Arc<[RegisteredType]>,
}

impl SealedRegistry {
    /// Document types in registration order.
    pub fn types(&self) -> impl Iterator<Item = &Arc<DocumentType>> {
        self.types.iter().map(|t| &t.definition)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<DocumentType>> {
        self.types().find(|t| t.name == name)
    }

    pub fn handle(&self, handle: &TypeHandle) -> Option<&Arc<DocumentType>> {
        self.types
            .get(handle.index)
            .map(|t| &t.definition)
            .filter(|t| t.name == handle.name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.types().map(|t| t.name.as_str()).collect()
    }

    /// Document types whose file pattern selects the given relative path.
    pub fn types_matching(&self, relative_path: &str) -> Vec<&Arc<DocumentType>> {
        self.types
            .iter()
            .filter(|t| locator::matches(&t.matcher, relative_path))
            .map(|t| &t.definition)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Check a configured type definition the way [`SchemaRegistry::register`]
/// would, without binding its computed fields to functions.
pub fn check_type_def(def: &TypeDef) -> Result<()> {
    let mut definition = DocumentType::new(def.name.as_str(), def.file_path_pattern.as_str());
    definition.fields = def.fields.clone();
    for (name, computed) in &def.computed_fields {
        definition = definition.computed(name.as_str(), computed.spec.clone(), |_| {
            Ok(serde_json::Value::Null)
        });
    }
    validate_definition(&definition)?;
    compile_matcher(&definition).map(|_| ())
}

fn compile_matcher(definition: &DocumentType) -> Result<glob::Pattern> {
    locator::compile_pattern(&definition.file_path_pattern).map_err(|e| {
        FolioError::InvalidSchema {
            type_name: definition.name.clone(),
            reason: e.to_string(),
        }
    })
}

fn validate_definition(definition: &DocumentType) -> Result<()> {
    let invalid = |reason: String| FolioError::InvalidSchema {
        type_name: definition.name.clone(),
        reason,
    };

    let name_ok = definition
        .name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && definition
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !name_ok {
        return Err(invalid(
            "type name must start with a letter and contain only letters, digits or '_'".into(),
        ));
    }

    if definition.file_path_pattern.trim().is_empty() {
        return Err(invalid("file_path_pattern is empty".into()));
    }

    let mut seen = HashSet::new();
    for (name, spec) in &definition.fields {
        check_field_name(name).map_err(&invalid)?;
        if !seen.insert(name.as_str()) {
            return Err(invalid(format!("field '{name}' is declared twice")));
        }
        check_spec(name, spec).map_err(&invalid)?;
    }

    let mut computed_seen = HashSet::new();
    for field in &definition.computed_fields {
        check_field_name(&field.name).map_err(&invalid)?;
        if seen.contains(field.name.as_str()) {
            return Err(invalid(format!(
                "'{}' is both a declared and a computed field",
                field.name
            )));
        }
        if !computed_seen.insert(field.name.as_str()) {
            return Err(invalid(format!(
                "computed field '{}' is declared twice",
                field.name
            )));
        }
        check_spec(&field.name, &field.spec).map_err(&invalid)?;
    }

    Ok(())
}

fn check_field_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("field names must not be empty".into());
    }
    if RESERVED_FIELDS.contains(&name) {
        return Err(format!("'{name}' is a reserved field name"));
    }
    Ok(())
}

fn check_spec(name: &str, spec: &FieldSpec) -> std::result::Result<(), String> {
    match spec.kind {
        FieldKind::Enum => match &spec.options {
            Some(options) if !options.is_empty() => {}
            _ => return Err(format!("enum field '{name}' needs at least one option")),
        },
        _ if spec.options.is_some() => {
            return Err(format!("'options' is only valid on enum fields ('{name}')"));
        }
        _ => {}
    }

    match (spec.kind, spec.of) {
        (FieldKind::List, Some(item)) if !item.is_scalar() => {
            return Err(format!("list field '{name}' cannot hold {item} items"));
        }
        (FieldKind::List, _) | (_, None) => {}
        (_, Some(_)) => return Err(format!("'of' is only valid on list fields ('{name}')")),
    }

    if let Some(default) = &spec.default {
        resolver::check_value(name, spec, default)
            .map_err(|e| format!("invalid default: {e}"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post() -> DocumentType {
        DocumentType::new("Post", "**/posts/*.md")
            .field("title", FieldSpec::string().required())
            .field("date", FieldSpec::date().required())
            .computed("url", FieldSpec::string(), |doc| {
                Ok(json!(format!("/{}", doc.flattened_path())))
            })
    }

    #[test]
    fn test_register_returns_handle() {
        let mut registry = SchemaRegistry::new();
        let handle = registry.register(post()).unwrap();
        assert_eq!(handle.name(), "Post");
        assert_eq!(registry.len(), 1);

        let sealed = registry.seal();
        assert_eq!(sealed.handle(&handle).unwrap().name, "Post");
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut registry = SchemaRegistry::new();
        registry.register(post()).unwrap();
        let err = registry.register(post()).unwrap_err();
        assert!(matches!(err, FolioError::DuplicateType(name) if name == "Post"));
    }

    #[test]
    fn test_declared_computed_collision_rejected() {
        let mut registry = SchemaRegistry::new();
        let def = post().computed("title", FieldSpec::string(), |_| Ok(json!("x")));
        let err = registry.register(def).unwrap_err();
        assert!(matches!(err, FolioError::InvalidSchema { .. }));
        assert!(err.to_string().contains("title"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_declared_field_rejected() {
        let mut registry = SchemaRegistry::new();
        let def = post().field("title", FieldSpec::string());
        assert!(matches!(
            registry.register(def),
            Err(FolioError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_reserved_field_rejected() {
        let mut registry = SchemaRegistry::new();
        let def = DocumentType::new("Page", "*.md").field("_raw", FieldSpec::json());
        let err = registry.register(def).unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_enum_without_options_rejected() {
        let mut registry = SchemaRegistry::new();
        let def = DocumentType::new("Page", "*.md").field("status", FieldSpec::new(FieldKind::Enum));
        assert!(registry.register(def).is_err());
    }

    #[test]
    fn test_invalid_default_rejected() {
        let mut registry = SchemaRegistry::new();
        let def = DocumentType::new("Page", "*.md").field(
            "status",
            FieldSpec::enumeration(["draft", "live"]).with_default(json!("archived")),
        );
        let err = registry.register(def).unwrap_err();
        assert!(err.to_string().contains("invalid default"));
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .register(DocumentType::new("Page", "posts/[.md"))
            .unwrap_err();
        assert!(matches!(err, FolioError::InvalidSchema { .. }));
    }

    #[test]
    fn test_bad_type_name_rejected() {
        let mut registry = SchemaRegistry::new();
        assert!(registry.register(DocumentType::new("my post", "*.md")).is_err());
        assert!(registry.register(DocumentType::new("", "*.md")).is_err());
    }

    #[test]
    fn test_types_matching() {
        let mut registry = SchemaRegistry::new();
        registry.register(post()).unwrap();
        registry
            .register(DocumentType::new("Article", "**/articles/*.md"))
            .unwrap();
        let sealed = registry.seal();

        let names = |path: &str| -> Vec<String> {
            sealed
                .types_matching(path)
                .iter()
                .map(|t| t.name.clone())
                .collect()
        };
        assert_eq!(names("posts/a.md"), ["Post"]);
        assert_eq!(names("blog/articles/b.md"), ["Article"]);
        assert!(names("posts/deep/c.md").is_empty());
        assert_eq!(sealed.names(), ["Post", "Article"]);
    }

    #[test]
    fn test_check_type_def_without_functions() {
        let defs = crate::schema::parse_type_defs_str(
            r#"
Post:
  file_path_pattern: "posts/*.md"
  fields:
    title: { type: string, required: true }
  computed_fields:
    reading_time: { type: number, resolve: not_registered_anywhere }
Broken:
  file_path_pattern: "broken/*.md"
  fields:
    status: { type: enum, options: [] }
Escaping:
  file_path_pattern: "../*.md"
"#,
        )
        .unwrap();

        assert!(check_type_def(&defs[0]).is_ok());
        let err = check_type_def(&defs[1]).unwrap_err();
        assert!(matches!(err, FolioError::InvalidSchema { ref type_name, .. } if type_name == "Broken"));
        assert!(check_type_def(&defs[2]).is_err());
    }
}
