use super::functions::FunctionTable;
use super::registry::SchemaRegistry;
use super::types::{ComputedField, DocumentType, FieldSpec};
use crate::error::{FolioError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// A document type as written in a configuration file, before computed
/// fields are bound to functions.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub file_path_pattern: String,
    pub description: Option<String>,
    pub fields: Vec<(String, FieldSpec)>,
    pub computed_fields: Vec<(String, ComputedFieldDef)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComputedFieldDef {
    #[serde(flatten)]
    pub spec: FieldSpec,
    /// Name of the function in the [`FunctionTable`]
    pub resolve: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTypeDef {
    file_path_pattern: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    fields: serde_yaml::Mapping,
    #[serde(default)]
    computed_fields: serde_yaml::Mapping,
}

impl TypeDef {
    /// Bind computed fields to the table's functions.
    pub fn into_document_type(self, functions: &FunctionTable) -> Result<DocumentType> {
        let mut definition = DocumentType::new(self.name, self.file_path_pattern);
        definition.description = self.description;
        definition.fields = self.fields;

        for (name, def) in self.computed_fields {
            let resolve = functions.get(&def.resolve).ok_or_else(|| FolioError::InvalidSchema {
                type_name: definition.name.clone(),
                reason: format!(
                    "computed field '{name}' refers to unknown function '{}' (known: {})",
                    def.resolve,
                    functions.names().join(", ")
                ),
            })?;
            definition = definition.computed_field(ComputedField::new(name, def.spec, resolve));
        }

        Ok(definition)
    }
}

/// Parse the `document_types` mapping of a configuration file, keeping the
/// order in which types and fields are written.
pub fn parse_type_defs(document_types: &serde_yaml::Mapping) -> Result<Vec<TypeDef>> {
    ordered_entries::<RawTypeDef>(document_types, "document_types")?
        .into_iter()
        .map(|(name, raw)| {
            let fields = ordered_entries(&raw.fields, &format!("{name}.fields"))?;
            let computed_fields =
                ordered_entries(&raw.computed_fields, &format!("{name}.computed_fields"))?;
            Ok(TypeDef {
                name,
                file_path_pattern: raw.file_path_pattern,
                description: raw.description,
                fields,
                computed_fields,
            })
        })
        .collect()
}

/// Parse a `document_types` YAML string into type definitions
pub fn parse_type_defs_str(content: &str) -> Result<Vec<TypeDef>> {
    let mapping: serde_yaml::Mapping = serde_yaml::from_str(content)?;
    parse_type_defs(&mapping)
}

/// Parse document types and register them, binding computed fields through
/// `functions`. The returned registry is still open for further types.
pub fn parse_schema(
    document_types: &serde_yaml::Mapping,
    functions: &FunctionTable,
) -> Result<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    for def in parse_type_defs(document_types)? {
        registry.register(def.into_document_type(functions)?)?;
    }
    Ok(registry)
}

/// Parse a `document_types` YAML string into a registry
pub fn parse_schema_str(content: &str, functions: &FunctionTable) -> Result<SchemaRegistry> {
    let mapping: serde_yaml::Mapping = serde_yaml::from_str(content)?;
    parse_schema(&mapping, functions)
}

fn ordered_entries<T: DeserializeOwned>(
    mapping: &serde_yaml::Mapping,
    context: &str,
) -> Result<Vec<(String, T)>> {
    mapping
        .iter()
        .map(|(key, value)| {
            let name = key
                .as_str()
                .ok_or_else(|| FolioError::Config(format!("{context}: keys must be strings")))?;
            let parsed = serde_yaml::from_value(value.clone())
                .map_err(|e| FolioError::Config(format!("{context}.{name}: {e}")))?;
            Ok((name.to_string(), parsed))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldKind;

    const TYPES: &str = r#"
Post:
  file_path_pattern: "**/posts/*.md"
  description: Blog posts
  fields:
    title: { type: string, required: true, description: The title of the post }
    date: { type: date, required: true }
    tags: { type: list, of: string }
  computed_fields:
    url: { type: string, resolve: url }
    slug: { type: string, resolve: slug }

Article:
  file_path_pattern: "**/articles/*.md"
  fields:
    title: { type: string, required: true }
"#;

    #[test]
    fn test_parse_type_defs_keeps_order() {
        let defs = parse_type_defs_str(TYPES).unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name, "Post");
        assert_eq!(defs[1].name, "Article");

        let fields: Vec<_> = defs[0].fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(fields, ["title", "date", "tags"]);
        assert_eq!(defs[0].fields[2].1.kind, FieldKind::List);
        assert_eq!(defs[0].fields[2].1.of, Some(FieldKind::String));

        let computed: Vec<_> = defs[0].computed_fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(computed, ["url", "slug"]);
        assert_eq!(defs[0].computed_fields[0].1.resolve, "url");
    }

    #[test]
    fn test_parse_schema_registers_types() {
        let registry = parse_schema_str(TYPES, &FunctionTable::default()).unwrap();
        assert_eq!(registry.len(), 2);
        let post = registry.get("Post").unwrap();
        assert_eq!(post.description.as_deref(), Some("Blog posts"));
        assert_eq!(post.computed_fields.len(), 2);
    }

    #[test]
    fn test_unknown_function_rejected() {
        let yaml = r#"
Post:
  file_path_pattern: "posts/*.md"
  computed_fields:
    url: { type: string, resolve: permalink }
"#;
        let err = parse_schema_str(yaml, &FunctionTable::default()).unwrap_err();
        assert!(err.to_string().contains("permalink"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let yaml = r#"
Post:
  file_path_pattern: "posts/*.md"
  feilds:
    title: { type: string }
"#;
        assert!(matches!(
            parse_type_defs_str(yaml),
            Err(FolioError::Config(_))
        ));
    }

    #[test]
    fn test_bad_field_type_rejected() {
        let yaml = r#"
Post:
  file_path_pattern: "posts/*.md"
  fields:
    title: { type: text }
"#;
        let err = parse_type_defs_str(yaml).unwrap_err();
        assert!(err.to_string().contains("Post.fields.title"));
    }
}
