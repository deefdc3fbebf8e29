use crate::document::{Document, RawDocument};
use crate::error::{FolioError, Result};
use crate::schema::{DocumentType, FieldKind, FieldSpec};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Validate a raw document against its type and evaluate computed fields.
///
/// Declared fields are checked first, in definition order. Computed fields
/// run afterwards, also in definition order, and each one sees the declared
/// fields, `_raw`, the body and every computed field before it.
pub fn resolve(raw: &RawDocument, definition: &DocumentType) -> Result<Document> {
    let mut document = Document::new(definition.name.clone(), &raw.path, raw.body.clone());

    for (name, spec) in &definition.fields {
        let value = match raw.metadata.get(name) {
            Some(Value::Null) | None => match &spec.default {
                Some(default) => default.clone(),
                None if spec.required => return Err(FolioError::MissingField(name.clone())),
                None => continue,
            },
            Some(value) => value.clone(),
        };
        check_value(name, spec, &value)?;
        document.insert(name.clone(), value);
    }

    if log::log_enabled!(log::Level::Debug) {
        for key in raw.metadata.keys() {
            if definition.field_spec(key).is_none() {
                log::debug!(
                    "{}: ignoring undeclared field '{key}' for type {}",
                    raw.path,
                    definition.name
                );
            }
        }
    }

    for field in &definition.computed_fields {
        let value = field
            .resolve(&document)
            .map_err(|source| FolioError::ComputedField {
                field: field.name.clone(),
                source,
            })?;
        check_value(&field.name, &field.spec, &value)?;
        document.insert(field.name.clone(), value);
    }

    Ok(document)
}

/// Check a value against a field spec.
pub fn check_value(name: &str, spec: &FieldSpec, value: &Value) -> Result<()> {
    let mismatch = || FolioError::FieldType {
        field: name.to_string(),
        expected: spec.expected(),
        actual: describe(value),
    };

    match spec.kind {
        FieldKind::Enum => {
            let allowed = spec.options.as_deref().unwrap_or_default();
            match value.as_str() {
                Some(s) if allowed.iter().any(|o| o == s) => Ok(()),
                _ => Err(mismatch()),
            }
        }
        FieldKind::List => {
            let items = value.as_array().ok_or_else(mismatch)?;
            if let Some(item_kind) = spec.of {
                let item_spec = FieldSpec::new(item_kind);
                for (idx, item) in items.iter().enumerate() {
                    check_value(&format!("{name}[{idx}]"), &item_spec, item)?;
                }
            }
            Ok(())
        }
        kind if kind_matches(kind, value) => Ok(()),
        _ => Err(mismatch()),
    }
}

fn kind_matches(kind: FieldKind, value: &Value) -> bool {
    match kind {
        FieldKind::String => value.is_string(),
        FieldKind::Number => value.is_number(),
        FieldKind::Boolean => value.is_boolean(),
        FieldKind::Date => value.as_str().is_some_and(is_date),
        FieldKind::List => value.is_array(),
        FieldKind::Enum => value.is_string(),
        FieldKind::Json => true,
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]` and RFC 3339.
pub fn is_date(s: &str) -> bool {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || DateTime::parse_from_rfc3339(s).is_ok()
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("string \"{s}\""),
        other => type_name(other).to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Body;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn raw(path: &str, metadata: Value) -> RawDocument {
        RawDocument {
            path: path.into(),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
            body: Body {
                raw: "# Hi".into(),
                html: "<h1>Hi</h1>\n".into(),
            },
        }
    }

    fn post() -> DocumentType {
        DocumentType::new("Post", "**/posts/*.md")
            .field("title", FieldSpec::string().required())
            .field("date", FieldSpec::date().required())
            .field("draft", FieldSpec::boolean().with_default(json!(false)))
            .field("subtitle", FieldSpec::string())
            .computed("url", FieldSpec::string(), |doc| {
                Ok(json!(format!("/{}", doc.flattened_path())))
            })
    }

    #[test]
    fn test_resolve_valid_post() {
        let doc = resolve(
            &raw("posts/a.md", json!({ "title": "A", "date": "2024-01-01" })),
            &post(),
        )
        .unwrap();

        assert_eq!(doc.get_str("title"), Some("A"));
        assert_eq!(doc.get_str("date"), Some("2024-01-01"));
        assert_eq!(doc.url(), Some("/posts/a"));
        assert_eq!(doc.flattened_path(), "posts/a");
        assert_eq!(doc.body().raw, "# Hi");
        assert_eq!(doc.type_name(), "Post");
    }

    #[test]
    fn test_missing_required_field() {
        let err = resolve(&raw("posts/a.md", json!({ "date": "2024-01-01" })), &post())
            .unwrap_err();
        assert!(matches!(err, FolioError::MissingField(ref f) if f == "title"));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let err = resolve(
            &raw("posts/a.md", json!({ "title": null, "date": "2024-01-01" })),
            &post(),
        )
        .unwrap_err();
        assert!(matches!(err, FolioError::MissingField(_)));
    }

    #[test]
    fn test_type_mismatch() {
        let err = resolve(
            &raw("posts/a.md", json!({ "title": 42, "date": "2024-01-01" })),
            &post(),
        )
        .unwrap_err();
        match err {
            FolioError::FieldType {
                field,
                expected,
                actual,
            } => {
                assert_eq!(field, "title");
                assert_eq!(expected, "string");
                assert_eq!(actual, "number");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_date() {
        let err = resolve(
            &raw("posts/a.md", json!({ "title": "A", "date": "yesterday" })),
            &post(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("date"));
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn test_default_applied_and_optional_omitted() {
        let doc = resolve(
            &raw("posts/a.md", json!({ "title": "A", "date": "2024-01-01" })),
            &post(),
        )
        .unwrap();
        assert_eq!(doc.get_bool("draft"), Some(false));
        assert!(doc.get("subtitle").is_none());
    }

    #[test]
    fn test_default_does_not_overwrite() {
        let doc = resolve(
            &raw(
                "posts/a.md",
                json!({ "title": "A", "date": "2024-01-01", "draft": true }),
            ),
            &post(),
        )
        .unwrap();
        assert_eq!(doc.get_bool("draft"), Some(true));
    }

    #[test]
    fn test_undeclared_fields_ignored() {
        let doc = resolve(
            &raw(
                "posts/a.md",
                json!({ "title": "A", "date": "2024-01-01", "layout": "wide" }),
            ),
            &post(),
        )
        .unwrap();
        assert!(doc.get("layout").is_none());
    }

    #[test]
    fn test_computed_sees_declared_and_earlier_computed() {
        let def = post()
            .computed("slug", FieldSpec::string(), |doc| {
                let url = doc.url().ok_or("url not computed yet")?;
                Ok(json!(url.rsplit('/').next().unwrap_or_default()))
            })
            .computed("heading", FieldSpec::string(), |doc| {
                let title = doc.get_str("title").ok_or("title missing")?;
                let slug = doc.get_str("slug").ok_or("slug missing")?;
                Ok(json!(format!("{title} ({slug})")))
            });

        let doc = resolve(
            &raw("posts/hello.md", json!({ "title": "Hello", "date": "2024-01-01" })),
            &def,
        )
        .unwrap();
        assert_eq!(doc.get_str("slug"), Some("hello"));
        assert_eq!(doc.get_str("heading"), Some("Hello (hello)"));
    }

    #[test]
    fn test_computed_cannot_see_later_computed() {
        let def = DocumentType::new("Page", "*.md")
            .computed("first", FieldSpec::boolean(), |doc| {
                Ok(json!(doc.get("second").is_some()))
            })
            .computed("second", FieldSpec::string(), |_| Ok(json!("x")));
        let doc = resolve(&raw("a.md", json!({})), &def).unwrap();
        assert_eq!(doc.get_bool("first"), Some(false));
    }

    #[test]
    fn test_computed_evaluated_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let def = DocumentType::new("Page", "*.md").computed(
            "n",
            FieldSpec::number(),
            move |_| Ok(json!(counter.fetch_add(1, Ordering::SeqCst))),
        );
        resolve(&raw("a.md", json!({})), &def).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_computed_error_propagates() {
        let def = post().computed("broken", FieldSpec::string(), |_| Err("boom".into()));
        let err = resolve(
            &raw("posts/a.md", json!({ "title": "A", "date": "2024-01-01" })),
            &def,
        )
        .unwrap_err();
        match err {
            FolioError::ComputedField { field, source } => {
                assert_eq!(field, "broken");
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_computed_result_is_type_checked() {
        let def = DocumentType::new("Page", "*.md")
            .computed("count", FieldSpec::number(), |_| Ok(json!("three")));
        let err = resolve(&raw("a.md", json!({})), &def).unwrap_err();
        assert!(matches!(err, FolioError::FieldType { .. }));
    }

    #[test]
    fn test_enum_field() {
        let spec = FieldSpec::enumeration(["draft", "published"]);
        assert!(check_value("status", &spec, &json!("draft")).is_ok());
        let err = check_value("status", &spec, &json!("archived")).unwrap_err();
        assert!(err.to_string().contains("one of [draft, published]"));
    }

    #[test]
    fn test_list_items_checked() {
        let spec = FieldSpec::list_of(FieldKind::String);
        assert!(check_value("tags", &spec, &json!(["a", "b"])).is_ok());
        let err = check_value("tags", &spec, &json!(["a", 2])).unwrap_err();
        assert!(matches!(err, FolioError::FieldType { ref field, .. } if field == "tags[1]"));
        assert!(check_value("tags", &spec, &json!("a")).is_err());
    }

    #[test]
    fn test_json_accepts_anything() {
        let spec = FieldSpec::json();
        assert!(check_value("extra", &spec, &json!({ "a": [1, 2] })).is_ok());
        assert!(check_value("extra", &spec, &json!(null)).is_ok());
    }

    #[test]
    fn test_date_formats() {
        assert!(is_date("2024-01-01"));
        assert!(is_date("2024-01-01T10:30:00"));
        assert!(is_date("2024-01-01T10:30:00.250"));
        assert!(is_date("2024-01-01T10:30:00Z"));
        assert!(is_date("2024-01-01T10:30:00+02:00"));
        assert!(!is_date("2024-13-01"));
        assert!(!is_date("01/02/2024"));
    }
}
