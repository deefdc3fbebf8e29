//! Front matter splitting and decoding.

use super::{Body, RawDocument};
use crate::error::{FolioError, Result};
use crate::markdown::Renderer;
use crate::path::normalize_separators;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

static FRONT_MATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn front_matter_regex() -> &'static Regex {
    FRONT_MATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)??---[ \t]*(?:\r?\n|\z)").unwrap()
    })
}

/// Split content into its `---` fenced header and the body that follows.
///
/// Returns `Ok((None, content))` when the file has no front matter and an
/// error message when a fence is opened but never closed.
///
/// ```
/// use folio::document::split_front_matter;
///
/// let (header, body) = split_front_matter("---\ntitle: A\n---\n# Hi").unwrap();
/// assert_eq!(header, Some("title: A"));
/// assert_eq!(body, "# Hi");
/// ```
pub fn split_front_matter(content: &str) -> std::result::Result<(Option<&str>, &str), String> {
    if let Some(captures) = front_matter_regex().captures(content) {
        let header = captures.get(1).map_or("", |m| m.as_str());
        let end = captures.get(0).map_or(0, |m| m.end());
        return Ok((Some(header), &content[end..]));
    }

    let first_line = content.lines().next().unwrap_or("");
    if first_line.trim_end() == "---" {
        return Err("front matter block is not closed with '---'".into());
    }
    Ok((None, content))
}

/// Read and parse one content file below `content_root`.
pub fn read_document(
    content_root: &Path,
    relative_path: &str,
    renderer: &dyn Renderer,
) -> Result<RawDocument> {
    let relative_path = normalize_separators(relative_path);
    let content = std::fs::read_to_string(content_root.join(&relative_path)).map_err(|source| {
        FolioError::FileRead {
            path: relative_path.clone(),
            source,
        }
    })?;
    parse_document(&relative_path, &content, renderer)
}

/// Parse file content into a raw document record.
pub fn parse_document(
    relative_path: &str,
    content: &str,
    renderer: &dyn Renderer,
) -> Result<RawDocument> {
    let malformed = |reason: String| FolioError::MalformedHeader {
        path: relative_path.to_string(),
        reason,
    };

    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let (header, body) = split_front_matter(content).map_err(&malformed)?;
    let metadata = match header {
        Some(header) => decode_header(header).map_err(&malformed)?,
        None => serde_json::Map::new(),
    };

    Ok(RawDocument {
        path: normalize_separators(relative_path),
        metadata,
        body: Body {
            raw: body.to_string(),
            html: renderer.render(body),
        },
    })
}

fn decode_header(
    header: &str,
) -> std::result::Result<serde_json::Map<String, serde_json::Value>, String> {
    let value: serde_yaml::Value = serde_yaml::from_str(header).map_err(|e| e.to_string())?;
    let mapping = match value {
        serde_yaml::Value::Null => return Ok(serde_json::Map::new()),
        serde_yaml::Value::Mapping(mapping) => mapping,
        _ => return Err("front matter must be a mapping of keys to values".into()),
    };

    let mut metadata = serde_json::Map::new();
    for (key, value) in mapping {
        let key = key
            .as_str()
            .ok_or_else(|| format!("front matter key {key:?} is not a string"))?
            .to_string();
        let value = serde_json::to_value(&value).map_err(|e| format!("field '{key}': {e}"))?;
        metadata.insert(key, value);
    }
    Ok(metadata)
}
