// File locator - glob matching of content files below a content root

use crate::error::{FolioError, Result};
use crate::path::to_slash;
use glob::{MatchOptions, Pattern};
use std::path::Path;

/// `*` stays inside one directory, `**` crosses directories, and hidden
/// entries only match when the pattern spells out the leading dot.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Find all files below `content_root` selected by `pattern`.
///
/// Paths are returned relative to the root, with `/` separators, sorted
/// lexicographically so repeated builds see the same order.
pub fn locate(content_root: &Path, pattern: &str) -> Result<Vec<String>> {
    if !content_root.is_dir() {
        return Err(FolioError::ContentRootNotFound(content_root.to_path_buf()));
    }

    let pattern = pattern.trim_start_matches("./");
    compile_pattern(pattern)?;

    // glob normalises `.` and `..` out of the paths it yields, so prefixes
    // are stripped against the canonical root
    let content_root = content_root.canonicalize()?;
    let root = Pattern::escape(&content_root.to_string_lossy());
    let full_pattern = format!("{}/{}", root.trim_end_matches('/'), pattern);
    let entries = glob::glob_with(&full_pattern, MATCH_OPTIONS).map_err(|e| {
        FolioError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        }
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Skipping unreadable path while matching '{pattern}': {e}");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        match path.strip_prefix(&content_root) {
            Ok(relative) => files.push(to_slash(relative)),
            Err(_) => log::warn!(
                "Skipping {} matched outside of {}",
                path.display(),
                content_root.display()
            ),
        }
    }

    files.sort();
    files.dedup();
    log::debug!(
        "Pattern '{pattern}' matched {} file(s) in {}",
        files.len(),
        content_root.display()
    );
    Ok(files)
}

/// Compile a file path pattern, rejecting absolute and parent-relative forms.
pub fn compile_pattern(pattern: &str) -> Result<Pattern> {
    let invalid = |reason: String| FolioError::InvalidPattern {
        pattern: pattern.to_string(),
        reason,
    };

    if pattern.starts_with('/') {
        return Err(invalid("pattern must be relative to the content root".into()));
    }
    if pattern.split('/').any(|segment| segment == "..") {
        return Err(invalid("pattern must not leave the content root".into()));
    }
    Pattern::new(pattern.trim_start_matches("./")).map_err(|e| invalid(e.to_string()))
}

/// Test a relative, `/`-separated path against a compiled pattern.
pub fn matches(pattern: &Pattern, relative_path: &str) -> bool {
    pattern.matches_with(relative_path, MATCH_OPTIONS)
}
