// Path helpers - separator normalization and flattened-path derivation

use std::path::{Component, Path};

/// Normalize a relative content path to forward slashes, dropping `./`
/// prefixes and empty segments.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Render a relative filesystem path with forward slashes.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// The flattened path of a content file: its relative path with the
/// extension of the final segment removed.
///
/// `posts/hello-world.md` becomes `posts/hello-world`.
pub fn flatten(relative_path: &str) -> String {
    let normalized = normalize_separators(relative_path);
    let (dir, name) = split_dir(&normalized);
    let stem = file_stem(name);
    if dir.is_empty() {
        stem.to_string()
    } else {
        format!("{dir}/{stem}")
    }
}

/// Split a normalized path into its directory part and file name.
pub fn split_dir(normalized: &str) -> (&str, &str) {
    match normalized.rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => ("", normalized),
    }
}

/// A file name without its last extension. Dotfiles keep their name.
fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}
