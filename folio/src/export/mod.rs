// Export - writes the generated data surface to disk

use crate::error::Result;
use crate::store::DocumentStore;
use serde_json::json;
use std::path::{Path, PathBuf};

pub const INDEX_FILE: &str = "index.json";
pub const COLLECTION_FILE: &str = "_index.json";

/// Write every collection as `<out>/<Type>/_index.json` and a top-level
/// `index.json` listing the published collection names.
///
/// Returns the written file paths, summary last.
pub fn export(store: &DocumentStore, out_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();
    let mut collections = serde_json::Map::new();

    for collection in store.collections() {
        let dir = out_dir.join(collection.type_name());
        std::fs::create_dir_all(&dir)?;

        let docs: Vec<_> = collection.iter().map(|d| d.to_json()).collect();
        let path = dir.join(COLLECTION_FILE);
        write_json(&path, &serde_json::Value::Array(docs))?;
        written.push(path);

        collections.insert(
            collection.name(),
            json!({
                "type": collection.type_name(),
                "count": collection.len(),
                "file": format!("{}/{COLLECTION_FILE}", collection.type_name()),
            }),
        );
    }

    let index = out_dir.join(INDEX_FILE);
    write_json(&index, &json!({ "collections": collections }))?;
    written.push(index);

    log::info!(
        "Exported {} document(s) to {}",
        store.document_count(),
        out_dir.display()
    );
    Ok(written)
}

/// Summary of a store: per-collection document and warning counts.
pub fn status(store: &DocumentStore) -> serde_json::Value {
    let mut collections = serde_json::Map::new();
    for collection in store.collections() {
        collections.insert(
            collection.name(),
            json!({
                "type": collection.type_name(),
                "count": collection.len(),
                "warnings": collection.failures().len(),
            }),
        );
    }
    json!({
        "content_root": store.content_root().display().to_string(),
        "documents": store.document_count(),
        "collections": collections,
    })
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    std::fs::write(path, text)?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}
