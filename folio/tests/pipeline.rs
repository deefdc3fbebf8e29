use folio::schema::{FunctionTable, SchemaRegistry};
use folio::{BuildOptions, DocumentStore, DocumentType, FieldSpec, FolioConfig, FolioError};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = r#"
content_dir_path: content
output_dir: out
document_types:
  Post:
    file_path_pattern: "**/posts/*.md"
    fields:
      title: { type: string, required: true, description: The title of the post }
      date: { type: date, required: true }
      tags: { type: list, of: string }
    computed_fields:
      url: { type: string, resolve: url }
      reading_time: { type: number, resolve: reading_time }
  Page:
    file_path_pattern: "pages/**/*.md"
    fields:
      title: { type: string, required: true }
    computed_fields:
      slug: { type: string, resolve: slug }
"#;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "folio.yaml", CONFIG);
    write(
        tmp.path(),
        "content/posts/hello-world.md",
        "---\ntitle: Hello World\ndate: 2024-01-15\ntags: [intro, rust]\n---\n# Hello\n\nFirst post.\n",
    );
    write(
        tmp.path(),
        "content/blog/posts/second.md",
        "---\ntitle: Second\ndate: 2024-02-01T09:00:00Z\n---\nOne two three four five.\n",
    );
    write(
        tmp.path(),
        "content/pages/about/team.md",
        "---\ntitle: Team\n---\nWho we are.\n",
    );
    write(tmp.path(), "content/posts/drafts/skip.md", "not selected by **/posts/*.md");
    tmp
}

fn functions() -> FunctionTable {
    let mut functions = FunctionTable::default();
    functions.register("reading_time", |doc| {
        let words = doc.body().raw.split_whitespace().count();
        Ok(json!(words.div_ceil(200)))
    });
    functions
}

#[test]
fn test_config_build_and_lookup() {
    let tmp = setup_site();
    let config = FolioConfig::load(tmp.path().join("folio.yaml")).unwrap();
    let store = config
        .build_store_with(&functions(), BuildOptions::default())
        .unwrap();

    let paths: Vec<_> = store
        .all("Post")
        .unwrap()
        .iter()
        .map(|d| d.flattened_path())
        .collect();
    assert_eq!(paths, ["blog/posts/second", "posts/hello-world"]);

    let post = store
        .find_by_path("Post", "posts/hello-world")
        .unwrap()
        .unwrap();
    assert_eq!(post.get_str("title"), Some("Hello World"));
    assert_eq!(post.url(), Some("/posts/hello-world"));
    assert_eq!(post.get("tags"), Some(&json!(["intro", "rust"])));
    assert_eq!(post.get_f64("reading_time"), Some(1.0));
    assert!(post.body().html.contains("<h1>Hello</h1>"));

    let page = &store.all("Page").unwrap()[0];
    assert_eq!(page.get_str("slug"), Some("team"));
    assert_eq!(page.raw().source_file_dir, "pages/about");

    assert!(store.find_by_path("Post", "posts/nope").unwrap().is_none());
}

#[test]
fn test_unknown_function_is_a_schema_error() {
    let tmp = setup_site();
    let config = FolioConfig::load(tmp.path().join("folio.yaml")).unwrap();
    let err = config.build_store().unwrap_err();
    assert!(matches!(err, FolioError::InvalidSchema { .. }));
    assert!(err.to_string().contains("reading_time"));
}

#[test]
fn test_export_generated_surface() {
    let tmp = setup_site();
    let config = FolioConfig::load(tmp.path().join("folio.yaml")).unwrap();
    let store = config
        .build_store_with(&functions(), BuildOptions::default())
        .unwrap();

    folio::export::export(&store, &config.output_root()).unwrap();
    let index: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(tmp.path().join("out/index.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(index["collections"]["allPosts"]["count"], 2);
    assert_eq!(index["collections"]["allPages"]["count"], 1);
    assert_eq!(
        store.to_json()["allPosts"][1]["_raw"]["flattenedPath"],
        "posts/hello-world"
    );
}

#[test]
fn test_rust_api_matches_config() {
    let tmp = setup_site();
    let url = FunctionTable::default().get("url").unwrap();

    let mut registry = SchemaRegistry::new();
    registry
        .register(
            DocumentType::new("Post", "**/posts/*.md")
                .field("title", FieldSpec::string().required())
                .field("date", FieldSpec::date().required())
                .computed_field(folio::schema::ComputedField::new(
                    "url",
                    FieldSpec::string(),
                    url,
                )),
        )
        .unwrap();
    let store = DocumentStore::build(
        &registry.seal(),
        tmp.path().join("content"),
        BuildOptions {
            concurrency: 2,
            lenient: false,
        },
    )
    .unwrap();

    let urls: Vec<_> = store
        .all("Post")
        .unwrap()
        .iter()
        .filter_map(|d| d.url())
        .collect();
    assert_eq!(urls, ["/blog/posts/second", "/posts/hello-world"]);
}
