use crate::document::{self, Document};
use crate::error::{BuildFailures, FileFailure, FolioError, Result};
use crate::locator;
use crate::markdown::{MarkdownRenderer, Renderer};
use crate::resolver;
use crate::schema::{DocumentType, SealedRegistry};
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options of a build pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Worker threads for parsing and resolving files. 0 uses one per CPU.
    #[serde(default)]
    pub concurrency: usize,
    /// Keep the successfully resolved documents when some files fail,
    /// reporting the failures as warnings instead of failing the build.
    #[serde(default)]
    pub lenient: bool,
}

/// All resolved documents of one document type, in file locator order.
#[derive(Debug)]
pub struct Collection {
    definition: Arc<DocumentType>,
    documents: Vec<Document>,
    failures: Vec<FileFailure>,
}

impl Collection {
    pub fn type_name(&self) -> &str {
        &self.definition.name
    }

    /// Published name, e.g. `allPosts`
    pub fn name(&self) -> String {
        self.definition.collection_name()
    }

    pub fn definition(&self) -> &DocumentType {
        &self.definition
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Files skipped in a lenient build
    pub fn failures(&self) -> &[FileFailure] {
        &self.failures
    }

    /// Every flattened path in the collection, for enumerating pages.
    pub fn flattened_paths(&self) -> Vec<&str> {
        self.documents.iter().map(Document::flattened_path).collect()
    }

    pub fn find<P>(&self, mut predicate: P) -> Option<&Document>
    where
        P: FnMut(&Document) -> bool,
    {
        self.documents.iter().find(|doc| predicate(doc))
    }

    /// True when a document or a failed file of this collection lives
    /// beneath the directory `dir`.
    fn has_files_under(&self, dir: &str) -> bool {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        self.documents
            .iter()
            .any(|doc| doc.raw().source_file_path.starts_with(&prefix))
            || self.failures.iter().any(|f| f.path.starts_with(&prefix))
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

/// The result of a build: one immutable collection per document type.
///
/// A store is never patched. Content changes produce a new store through
/// [`DocumentStore::rebuild`], which shares the untouched collections.
#[derive(Clone)]
pub struct DocumentStore {
    registry: SealedRegistry,
    content_root: PathBuf,
    options: BuildOptions,
    renderer: Arc<dyn Renderer>,
    collections: Vec<Arc<Collection>>,
}

impl DocumentStore {
    /// Build every registered document type below `content_root`, rendering
    /// bodies as Markdown.
    pub fn build(
        registry: &SealedRegistry,
        content_root: impl AsRef<Path>,
        options: BuildOptions,
    ) -> Result<Self> {
        Self::build_with_renderer(
            registry,
            content_root,
            options,
            Arc::new(MarkdownRenderer::new()),
        )
    }

    /// Build with a custom body renderer.
    pub fn build_with_renderer(
        registry: &SealedRegistry,
        content_root: impl AsRef<Path>,
        options: BuildOptions,
        renderer: Arc<dyn Renderer>,
    ) -> Result<Self> {
        let content_root = content_root.as_ref().to_path_buf();
        if !content_root.is_dir() {
            return Err(FolioError::ContentRootNotFound(content_root));
        }

        let pass = BuildPass::new(&content_root, &options, renderer.as_ref())?;
        let built = registry
            .types()
            .map(|definition| pass.collection(definition))
            .collect::<Result<Vec<_>>>()?;
        let collections = check_failures(&options, built)?;

        log::info!(
            "Built {} document type(s) from {}",
            collections.len(),
            content_root.display()
        );

        Ok(DocumentStore {
            registry: registry.clone(),
            content_root,
            options,
            renderer,
            collections: collections.into_iter().map(Arc::new).collect(),
        })
    }

    /// Rebuild the named document types wholesale. Other collections are
    /// shared with `self`.
    pub fn rebuild(&self, type_names: &[&str]) -> Result<Self> {
        for name in type_names {
            if self.registry.get(name).is_none() {
                return Err(FolioError::UnknownType(name.to_string()));
            }
        }
        if !self.content_root.is_dir() {
            return Err(FolioError::ContentRootNotFound(self.content_root.clone()));
        }

        let wanted: HashSet<&str> = type_names.iter().copied().collect();
        let pass = BuildPass::new(&self.content_root, &self.options, self.renderer.as_ref())?;
        let rebuilt = self
            .registry
            .types()
            .filter(|definition| wanted.contains(definition.name.as_str()))
            .map(|definition| pass.collection(definition))
            .collect::<Result<Vec<_>>>()?;
        let mut rebuilt = check_failures(&self.options, rebuilt)?.into_iter();

        let collections = self
            .collections
            .iter()
            .map(|existing| {
                if wanted.contains(existing.type_name()) {
                    rebuilt.next().map(Arc::new).unwrap_or_else(|| Arc::clone(existing))
                } else {
                    Arc::clone(existing)
                }
            })
            .collect();

        log::info!("Rebuilt document type(s): {}", type_names.join(", "));
        Ok(DocumentStore {
            collections,
            ..self.clone()
        })
    }

    /// Rebuild the document types affected by changes to the given relative
    /// paths. Returns `None` when no type is affected.
    ///
    /// A path may name a directory. A directory that was removed or renamed
    /// affects every type with files beneath it in this store; a directory
    /// that now exists affects every type selecting a file beneath it.
    pub fn rebuild_for_paths<S: AsRef<str>>(&self, relative_paths: &[S]) -> Result<Option<Self>> {
        let mut affected: Vec<&str> = Vec::new();
        for path in relative_paths {
            let path = path.as_ref().trim_end_matches('/');
            for definition in self.registry.types_matching(path) {
                push_unique(&mut affected, &definition.name);
            }
            for collection in self.collections() {
                if collection.has_files_under(path) {
                    push_unique(&mut affected, collection.type_name());
                }
            }

            let dir = self.content_root.join(path);
            if !path.is_empty() && dir.is_dir() {
                for file in locator::locate(&dir, "**/*")? {
                    for definition in self.registry.types_matching(&format!("{path}/{file}")) {
                        push_unique(&mut affected, &definition.name);
                    }
                }
            }
        }

        if affected.is_empty() {
            return Ok(None);
        }
        self.rebuild(&affected).map(Some)
    }

    pub fn registry(&self) -> &SealedRegistry {
        &self.registry
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Collections in registration order
    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.iter().map(Arc::as_ref)
    }

    pub fn collection(&self, type_name: &str) -> Result<&Collection> {
        self.collections()
            .find(|c| c.type_name() == type_name)
            .ok_or_else(|| FolioError::UnknownType(type_name.to_string()))
    }

    /// Published collection names, e.g. `["allPosts", "allArticles"]`
    pub fn collection_names(&self) -> Vec<String> {
        self.collections().map(Collection::name).collect()
    }

    /// All documents of a type, in file locator order.
    pub fn all(&self, type_name: &str) -> Result<&[Document]> {
        self.collection(type_name).map(Collection::documents)
    }

    /// First document of a type matching `predicate`. `Ok(None)` is a
    /// regular "not found", not a pipeline error.
    pub fn find<P>(&self, type_name: &str, predicate: P) -> Result<Option<&Document>>
    where
        P: FnMut(&Document) -> bool,
    {
        Ok(self.collection(type_name)?.find(predicate))
    }

    /// Look a document up by its `_raw.flattenedPath`.
    pub fn find_by_path(&self, type_name: &str, flattened_path: &str) -> Result<Option<&Document>> {
        self.find(type_name, |doc| doc.flattened_path() == flattened_path)
    }

    /// All documents of a type deserialized into a typed struct.
    pub fn typed<T: DeserializeOwned>(&self, type_name: &str) -> Result<Vec<T>> {
        self.all(type_name)?
            .iter()
            .map(|doc| serde_json::from_value(doc.to_json()).map_err(FolioError::from))
            .collect()
    }

    /// Failures kept from lenient builds, across all collections.
    pub fn warnings(&self) -> Vec<&FileFailure> {
        self.collections()
            .flat_map(|c| c.failures.iter())
            .collect()
    }

    pub fn document_count(&self) -> usize {
        self.collections().map(Collection::len).sum()
    }

    /// The generated data surface: `{ "allPosts": [...], ... }`
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for collection in self.collections() {
            let docs = collection.iter().map(Document::to_json).collect();
            map.insert(collection.name(), serde_json::Value::Array(docs));
        }
        serde_json::Value::Object(map)
    }
}

impl fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStore")
            .field("content_root", &self.content_root)
            .field("options", &self.options)
            .field("collections", &self.collections)
            .finish_non_exhaustive()
    }
}

/// Shared state of one build pass
struct BuildPass<'a> {
    content_root: &'a Path,
    renderer: &'a dyn Renderer,
    pool: rayon::ThreadPool,
}

impl<'a> BuildPass<'a> {
    fn new(content_root: &'a Path, options: &BuildOptions, renderer: &'a dyn Renderer) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.concurrency)
            .thread_name(|idx| format!("folio-build-{idx}"))
            .build()?;
        Ok(BuildPass {
            content_root,
            renderer,
            pool,
        })
    }

    /// Locate, parse and resolve every file of one document type. Per-file
    /// results are collected in locator order regardless of which worker
    /// finishes first.
    fn collection(&self, definition: &Arc<DocumentType>) -> Result<Collection> {
        let paths = locator::locate(self.content_root, &definition.file_path_pattern)?;

        let results: Vec<Result<Document>> = self.pool.install(|| {
            paths
                .par_iter()
                .map(|path| self.process_file(definition, path))
                .collect()
        });

        let mut documents = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (path, result) in paths.into_iter().zip(results) {
            match result {
                Ok(doc) => documents.push(doc),
                Err(error) => failures.push(FileFailure {
                    type_name: definition.name.clone(),
                    path,
                    error,
                }),
            }
        }

        log::debug!(
            "Collection {}: {} document(s), {} failure(s)",
            definition.name,
            documents.len(),
            failures.len()
        );
        Ok(Collection {
            definition: Arc::clone(definition),
            documents,
            failures,
        })
    }

    fn process_file(&self, definition: &DocumentType, path: &str) -> Result<Document> {
        let raw = document::read_document(self.content_root, path, self.renderer)?;
        resolver::resolve(&raw, definition)
    }
}

fn push_unique<'a>(names: &mut Vec<&'a str>, name: &'a str) {
    if !names.contains(&name) {
        names.push(name);
    }
}

/// Fail on any per-file error unless the build is lenient, in which case
/// the failures are logged and kept on their collections.
fn check_failures(options: &BuildOptions, collections: Vec<Collection>) -> Result<Vec<Collection>> {
    let failed = collections.iter().any(|c| !c.failures.is_empty());
    if !failed {
        return Ok(collections);
    }

    if options.lenient {
        for failure in collections.iter().flat_map(|c| c.failures.iter()) {
            log::warn!("Skipping {failure}");
        }
        return Ok(collections);
    }

    let failures = collections
        .into_iter()
        .flat_map(|c| c.failures)
        .collect();
    Err(FolioError::Build(BuildFailures(failures)))
}
