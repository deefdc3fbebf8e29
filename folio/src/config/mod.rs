// Site configuration - folio.yaml

use crate::error::{FolioError, Result};
use crate::schema::{parse_schema, parse_type_defs, FunctionTable, SealedRegistry, TypeDef};
use crate::store::{BuildOptions, DocumentStore};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "folio.yaml";
pub const DEFAULT_OUTPUT_DIR: &str = ".folio/generated";

/// Contents of a `folio.yaml` file.
///
/// ```yaml
/// content_dir_path: content
/// document_types:
///   Post:
///     file_path_pattern: "**/posts/*.md"
///     fields:
///       title: { type: string, required: true }
///     computed_fields:
///       url: { type: string, resolve: url }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FolioConfig {
    pub content_dir_path: PathBuf,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub build: BuildOptions,
    /// Kept as a mapping so declaration order survives.
    #[serde(default)]
    pub document_types: serde_yaml::Mapping,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    base_dir: PathBuf,
}

impl FolioConfig {
    /// Load a config file. Relative paths inside it resolve against the
    /// directory containing the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FolioError::Config(format!("Cannot read {}: {e}", path.display()))
        })?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::from_str_in(&content, base_dir)
    }

    /// Parse config text with relative paths resolved against `base_dir`.
    pub fn from_str_in(content: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut config: FolioConfig = serde_yaml::from_str(content)?;
        config.base_dir = base_dir.into();
        log::debug!(
            "Loaded config with {} document type(s)",
            config.document_types.len()
        );
        Ok(config)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn content_root(&self) -> PathBuf {
        self.base_dir.join(&self.content_dir_path)
    }

    pub fn output_root(&self) -> PathBuf {
        let dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        self.base_dir.join(dir)
    }

    /// Document type declarations, unbound.
    pub fn type_defs(&self) -> Result<Vec<TypeDef>> {
        parse_type_defs(&self.document_types)
    }

    /// Register every declared type, binding computed fields through
    /// `functions`, and seal the result.
    pub fn registry(&self, functions: &FunctionTable) -> Result<SealedRegistry> {
        Ok(parse_schema(&self.document_types, functions)?.seal())
    }

    /// Build a store with the configured options and the built-in functions.
    pub fn build_store(&self) -> Result<DocumentStore> {
        self.build_store_with(&FunctionTable::default(), self.build.clone())
    }

    pub fn build_store_with(
        &self,
        functions: &FunctionTable,
        options: BuildOptions,
    ) -> Result<DocumentStore> {
        let registry = self.registry(functions)?;
        DocumentStore::build(&registry, self.content_root(), options)
    }
}
