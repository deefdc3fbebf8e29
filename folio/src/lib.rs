pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod locator;
pub mod markdown;
pub mod path;
pub mod resolver;
pub mod schema;
pub mod store;
pub mod watcher;

pub use config::FolioConfig;
pub use document::{Body, Document, RawDocument, RawInfo};
pub use error::{BoxError, BuildFailures, FileFailure, FolioError, Result};
pub use markdown::{MarkdownRenderer, Renderer};
pub use schema::{
    DocumentType, FieldKind, FieldSpec, FunctionTable, SchemaRegistry, SealedRegistry,
};
pub use store::{BuildOptions, Collection, DocumentStore};
