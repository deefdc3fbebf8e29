use super::types::ResolveFn;
use crate::document::Document;
use crate::error::BoxError;
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Named computed-field functions that configuration files can refer to
/// through `resolve: <name>`.
#[derive(Clone)]
pub struct FunctionTable {
    functions: HashMap<String, ResolveFn>,
}

impl FunctionTable {
    /// An empty table with no built-in functions.
    pub fn empty() -> Self {
        FunctionTable {
            functions: HashMap::new(),
        }
    }

    /// A table holding the built-ins: `url`, `flattened_path` and `slug`.
    pub fn with_builtins() -> Self {
        let mut table = Self::empty();
        table
            .register("url", |doc| Ok(json!(format!("/{}", doc.flattened_path()))))
            .register("flattened_path", |doc| Ok(json!(doc.flattened_path())))
            .register("slug", |doc| {
                let path = doc.flattened_path();
                let slug = path.rsplit('/').next().unwrap_or(path);
                Ok(json!(slug))
            });
        table
    }

    pub fn register<F>(&mut self, name: impl Into<String>, resolve: F) -> &mut Self
    where
        F: Fn(&Document) -> Result<serde_json::Value, BoxError> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(resolve));
        self
    }

    pub fn get(&self, name: &str) -> Option<ResolveFn> {
        self.functions.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for FunctionTable {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTable")
            .field("functions", &self.names())
            .finish()
    }
}
