//! Template compilation seam.
//!
//! The cache never parses or executes templates itself. It hands an ordered
//! file set and a [`FunctionTable`] to a [`Compiler`] and gets back an opaque
//! artifact that can later be rendered by entry name.

mod tera;

pub use self::tera::TeraCompiler;

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::Result;
use crate::scan::SourceFile;

/// A helper callable from templates: named arguments in, value out.
pub type TemplateFn = Arc<dyn Fn(&HashMap<String, Value>) -> Result<Value, String> + Send + Sync>;

/// Turns template sources into an executable artifact.
///
/// Implementations keep no state between calls; every compile starts from
/// scratch. `render` may be called concurrently on the same artifact.
pub trait Compiler: Send + Sync + 'static {
    type Artifact: Send + Sync + 'static;

    /// Compile all `sources` with `functions` registered.
    fn compile(&self, sources: &[SourceFile], functions: &FunctionTable)
    -> Result<Self::Artifact>;

    /// Render entry `name` of `artifact` into `out`.
    ///
    /// `overrides` apply to this call only and must not leak into the shared
    /// artifact.
    fn render(
        &self,
        artifact: &Self::Artifact,
        out: &mut dyn Write,
        name: &str,
        data: &Value,
        overrides: &FunctionTable,
    ) -> Result<()>;
}

/// Named helpers available to templates.
///
/// Cloning is cheap: entries are reference counted.
#[derive(Clone, Default)]
pub struct FunctionTable {
    entries: FxHashMap<String, TemplateFn>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` under `name`, replacing any previous entry.
    pub fn insert<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&HashMap<String, Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Arc::new(function));
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&HashMap<String, Value>) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.insert(name, function);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TemplateFn> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TemplateFn)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A new table with `overrides` layered on top of `self`.
    pub fn merged_with(&self, overrides: &FunctionTable) -> FunctionTable {
        let mut merged = self.clone();
        for (name, function) in overrides.iter() {
            merged.entries.insert(name.to_owned(), Arc::clone(function));
        }
        merged
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constant(value: &'static str) -> impl Fn(&HashMap<String, Value>) -> Result<Value, String> {
        move |_| Ok(json!(value))
    }

    #[test]
    fn test_function_table_insert_and_names() {
        let table = FunctionTable::new()
            .with("upper", constant("U"))
            .with("lower", constant("l"));

        assert_eq!(table.len(), 2);
        assert_eq!(table.names(), ["lower", "upper"]);
        assert!(table.get("missing").is_none());
    }

    #[test]
    fn test_merged_with_override_wins() {
        let base = FunctionTable::new()
            .with("site", constant("base"))
            .with("keep", constant("kept"));
        let overrides = FunctionTable::new().with("site", constant("override"));

        let merged = base.merged_with(&overrides);
        let args = HashMap::new();

        assert_eq!(merged.get("site").unwrap()(&args).unwrap(), json!("override"));
        assert_eq!(merged.get("keep").unwrap()(&args).unwrap(), json!("kept"));
        // The base table is untouched.
        assert_eq!(base.get("site").unwrap()(&args).unwrap(), json!("base"));
    }
}
