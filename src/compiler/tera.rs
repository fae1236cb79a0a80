//! Default compiler backed by `tera`.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use ::tera::{Context, Tera};
use serde_json::Value;

use super::{Compiler, FunctionTable, TemplateFn};
use crate::error::{Error, Result};
use crate::scan::SourceFile;

/// Compiles every source into one `Tera` instance, each file registered under
/// its entry name so templates can `include`/`extends` each other by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeraCompiler;

impl TeraCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl Compiler for TeraCompiler {
    type Artifact = Tera;

    fn compile(&self, sources: &[SourceFile], functions: &FunctionTable) -> Result<Tera> {
        let mut tera = Tera::default();
        register_functions(&mut tera, functions);

        let files: Vec<_> = sources
            .iter()
            .map(|s| (s.path.as_path(), Some(s.name.as_str())))
            .collect();
        tera.add_template_files(files).map_err(Error::compile)?;

        crate::debug!("compile"; "compiled {} templates", sources.len());
        Ok(tera)
    }

    fn render(
        &self,
        artifact: &Tera,
        out: &mut dyn Write,
        name: &str,
        data: &Value,
        overrides: &FunctionTable,
    ) -> Result<()> {
        let context = match data {
            Value::Null => Context::new(),
            other => Context::from_value(other.clone()).map_err(|e| Error::render(name, e))?,
        };

        if overrides.is_empty() {
            return artifact
                .render_to(name, &context, out)
                .map_err(|e| Error::render(name, e));
        }

        // Overrides get a private copy; the shared artifact keeps its table.
        let mut scoped = artifact.clone();
        register_functions(&mut scoped, overrides);
        scoped
            .render_to(name, &context, out)
            .map_err(|e| Error::render(name, e))
    }
}

fn register_functions(tera: &mut Tera, functions: &FunctionTable) {
    for (name, function) in functions.iter() {
        let function: TemplateFn = Arc::clone(function);
        tera.register_function(name, move |args: &HashMap<String, Value>| {
            function(args).map_err(::tera::Error::msg)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn source(root: &Path, name: &str, body: &str) -> SourceFile {
        let path = root.join(name);
        fs::write(&path, body).unwrap();
        SourceFile {
            path,
            name: name.to_owned(),
        }
    }

    fn render(compiler: &TeraCompiler, tera: &Tera, name: &str, data: Value) -> Result<String> {
        render_with(compiler, tera, name, data, &FunctionTable::new())
    }

    fn render_with(
        compiler: &TeraCompiler,
        tera: &Tera,
        name: &str,
        data: Value,
        overrides: &FunctionTable,
    ) -> Result<String> {
        let mut out = Vec::new();
        compiler.render(tera, &mut out, name, &data, overrides)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_compile_and_render_by_entry_name() {
        let temp = TempDir::new().unwrap();
        let sources = vec![
            source(temp.path(), "base.tmpl", "<{% block body %}{% endblock %}>"),
            source(
                temp.path(),
                "page.tmpl",
                r#"{% extends "base.tmpl" %}{% block body %}hi {{ name }}{% endblock %}"#,
            ),
        ];

        let compiler = TeraCompiler::new();
        let tera = compiler.compile(&sources, &FunctionTable::new()).unwrap();

        let out = render(&compiler, &tera, "page.tmpl", json!({ "name": "ann" })).unwrap();
        assert_eq!(out, "<hi ann>");
    }

    #[test]
    fn test_compile_syntax_error() {
        let temp = TempDir::new().unwrap();
        let sources = vec![source(temp.path(), "bad.tmpl", "{% if %}")];

        let err = TeraCompiler::new()
            .compile(&sources, &FunctionTable::new())
            .unwrap_err();
        assert!(matches!(err, Error::Compile(_)));
    }

    #[test]
    fn test_render_missing_entry() {
        let compiler = TeraCompiler::new();
        let tera = compiler.compile(&[], &FunctionTable::new()).unwrap();

        let err = render(&compiler, &tera, "nope.tmpl", Value::Null).unwrap_err();
        assert!(matches!(err, Error::Render { ref name, .. } if name == "nope.tmpl"));
    }

    #[test]
    fn test_render_rejects_non_object_data() {
        let temp = TempDir::new().unwrap();
        let sources = vec![source(temp.path(), "a.tmpl", "a")];
        let compiler = TeraCompiler::new();
        let tera = compiler.compile(&sources, &FunctionTable::new()).unwrap();

        assert!(render(&compiler, &tera, "a.tmpl", json!([1, 2])).is_err());
        assert_eq!(render(&compiler, &tera, "a.tmpl", Value::Null).unwrap(), "a");
    }

    #[test]
    fn test_override_is_scoped_to_call() {
        let temp = TempDir::new().unwrap();
        let sources = vec![source(temp.path(), "a.tmpl", "{{ who() }}")];
        let base = FunctionTable::new().with("who", |_| Ok(json!("base")));
        let overrides = FunctionTable::new().with("who", |_| Ok(json!("override")));

        let compiler = TeraCompiler::new();
        let tera = compiler.compile(&sources, &base).unwrap();

        let out = render_with(&compiler, &tera, "a.tmpl", Value::Null, &overrides).unwrap();
        assert_eq!(out, "override");
        let out = render(&compiler, &tera, "a.tmpl", Value::Null).unwrap();
        assert_eq!(out, "base");
    }

    #[test]
    fn test_function_error_fails_render() {
        let temp = TempDir::new().unwrap();
        let sources = vec![source(temp.path(), "a.tmpl", "{{ fail() }}")];
        let functions = FunctionTable::new().with("fail", |_| Err("nope".to_owned()));

        let compiler = TeraCompiler::new();
        let tera = compiler.compile(&sources, &functions).unwrap();

        let err = render(&compiler, &tera, "a.tmpl", Value::Null).unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
    }
}
