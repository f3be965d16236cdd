//! Generator boundary: files and sources in, flowcharts out.
//!
//! This is the only fallible layer. It reads input, resolves the
//! language, parses, and locates the requested function before handing
//! the definition node to the infallible engine. Function lookup
//! accepts plain names and `Class.method` qualified names.

use std::fs;
use std::path::Path;

use streaming_iterator::StreamingIterator;
use tracing::debug;
use tree_sitter::{Node, Query, QueryCursor, Tree};

use crate::adapter::LanguageAdapter;
use crate::engine::{EngineConfig, FunctionBuilder};
use crate::error::{FlowError, Result};
use crate::ir::FlowchartIR;
use crate::lang::registry;
use crate::util::format_query_error;

/// Builds [`FlowchartIR`] values from files or in-memory sources.
#[derive(Default)]
pub struct FlowchartGenerator {
    config: EngineConfig,
}

impl FlowchartGenerator {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Build the flowchart of `function` in `path`, detecting the
    /// language from the file extension.
    pub fn from_file(&self, path: &Path, function: &str) -> Result<FlowchartIR> {
        let adapter = registry::global()
            .detect_language(path)
            .ok_or_else(|| FlowError::UnsupportedLanguage(path.display().to_string()))?;
        let source = fs::read_to_string(path).map_err(|e| FlowError::io(path, e))?;
        self.build(adapter, &source, &path.display().to_string(), function)
    }

    /// Same as [`from_file`](Self::from_file) with an explicit language
    /// name, bypassing extension detection.
    pub fn from_file_with_language(
        &self,
        path: &Path,
        function: &str,
        language: &str,
    ) -> Result<FlowchartIR> {
        let adapter = registry::global()
            .get_by_name(language)
            .ok_or_else(|| FlowError::UnsupportedLanguage(language.to_string()))?;
        let source = fs::read_to_string(path).map_err(|e| FlowError::io(path, e))?;
        self.build(adapter, &source, &path.display().to_string(), function)
    }

    /// Build from an in-memory source string.
    pub fn from_source(&self, source: &str, language: &str, function: &str) -> Result<FlowchartIR> {
        let adapter = registry::global()
            .get_by_name(language)
            .ok_or_else(|| FlowError::UnsupportedLanguage(language.to_string()))?;
        self.build(adapter, source, "<source>", function)
    }

    /// Names of all functions the language's query finds in `source`.
    pub fn list_functions(&self, source: &str, language: &str) -> Result<Vec<String>> {
        let adapter = registry::global()
            .get_by_name(language)
            .ok_or_else(|| FlowError::UnsupportedLanguage(language.to_string()))?;
        let tree = parse(adapter, source, "<source>")?;
        let query = compile_query(adapter, "function", adapter.function_query())?;
        let name_idx = query.capture_index_for_name("name");

        let mut names = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, tree.root_node(), source.as_bytes());
        while let Some(m) = matches.next() {
            let name = m
                .captures
                .iter()
                .find(|c| Some(c.index) == name_idx)
                .and_then(|c| c.node.utf8_text(source.as_bytes()).ok())
                .map(String::from);
            if let Some(name) = name {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }

    fn build(
        &self,
        adapter: &dyn LanguageAdapter,
        source: &str,
        file: &str,
        function: &str,
    ) -> Result<FlowchartIR> {
        let tree = parse(adapter, source, file)?;
        debug!(language = adapter.name(), %file, function, "locating function");
        let node = self
            .find_function(adapter, tree.root_node(), source, function)?
            .ok_or_else(|| FlowError::FunctionNotFound {
                name: function.to_string(),
                file: file.to_string(),
            })?;
        FunctionBuilder::with_config(adapter, source.as_bytes(), self.config).build(node)
    }

    fn find_function<'t>(
        &self,
        adapter: &dyn LanguageAdapter,
        root: Node<'t>,
        source: &str,
        target: &str,
    ) -> Result<Option<Node<'t>>> {
        if let Some((class_name, method)) = target.split_once('.') {
            let class_node = find_named_capture(
                adapter,
                adapter.class_query(),
                "class",
                root,
                source,
                class_name,
            )?;
            return match class_node {
                Some(scope) => find_function_in(adapter, scope, source, method),
                None => Ok(None),
            };
        }
        find_function_in(adapter, root, source, target)
    }
}

fn parse(adapter: &dyn LanguageAdapter, source: &str, file: &str) -> Result<Tree> {
    let mut parser = adapter.parser()?;
    parser.parse(source, None).ok_or_else(|| FlowError::Parse {
        file: file.to_string(),
        message: "parser produced no tree".to_string(),
    })
}

fn compile_query(adapter: &dyn LanguageAdapter, kind: &str, query_str: &str) -> Result<Query> {
    let parser = adapter.parser()?;
    let lang = parser
        .language()
        .ok_or_else(|| FlowError::TreeSitter("parser has no language set".to_string()))?;
    Query::new(&lang, query_str)
        .map_err(|e| FlowError::TreeSitter(format_query_error(adapter.name(), kind, query_str, &e)))
}

/// Find the node captured as `@{capture}` in the first match whose
/// `@name` capture equals `target`.
fn find_named_capture<'t>(
    adapter: &dyn LanguageAdapter,
    query_str: &str,
    capture: &str,
    scope: Node<'t>,
    source: &str,
    target: &str,
) -> Result<Option<Node<'t>>> {
    let query = compile_query(adapter, capture, query_str)?;
    let cap_idx = query.capture_index_for_name(capture).ok_or_else(|| {
        FlowError::TreeSitter(format!(
            "{} query for {} lacks a @{} capture",
            capture,
            adapter.name(),
            capture
        ))
    })?;
    let name_idx = query.capture_index_for_name("name");

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, scope, source.as_bytes());
    while let Some(m) = matches.next() {
        let name = m
            .captures
            .iter()
            .find(|c| Some(c.index) == name_idx)
            .and_then(|c| c.node.utf8_text(source.as_bytes()).ok());
        if name == Some(target) {
            if let Some(c) = m.captures.iter().find(|c| c.index == cap_idx) {
                return Ok(Some(c.node));
            }
        }
    }
    Ok(None)
}

fn find_function_in<'t>(
    adapter: &dyn LanguageAdapter,
    scope: Node<'t>,
    source: &str,
    target: &str,
) -> Result<Option<Node<'t>>> {
    let query = compile_query(adapter, "function", adapter.function_query())?;
    let func_idx = query.capture_index_for_name("function").ok_or_else(|| {
        FlowError::TreeSitter(format!(
            "function query for {} lacks a @function capture",
            adapter.name()
        ))
    })?;
    let name_idx = query.capture_index_for_name("name");

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, scope, source.as_bytes());
    while let Some(m) = matches.next() {
        let Some(func) = m
            .captures
            .iter()
            .find(|c| c.index == func_idx)
            .map(|c| c.node)
        else {
            continue;
        };
        let name = m
            .captures
            .iter()
            .find(|c| Some(c.index) == name_idx)
            .and_then(|c| c.node.utf8_text(source.as_bytes()).ok())
            .map(String::from)
            .or_else(|| adapter.function_name(func, source.as_bytes()));
        if name.as_deref() == Some(target) {
            return Ok(Some(func));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_source(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn from_file_detects_language_and_builds() {
        let file = temp_source(
            ".py",
            "def greet(name):\n    if name:\n        return 1\n    return 0\n",
        );
        let ir = FlowchartGenerator::new()
            .from_file(file.path(), "greet")
            .unwrap();
        assert_eq!(ir.function_name, "greet");
        assert!(ir.validate().is_ok());
        assert!(!ir.truncated);
    }

    #[test]
    fn missing_function_is_an_error() {
        let file = temp_source(".py", "def f():\n    pass\n");
        let err = FlowchartGenerator::new()
            .from_file(file.path(), "nope")
            .unwrap_err();
        assert!(matches!(err, FlowError::FunctionNotFound { .. }));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let file = temp_source(".cob", "IDENTIFICATION DIVISION.\n");
        let err = FlowchartGenerator::new()
            .from_file(file.path(), "main")
            .unwrap_err();
        assert!(matches!(err, FlowError::UnsupportedLanguage(_)));
    }

    #[test]
    fn qualified_method_lookup() {
        let source = r#"
class Greeter:
    def hello(self):
        return "hi"

class Other:
    def hello(self):
        return "other"
"#;
        let gen = FlowchartGenerator::new();
        let greeter = gen.from_source(source, "python", "Greeter.hello").unwrap();
        let other = gen.from_source(source, "python", "Other.hello").unwrap();
        assert_eq!(greeter.function_name, "hello");
        // each qualified lookup must resolve inside its own class body
        assert!(greeter.function_range.0 < other.function_range.0);
    }

    #[test]
    fn list_functions_in_order() {
        let source = "def a():\n    pass\n\ndef b():\n    pass\n";
        let names = FlowchartGenerator::new()
            .list_functions(source, "python")
            .unwrap();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn language_alias_accepted() {
        let source = "function f() { return 1; }";
        let ir = FlowchartGenerator::new()
            .from_source(source, "javascript", "f")
            .unwrap();
        assert_eq!(ir.function_name, "f");
    }
}
