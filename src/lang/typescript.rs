//! TypeScript / JavaScript language adapter.
//!
//! One adapter covers both surface languages; the `is_tsx` flag picks
//! the TSX grammar, which is required whenever JSX syntax can appear.

use tree_sitter::{Node, Parser};

use crate::adapter::{find_descendant, named_children, LanguageAdapter, StatementKind};
use crate::error::{FlowError, Result};

pub struct TypeScript {
    is_tsx: bool,
}

impl Default for TypeScript {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeScript {
    pub fn new() -> Self {
        TypeScript { is_tsx: false }
    }

    pub fn tsx() -> Self {
        TypeScript { is_tsx: true }
    }
}

impl LanguageAdapter for TypeScript {
    fn name(&self) -> &'static str {
        if self.is_tsx {
            "tsx"
        } else {
            "typescript"
        }
    }

    fn extensions(&self) -> &[&'static str] {
        if self.is_tsx {
            &[".tsx", ".jsx"]
        } else {
            &[".ts", ".js", ".mjs", ".cjs", ".mts", ".cts"]
        }
    }

    fn parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        let lang = if self.is_tsx {
            &tree_sitter_typescript::LANGUAGE_TSX
        } else {
            &tree_sitter_typescript::LANGUAGE_TYPESCRIPT
        };
        parser
            .set_language(&(*lang).into())
            .map_err(|e| FlowError::TreeSitter(e.to_string()))?;
        Ok(parser)
    }

    fn function_query(&self) -> &'static str {
        r#"[
            (function_declaration name: (identifier) @name) @function
            (method_definition name: (property_identifier) @name) @function
            (generator_function_declaration name: (identifier) @name) @function
            (function_expression name: (identifier) @name) @function
            (variable_declarator
                name: (identifier) @name
                value: (arrow_function) @function)
            (variable_declarator
                name: (identifier) @name
                value: (function_expression) @function)
            (arrow_function) @function
            (function_expression) @function
        ]"#
    }

    fn class_query(&self) -> &'static str {
        r#"[
            (class_declaration name: (type_identifier) @name) @class
            (abstract_class_declaration name: (type_identifier) @name) @class
            (class) @class
        ]"#
    }

    fn classify(&self, node: Node, _source: &[u8]) -> StatementKind {
        match node.kind() {
            "if_statement" => StatementKind::Conditional,
            "while_statement" => StatementKind::WhileLoop,
            "do_statement" => StatementKind::DoWhileLoop,
            "for_statement" => StatementKind::CountedLoop,
            "for_in_statement" => StatementKind::ForEachLoop,
            "switch_statement" => StatementKind::Switch,
            "try_statement" => StatementKind::Try,
            "return_statement" => StatementKind::Return,
            "throw_statement" => StatementKind::Throw,
            "break_statement" => StatementKind::Break,
            "continue_statement" => StatementKind::Continue,
            "statement_block" | "else_clause" | "labeled_statement" => StatementKind::Block,
            "comment"
            | "empty_statement"
            | "import_statement"
            | "function_declaration"
            | "generator_function_declaration"
            | "class_declaration"
            | "abstract_class_declaration"
            | "interface_declaration"
            | "type_alias_declaration"
            | "enum_declaration"
            | "ambient_declaration" => StatementKind::NonExecutable,
            "expression_statement" | "lexical_declaration" | "variable_declaration" => {
                if find_descendant(node, &["await_expression"]).is_some() {
                    StatementKind::Await
                } else {
                    StatementKind::Expression
                }
            }
            _ => StatementKind::Expression,
        }
    }

    fn function_name(&self, node: Node, source: &[u8]) -> Option<String> {
        if let Some(name) = node.child_by_field_name("name") {
            return name.utf8_text(source).ok().map(String::from);
        }
        // const f = () => {} and { f: function() {} } forms
        let parent = node.parent()?;
        match parent.kind() {
            "variable_declarator" | "pair" | "assignment_expression" => parent
                .child_by_field_name("name")
                .or_else(|| parent.child_by_field_name("key"))
                .or_else(|| parent.child_by_field_name("left"))
                .and_then(|n| n.utf8_text(source).ok())
                .map(String::from),
            _ => None,
        }
    }

    fn loop_update<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("increment")
    }

    fn iterator_header(&self, node: Node, source: &[u8]) -> String {
        let left = node
            .child_by_field_name("left")
            .and_then(|n| n.utf8_text(source).ok());
        let right = node
            .child_by_field_name("right")
            .and_then(|n| n.utf8_text(source).ok());
        let op = node
            .child_by_field_name("operator")
            .and_then(|n| n.utf8_text(source).ok())
            .unwrap_or("of");
        match (left, right) {
            (Some(l), Some(r)) => format!("{l} {op} {r}"),
            _ => "each item".to_string(),
        }
    }

    // switch

    fn switch_cases<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        node.child_by_field_name("body")
            .map(named_children)
            .unwrap_or_default()
            .into_iter()
            .filter(|c| matches!(c.kind(), "switch_case" | "switch_default"))
            .collect()
    }

    fn case_is_default(&self, case: Node, _source: &[u8]) -> bool {
        case.kind() == "switch_default"
    }

    fn case_value(&self, case: Node, source: &[u8]) -> Option<String> {
        case.child_by_field_name("value")
            .and_then(|n| n.utf8_text(source).ok())
            .map(String::from)
    }

    fn case_statements<'t>(&self, case: Node<'t>) -> Vec<Node<'t>> {
        crate::adapter::named_children_excluding_fields(case, &["value"])
    }

    fn switch_falls_through(&self) -> bool {
        true
    }

    // try

    fn catch_clauses<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        node.child_by_field_name("handler").into_iter().collect()
    }

    fn catch_label(&self, clause: Node, source: &[u8]) -> String {
        match clause
            .child_by_field_name("parameter")
            .and_then(|n| n.utf8_text(source).ok())
        {
            Some(param) => format!("catch ({param})"),
            None => "catch".to_string(),
        }
    }

    fn finally_body<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("finalizer")
            .and_then(|f| f.child_by_field_name("body"))
    }

    fn hof_method_names(&self) -> &'static [&'static str] {
        &[
            "map", "filter", "reduce", "forEach", "flatMap", "find", "some", "every",
        ]
    }

    fn has_promise_chains(&self) -> bool {
        true
    }
}
