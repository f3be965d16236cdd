//! Go language adapter.
//!
//! Go's `for` is four loops in one keyword; [`Go::classify`] splits it
//! by inspecting the header clause. Switch fallthrough is explicit
//! (`fallthrough` statement) rather than implicit, and `select` gets
//! its own dispatch kind.

use tree_sitter::{Node, Parser};

use crate::adapter::{
    named_children, named_children_excluding_fields, LanguageAdapter, StatementKind,
};
use crate::error::{FlowError, Result};

pub struct Go;

/// Header clause of a `for_statement`, not counting the body.
fn for_header(node: Node) -> Option<Node> {
    named_children(node)
        .into_iter()
        .find(|c| !matches!(c.kind(), "block"))
}

impl LanguageAdapter for Go {
    fn name(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &[&'static str] {
        &[".go"]
    }

    fn parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| FlowError::TreeSitter(e.to_string()))?;
        Ok(parser)
    }

    fn function_query(&self) -> &'static str {
        r#"[
            (function_declaration name: (identifier) @name) @function
            (method_declaration name: (field_identifier) @name) @function
        ]"#
    }

    fn class_query(&self) -> &'static str {
        r#"(type_declaration (type_spec name: (type_identifier) @name type: (struct_type))) @class"#
    }

    fn classify(&self, node: Node, _source: &[u8]) -> StatementKind {
        match node.kind() {
            "if_statement" => StatementKind::Conditional,
            "for_statement" => match for_header(node).map(|h| h.kind()) {
                Some("range_clause") => StatementKind::ForEachLoop,
                Some("for_clause") => StatementKind::CountedLoop,
                Some(_) => StatementKind::WhileLoop,
                None => StatementKind::InfiniteLoop,
            },
            "expression_switch_statement" | "type_switch_statement" => StatementKind::Switch,
            "select_statement" => StatementKind::Select,
            "return_statement" => StatementKind::Return,
            "break_statement" => StatementKind::Break,
            "continue_statement" => StatementKind::Continue,
            "goto_statement" => StatementKind::Goto,
            "fallthrough_statement" => StatementKind::Fallthrough,
            "go_statement" => StatementKind::Spawn,
            "block" | "labeled_statement" => StatementKind::Block,
            "comment" | "import_declaration" | "type_declaration" => StatementKind::NonExecutable,
            _ => StatementKind::Expression,
        }
    }

    fn function_name(&self, node: Node, source: &[u8]) -> Option<String> {
        node.child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok())
            .map(String::from)
    }

    /// Bare-condition form: `for cond { ... }`.
    fn condition<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        if node.kind() == "for_statement" {
            return for_header(node).filter(|h| !matches!(h.kind(), "for_clause" | "range_clause"));
        }
        node.child_by_field_name("condition")
    }

    fn loop_init<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        for_header(node)?.child_by_field_name("initializer")
    }

    fn loop_condition<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        for_header(node)?.child_by_field_name("condition")
    }

    fn loop_update<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        for_header(node)?.child_by_field_name("update")
    }

    fn iterator_header(&self, node: Node, source: &[u8]) -> String {
        let Some(range) = for_header(node).filter(|h| h.kind() == "range_clause") else {
            return "each item".to_string();
        };
        let left = range
            .child_by_field_name("left")
            .and_then(|n| n.utf8_text(source).ok());
        let right = range
            .child_by_field_name("right")
            .and_then(|n| n.utf8_text(source).ok());
        match (left, right) {
            (Some(l), Some(r)) => format!("{l} := range {r}"),
            (None, Some(r)) => format!("range {r}"),
            _ => "each item".to_string(),
        }
    }

    fn block_statements<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        if node.kind() == "labeled_statement" {
            return named_children_excluding_fields(node, &["label"]);
        }
        crate::adapter::default_block_statements(node)
    }

    // switch and select

    fn switch_cases<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        named_children(node)
            .into_iter()
            .filter(|c| {
                matches!(
                    c.kind(),
                    "expression_case" | "type_case" | "default_case" | "communication_case"
                )
            })
            .collect()
    }

    fn case_is_default(&self, case: Node, _source: &[u8]) -> bool {
        case.kind() == "default_case"
    }

    fn case_value(&self, case: Node, source: &[u8]) -> Option<String> {
        let value = case
            .child_by_field_name("value")
            .or_else(|| case.child_by_field_name("communication"))
            .or_else(|| case.child_by_field_name("type"))?;
        value.utf8_text(source).ok().map(String::from)
    }

    fn case_statements<'t>(&self, case: Node<'t>) -> Vec<Node<'t>> {
        named_children_excluding_fields(case, &["value", "communication", "type"])
    }

    // go has no try; catch_clauses stays empty by default
}
