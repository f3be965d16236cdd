//! Rust language adapter.
//!
//! Named `rust_lang` to avoid conflict with the `rust` keyword. Rust
//! wraps control flow in expressions (`if_expression` inside an
//! `expression_statement`), so the adapter unwraps statement shells
//! before classification.

use tree_sitter::{Node, Parser};

use crate::adapter::{find_descendant, named_children, LanguageAdapter, StatementKind};
use crate::error::{FlowError, Result};

pub struct RustLang;

impl LanguageAdapter for RustLang {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn extensions(&self) -> &[&'static str] {
        &[".rs"]
    }

    fn parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_rust::LANGUAGE.into())
            .map_err(|e| FlowError::TreeSitter(e.to_string()))?;
        Ok(parser)
    }

    fn function_query(&self) -> &'static str {
        r#"(function_item name: (identifier) @name) @function"#
    }

    fn class_query(&self) -> &'static str {
        r#"[
            (impl_item type: (type_identifier) @name) @class
            (trait_item name: (type_identifier) @name) @class
        ]"#
    }

    fn unwrap_statement<'t>(&self, node: Node<'t>) -> Node<'t> {
        if node.kind() == "expression_statement" {
            if let Some(inner) = node.named_child(0) {
                return inner;
            }
        }
        node
    }

    fn classify(&self, node: Node, source: &[u8]) -> StatementKind {
        match node.kind() {
            "if_expression" | "if_let_expression" => StatementKind::Conditional,
            "while_expression" | "while_let_expression" => StatementKind::WhileLoop,
            "loop_expression" => StatementKind::InfiniteLoop,
            "for_expression" => StatementKind::ForEachLoop,
            "match_expression" => StatementKind::Switch,
            "return_expression" => StatementKind::Return,
            "break_expression" => StatementKind::Break,
            "continue_expression" => StatementKind::Continue,
            "await_expression" => StatementKind::Await,
            "block" | "unsafe_block" | "else_clause" | "async_block" => StatementKind::Block,
            "macro_invocation" => {
                let name = node
                    .child_by_field_name("macro")
                    .and_then(|m| m.utf8_text(source).ok());
                match name {
                    Some("panic" | "unreachable" | "todo" | "unimplemented") => {
                        StatementKind::Throw
                    }
                    _ => StatementKind::Expression,
                }
            }
            "let_declaration" => {
                if find_descendant(node, &["await_expression"]).is_some() {
                    StatementKind::Await
                } else {
                    StatementKind::Expression
                }
            }
            "function_item" | "struct_item" | "enum_item" | "impl_item" | "trait_item"
            | "mod_item" | "use_declaration" | "type_item" | "const_item" | "static_item"
            | "macro_definition" | "attribute_item" | "inner_attribute_item" | "line_comment"
            | "block_comment" | "empty_statement" => StatementKind::NonExecutable,
            _ => StatementKind::Expression,
        }
    }

    fn function_name(&self, node: Node, source: &[u8]) -> Option<String> {
        node.child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok())
            .map(String::from)
    }

    fn iterator_header(&self, node: Node, source: &[u8]) -> String {
        let pattern = node
            .child_by_field_name("pattern")
            .and_then(|n| n.utf8_text(source).ok());
        let value = node
            .child_by_field_name("value")
            .and_then(|n| n.utf8_text(source).ok());
        match (pattern, value) {
            (Some(p), Some(v)) => format!("{p} in {v}"),
            _ => "each item".to_string(),
        }
    }

    // match expressions

    fn switch_cases<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        node.child_by_field_name("body")
            .map(named_children)
            .unwrap_or_default()
            .into_iter()
            .filter(|c| c.kind() == "match_arm")
            .collect()
    }

    fn case_is_default(&self, case: Node, source: &[u8]) -> bool {
        self.case_value(case, source).as_deref() == Some("_")
    }

    fn switch_captures_break(&self) -> bool {
        false
    }

    fn case_value(&self, case: Node, source: &[u8]) -> Option<String> {
        case.child_by_field_name("pattern")
            .and_then(|n| n.utf8_text(source).ok())
            .map(String::from)
    }

    /// An arm's value is an expression; blocks get flattened, anything
    /// else is processed as a single statement.
    fn case_statements<'t>(&self, case: Node<'t>) -> Vec<Node<'t>> {
        match case.child_by_field_name("value") {
            Some(value) if value.kind() == "block" => named_children(value),
            Some(value) => vec![value],
            None => Vec::new(),
        }
    }

    fn hof_method_names(&self) -> &'static [&'static str] {
        &[
            "map", "filter", "for_each", "fold", "flat_map", "filter_map", "any", "all",
        ]
    }

    fn method_name<'t>(&self, call: Node<'t>) -> Option<Node<'t>> {
        let function = call.child_by_field_name("function")?;
        if function.kind() != "field_expression" {
            return None;
        }
        function.child_by_field_name("field")
    }

    fn call_receiver<'t>(&self, call: Node<'t>) -> Option<Node<'t>> {
        call.child_by_field_name("function")?
            .child_by_field_name("value")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> tree_sitter::Tree {
        let mut parser = RustLang.parser().unwrap();
        parser.parse(source, None).unwrap()
    }

    fn body_statements(tree: &tree_sitter::Tree) -> Vec<Node<'_>> {
        let body = tree
            .root_node()
            .named_child(0)
            .unwrap()
            .child_by_field_name("body")
            .unwrap();
        named_children(body)
    }

    #[test]
    fn unwraps_expression_statements() {
        let source = "fn f(x: bool) {\n    if x { g(); }\n    loop { break; }\n}\n";
        let tree = parse(source);
        let stmts = body_statements(&tree);
        let kinds: Vec<StatementKind> = stmts
            .into_iter()
            .map(|n| RustLang.classify(RustLang.unwrap_statement(n), source.as_bytes()))
            .collect();
        assert_eq!(
            kinds,
            vec![StatementKind::Conditional, StatementKind::InfiniteLoop]
        );
    }

    #[test]
    fn match_arms_and_wildcard() {
        let source = r#"
fn f(x: u32) -> u32 {
    match x {
        0 => zero(),
        1 => { one(); two() }
        _ => other(),
    }
}
"#;
        let tree = parse(source);
        let stmt = RustLang.unwrap_statement(body_statements(&tree)[0]);
        assert_eq!(
            RustLang.classify(stmt, source.as_bytes()),
            StatementKind::Switch
        );
        let arms = RustLang.switch_cases(stmt);
        assert_eq!(arms.len(), 3);
        assert!(!RustLang.case_is_default(arms[0], source.as_bytes()));
        assert!(RustLang.case_is_default(arms[2], source.as_bytes()));
        assert_eq!(RustLang.case_statements(arms[1]).len(), 2);
        assert_eq!(RustLang.case_statements(arms[0]).len(), 1);
    }

    #[test]
    fn panic_macro_is_abrupt_exit() {
        let source = "fn f() {\n    panic!(\"boom\");\n}\n";
        let tree = parse(source);
        let stmt = RustLang.unwrap_statement(body_statements(&tree)[0]);
        assert_eq!(
            RustLang.classify(stmt, source.as_bytes()),
            StatementKind::Throw
        );
    }

    #[test]
    fn iterator_method_detected_as_hof() {
        let source = "fn f(xs: Vec<u32>) {\n    xs.iter().map(|x| x * 2);\n}\n";
        let tree = parse(source);
        let stmt = RustLang.unwrap_statement(body_statements(&tree)[0]);
        let call = RustLang.call_node(stmt).unwrap();
        let name = RustLang.method_name(call).unwrap();
        assert_eq!(name.utf8_text(source.as_bytes()).unwrap(), "map");
    }
}
