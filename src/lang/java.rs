//! Java language adapter.

use tree_sitter::{Node, Parser};

use crate::adapter::{
    named_children, named_children_excluding_fields, LanguageAdapter, StatementKind,
};
use crate::error::{FlowError, Result};

pub struct Java;

impl LanguageAdapter for Java {
    fn name(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &[&'static str] {
        &[".java"]
    }

    fn parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| FlowError::TreeSitter(e.to_string()))?;
        Ok(parser)
    }

    fn function_query(&self) -> &'static str {
        r#"[
            (method_declaration name: (identifier) @name) @function
            (constructor_declaration name: (identifier) @name) @function
        ]"#
    }

    fn class_query(&self) -> &'static str {
        r#"[
            (class_declaration name: (identifier) @name) @class
            (interface_declaration name: (identifier) @name) @class
            (enum_declaration name: (identifier) @name) @class
        ]"#
    }

    fn classify(&self, node: Node, _source: &[u8]) -> StatementKind {
        match node.kind() {
            "if_statement" => StatementKind::Conditional,
            "while_statement" => StatementKind::WhileLoop,
            "do_statement" => StatementKind::DoWhileLoop,
            "for_statement" => StatementKind::CountedLoop,
            "enhanced_for_statement" => StatementKind::ForEachLoop,
            "switch_expression" | "switch_statement" => StatementKind::Switch,
            "try_statement" | "try_with_resources_statement" => StatementKind::Try,
            "return_statement" => StatementKind::Return,
            "throw_statement" => StatementKind::Throw,
            "break_statement" => StatementKind::Break,
            "continue_statement" => StatementKind::Continue,
            "block" | "labeled_statement" => StatementKind::Block,
            "line_comment"
            | "block_comment"
            | "import_declaration"
            | "package_declaration"
            | "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "annotation_type_declaration" => StatementKind::NonExecutable,
            _ => StatementKind::Expression,
        }
    }

    fn function_name(&self, node: Node, source: &[u8]) -> Option<String> {
        node.child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok())
            .map(String::from)
    }

    fn loop_init<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("init")
    }

    fn iterator_header(&self, node: Node, source: &[u8]) -> String {
        let name = node
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok());
        let value = node
            .child_by_field_name("value")
            .and_then(|n| n.utf8_text(source).ok());
        match (name, value) {
            (Some(n), Some(v)) => format!("{n} : {v}"),
            _ => "each item".to_string(),
        }
    }

    // switch

    fn switch_cases<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        node.child_by_field_name("body")
            .map(named_children)
            .unwrap_or_default()
            .into_iter()
            .filter(|c| matches!(c.kind(), "switch_block_statement_group" | "switch_rule"))
            .collect()
    }

    fn case_is_default(&self, case: Node, source: &[u8]) -> bool {
        switch_label(case)
            .and_then(|l| l.utf8_text(source).ok())
            .map(|t| t.trim_start().starts_with("default"))
            .unwrap_or(false)
    }

    fn case_value(&self, case: Node, source: &[u8]) -> Option<String> {
        let text = switch_label(case)?.utf8_text(source).ok()?;
        Some(text.trim_start_matches("case").trim().to_string())
    }

    fn case_statements<'t>(&self, case: Node<'t>) -> Vec<Node<'t>> {
        named_children(case)
            .into_iter()
            .filter(|c| c.kind() != "switch_label")
            .collect()
    }

    fn switch_falls_through(&self) -> bool {
        true
    }

    // try

    fn catch_clauses<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        named_children(node)
            .into_iter()
            .filter(|c| c.kind() == "catch_clause")
            .collect()
    }

    fn catch_label(&self, clause: Node, source: &[u8]) -> String {
        let param = named_children(clause)
            .into_iter()
            .find(|c| c.kind() == "catch_formal_parameter")
            .and_then(|c| c.utf8_text(source).ok());
        match param {
            Some(p) => format!("catch ({p})"),
            None => "catch".to_string(),
        }
    }

    fn finally_body<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        named_children(node)
            .into_iter()
            .find(|c| c.kind() == "finally_clause")
            .and_then(|f| named_children(f).into_iter().find(|c| c.kind() == "block"))
    }

    fn block_statements<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        if node.kind() == "labeled_statement" {
            return named_children_excluding_fields(node, &["label"]);
        }
        crate::adapter::default_block_statements(node)
    }

    // stream pipelines

    fn hof_method_names(&self) -> &'static [&'static str] {
        &["map", "filter", "forEach", "reduce", "flatMap"]
    }

    fn method_name<'t>(&self, call: Node<'t>) -> Option<Node<'t>> {
        call.child_by_field_name("name")
    }

    fn call_receiver<'t>(&self, call: Node<'t>) -> Option<Node<'t>> {
        call.child_by_field_name("object")
    }
}

fn switch_label(case: Node) -> Option<Node> {
    named_children(case)
        .into_iter()
        .find(|c| c.kind() == "switch_label")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> tree_sitter::Tree {
        let mut parser = Java.parser().unwrap();
        parser.parse(source, None).unwrap()
    }

    fn method_body_statements(tree: &tree_sitter::Tree) -> Vec<Node<'_>> {
        let class_body = tree
            .root_node()
            .named_child(0)
            .unwrap()
            .child_by_field_name("body")
            .unwrap();
        let method = named_children(class_body)
            .into_iter()
            .find(|c| c.kind() == "method_declaration")
            .unwrap();
        named_children(method.child_by_field_name("body").unwrap())
    }

    #[test]
    fn classifies_loops_and_try() {
        let source = r#"
class A {
    void run(int[] xs) {
        for (int i = 0; i < 10; i++) { use(i); }
        for (int x : xs) { use(x); }
        do { step(); } while (more());
        try { risky(); } catch (Exception e) { log(e); }
    }
}
"#;
        let tree = parse(source);
        let kinds: Vec<StatementKind> = method_body_statements(&tree)
            .into_iter()
            .map(|n| Java.classify(n, source.as_bytes()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                StatementKind::CountedLoop,
                StatementKind::ForEachLoop,
                StatementKind::DoWhileLoop,
                StatementKind::Try,
            ]
        );
    }

    #[test]
    fn switch_groups_with_default() {
        let source = r#"
class A {
    void pick(int mode) {
        switch (mode) {
            case 1:
                a();
                break;
            default:
                b();
        }
    }
}
"#;
        let tree = parse(source);
        let sw = method_body_statements(&tree)[0];
        assert_eq!(Java.classify(sw, source.as_bytes()), StatementKind::Switch);
        let cases = Java.switch_cases(sw);
        assert_eq!(cases.len(), 2);
        assert_eq!(Java.case_value(cases[0], source.as_bytes()).as_deref(), Some("1"));
        assert!(Java.case_is_default(cases[1], source.as_bytes()));
        assert_eq!(Java.case_statements(cases[0]).len(), 2);
    }

    #[test]
    fn catch_label_includes_parameter() {
        let source = r#"
class A {
    void run() {
        try { risky(); } catch (Exception e) { log(e); } finally { done(); }
    }
}
"#;
        let tree = parse(source);
        let try_stmt = method_body_statements(&tree)[0];
        let clauses = Java.catch_clauses(try_stmt);
        assert_eq!(clauses.len(), 1);
        assert_eq!(
            Java.catch_label(clauses[0], source.as_bytes()),
            "catch (Exception e)"
        );
        assert!(Java.finally_body(try_stmt).is_some());
    }
}
