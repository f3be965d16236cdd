//! Python language adapter.

use tree_sitter::{Node, Parser};

use crate::adapter::{find_descendant, named_children, LanguageAdapter, StatementKind};
use crate::error::{FlowError, Result};

pub struct Python;

impl LanguageAdapter for Python {
    fn name(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &[&'static str] {
        &[".py", ".pyi"]
    }

    fn parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| FlowError::TreeSitter(e.to_string()))?;
        Ok(parser)
    }

    fn function_query(&self) -> &'static str {
        r#"(function_definition name: (identifier) @name) @function"#
    }

    fn class_query(&self) -> &'static str {
        r#"(class_definition name: (identifier) @name) @class"#
    }

    fn classify(&self, node: Node, _source: &[u8]) -> StatementKind {
        match node.kind() {
            "if_statement" | "elif_clause" => StatementKind::Conditional,
            "while_statement" => StatementKind::WhileLoop,
            "for_statement" => StatementKind::ForEachLoop,
            "try_statement" => StatementKind::Try,
            "match_statement" => StatementKind::Switch,
            "return_statement" => StatementKind::Return,
            "raise_statement" => StatementKind::Throw,
            "break_statement" => StatementKind::Break,
            "continue_statement" => StatementKind::Continue,
            "block" | "else_clause" | "with_statement" => StatementKind::Block,
            // Nested definitions get their own graphs; imports and
            // scope markers have no flow of their own.
            "pass_statement"
            | "comment"
            | "import_statement"
            | "import_from_statement"
            | "future_import_statement"
            | "global_statement"
            | "nonlocal_statement"
            | "function_definition"
            | "class_definition"
            | "decorated_definition" => StatementKind::NonExecutable,
            "expression_statement" => {
                if find_descendant(node, &["await"]).is_some() {
                    StatementKind::Await
                } else {
                    StatementKind::Expression
                }
            }
            _ => StatementKind::Expression,
        }
    }

    fn function_name(&self, node: Node, source: &[u8]) -> Option<String> {
        node.child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok())
            .map(String::from)
    }

    /// The grammar flattens `elif` chains: every `elif_clause` and the
    /// `else_clause` are repeated `alternative` children of the parent
    /// `if_statement`. Re-chain them by handing back the next clause.
    fn else_branch<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        match node.kind() {
            "if_statement" => node.child_by_field_name("alternative"),
            "elif_clause" => {
                let mut sibling = node.next_named_sibling();
                while let Some(s) = sibling {
                    if matches!(s.kind(), "elif_clause" | "else_clause") {
                        return Some(s);
                    }
                    sibling = s.next_named_sibling();
                }
                None
            }
            _ => None,
        }
    }

    // match statements

    fn switch_subject<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("subject")
    }

    fn switch_cases<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        node.child_by_field_name("body")
            .map(named_children)
            .unwrap_or_default()
            .into_iter()
            .filter(|c| c.kind() == "case_clause")
            .collect()
    }

    fn case_is_default(&self, case: Node, source: &[u8]) -> bool {
        self.case_value(case, source).as_deref() == Some("_")
    }

    fn switch_captures_break(&self) -> bool {
        false
    }

    fn case_value(&self, case: Node, source: &[u8]) -> Option<String> {
        let patterns: Vec<&str> = named_children(case)
            .into_iter()
            .filter(|c| c.kind() == "case_pattern")
            .filter_map(|c| c.utf8_text(source).ok())
            .collect();
        if patterns.is_empty() {
            None
        } else {
            Some(patterns.join(" | "))
        }
    }

    fn case_statements<'t>(&self, case: Node<'t>) -> Vec<Node<'t>> {
        case.child_by_field_name("consequence")
            .map(named_children)
            .unwrap_or_default()
    }

    // try statements

    fn catch_clauses<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        named_children(node)
            .into_iter()
            .filter(|c| matches!(c.kind(), "except_clause" | "except_group_clause"))
            .collect()
    }

    fn catch_label(&self, clause: Node, source: &[u8]) -> String {
        // `except ValueError as e` parses as one as_pattern child; the
        // type is its first named child.
        let ty = named_children(clause)
            .into_iter()
            .find(|c| c.kind() != "block")
            .map(|c| match c.kind() {
                "as_pattern" => c.named_child(0).unwrap_or(c),
                _ => c,
            })
            .and_then(|c| c.utf8_text(source).ok());
        match ty {
            Some(ty) => format!("except {ty}"),
            None => "except".to_string(),
        }
    }

    fn catch_body<'t>(&self, clause: Node<'t>) -> Option<Node<'t>> {
        named_children(clause)
            .into_iter()
            .rev()
            .find(|c| c.kind() == "block")
    }

    fn finally_body<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        named_children(node)
            .into_iter()
            .find(|c| c.kind() == "finally_clause")
            .and_then(|f| named_children(f).into_iter().find(|c| c.kind() == "block"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> tree_sitter::Tree {
        let mut parser = Python.parser().unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn classifies_core_statements() {
        let source = "def f():\n    if x:\n        return 1\n    for i in xs:\n        pass\n";
        let tree = parse(source);
        let body = tree
            .root_node()
            .named_child(0)
            .unwrap()
            .child_by_field_name("body")
            .unwrap();
        let kinds: Vec<StatementKind> = named_children(body)
            .into_iter()
            .map(|n| Python.classify(n, source.as_bytes()))
            .collect();
        assert_eq!(
            kinds,
            vec![StatementKind::Conditional, StatementKind::ForEachLoop]
        );
    }

    #[test]
    fn elif_clause_chains_to_next_alternative() {
        let source = "if a:\n    x()\nelif b:\n    y()\nelse:\n    z()\n";
        let tree = parse(source);
        let if_stmt = tree.root_node().named_child(0).unwrap();
        let elif = Python.else_branch(if_stmt).unwrap();
        assert_eq!(elif.kind(), "elif_clause");
        let else_clause = Python.else_branch(elif).unwrap();
        assert_eq!(else_clause.kind(), "else_clause");
    }

    #[test]
    fn except_clause_label_carries_exception_type() {
        let source = "try:\n    f()\nexcept ValueError as e:\n    g()\nfinally:\n    h()\n";
        let tree = parse(source);
        let try_stmt = tree.root_node().named_child(0).unwrap();
        let clauses = Python.catch_clauses(try_stmt);
        assert_eq!(clauses.len(), 1);
        assert_eq!(
            Python.catch_label(clauses[0], source.as_bytes()),
            "except ValueError"
        );
        assert!(Python.catch_body(clauses[0]).is_some());
        assert!(Python.finally_body(try_stmt).is_some());
    }

    #[test]
    fn await_statement_detected() {
        let source = "async def f():\n    await fetch()\n";
        let tree = parse(source);
        let body = tree
            .root_node()
            .named_child(0)
            .unwrap()
            .child_by_field_name("body")
            .unwrap();
        let stmt = body.named_child(0).unwrap();
        assert_eq!(
            Python.classify(stmt, source.as_bytes()),
            StatementKind::Await
        );
    }

    #[test]
    fn match_cases_extracted() {
        let source = "match cmd:\n    case \"a\":\n        f()\n    case _:\n        g()\n";
        let tree = parse(source);
        let m = tree.root_node().named_child(0).unwrap();
        assert_eq!(m.kind(), "match_statement");
        let cases = Python.switch_cases(m);
        assert_eq!(cases.len(), 2);
        assert!(!Python.case_is_default(cases[0], source.as_bytes()));
        assert!(Python.case_is_default(cases[1], source.as_bytes()));
        assert_eq!(Python.case_statements(cases[0]).len(), 1);
    }
}
