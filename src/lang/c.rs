//! C language adapter.
//!
//! Case bodies nest inside `case_statement` nodes, function names hide
//! under declarator chains (pointers, parameter lists), and `goto` is
//! a first-class jump.

use tree_sitter::{Node, Parser};

use crate::adapter::{
    named_children, named_children_excluding_fields, LanguageAdapter, StatementKind,
};
use crate::error::{FlowError, Result};

pub struct C;

impl LanguageAdapter for C {
    fn name(&self) -> &'static str {
        "c"
    }

    fn extensions(&self) -> &[&'static str] {
        &[".c", ".h"]
    }

    fn parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c::LANGUAGE.into())
            .map_err(|e| FlowError::TreeSitter(e.to_string()))?;
        Ok(parser)
    }

    fn function_query(&self) -> &'static str {
        r#"(function_definition
            declarator: (function_declarator declarator: (identifier) @name)) @function"#
    }

    fn class_query(&self) -> &'static str {
        r#"(struct_specifier name: (type_identifier) @name) @class"#
    }

    fn classify(&self, node: Node, _source: &[u8]) -> StatementKind {
        match node.kind() {
            "if_statement" => StatementKind::Conditional,
            "while_statement" => StatementKind::WhileLoop,
            "do_statement" => StatementKind::DoWhileLoop,
            "for_statement" => StatementKind::CountedLoop,
            "switch_statement" => StatementKind::Switch,
            "return_statement" => StatementKind::Return,
            "break_statement" => StatementKind::Break,
            "continue_statement" => StatementKind::Continue,
            "goto_statement" => StatementKind::Goto,
            "compound_statement" | "else_clause" | "labeled_statement" => StatementKind::Block,
            "comment"
            | "preproc_include"
            | "preproc_def"
            | "preproc_function_def"
            | "preproc_call"
            | "type_definition"
            | "struct_specifier"
            | "enum_specifier"
            | "function_definition" => StatementKind::NonExecutable,
            _ => StatementKind::Expression,
        }
    }

    /// Walk the declarator chain past pointers and parameter lists to
    /// the function's identifier.
    fn function_name(&self, node: Node, source: &[u8]) -> Option<String> {
        let mut declarator = node.child_by_field_name("declarator")?;
        loop {
            if declarator.kind() == "identifier" {
                return declarator.utf8_text(source).ok().map(String::from);
            }
            declarator = declarator.child_by_field_name("declarator")?;
        }
    }

    // switch

    fn switch_cases<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        node.child_by_field_name("body")
            .map(named_children)
            .unwrap_or_default()
            .into_iter()
            .filter(|c| c.kind() == "case_statement")
            .collect()
    }

    fn case_is_default(&self, case: Node, _source: &[u8]) -> bool {
        case.child_by_field_name("value").is_none()
    }

    fn case_value(&self, case: Node, source: &[u8]) -> Option<String> {
        case.child_by_field_name("value")
            .and_then(|n| n.utf8_text(source).ok())
            .map(String::from)
    }

    fn case_statements<'t>(&self, case: Node<'t>) -> Vec<Node<'t>> {
        named_children_excluding_fields(case, &["value"])
    }

    fn switch_falls_through(&self) -> bool {
        true
    }

    fn block_statements<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        if node.kind() == "labeled_statement" {
            return named_children_excluding_fields(node, &["label"]);
        }
        crate::adapter::default_block_statements(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> tree_sitter::Tree {
        let mut parser = C.parser().unwrap();
        parser.parse(source, None).unwrap()
    }

    fn body_statements(tree: &tree_sitter::Tree) -> Vec<Node<'_>> {
        let func = named_children(tree.root_node())
            .into_iter()
            .find(|c| c.kind() == "function_definition")
            .unwrap();
        named_children(func.child_by_field_name("body").unwrap())
    }

    #[test]
    fn function_name_through_pointer_declarator() {
        let source = "static char *lookup(int key) { return 0; }\n";
        let tree = parse(source);
        let func = named_children(tree.root_node())
            .into_iter()
            .find(|c| c.kind() == "function_definition")
            .unwrap();
        assert_eq!(
            C.function_name(func, source.as_bytes()),
            Some("lookup".to_string())
        );
    }

    #[test]
    fn switch_cases_nested_statements() {
        let source = r#"
int classify(int op) {
    switch (op) {
    case 1:
        handle_one();
        break;
    case 2:
        handle_two();
    default:
        handle_rest();
    }
    return 0;
}
"#;
        let tree = parse(source);
        let sw = body_statements(&tree)[0];
        assert_eq!(C.classify(sw, source.as_bytes()), StatementKind::Switch);
        let cases = C.switch_cases(sw);
        assert_eq!(cases.len(), 3);
        assert_eq!(C.case_value(cases[0], source.as_bytes()).as_deref(), Some("1"));
        assert!(C.case_is_default(cases[2], source.as_bytes()));
        assert_eq!(C.case_statements(cases[0]).len(), 2);
    }

    #[test]
    fn goto_classified_as_jump() {
        let source = "int f(void) {\n    goto out;\nout:\n    return 1;\n}\n";
        let tree = parse(source);
        let stmts = body_statements(&tree);
        assert_eq!(C.classify(stmts[0], source.as_bytes()), StatementKind::Goto);
        assert_eq!(
            C.classify(stmts[1], source.as_bytes()),
            StatementKind::Block
        );
    }
}
