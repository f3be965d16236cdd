//! Language adapter seam.
//!
//! The engine never matches on grammar node kinds itself. Each language
//! contributes a [`LanguageAdapter`]: a classifier from syntax nodes to
//! the engine's statement vocabulary plus field accessors for the parts
//! of each construct. Defaults follow the field-name conventions shared
//! by most tree-sitter grammars (`condition`, `consequence`,
//! `alternative`, `body`), so adapters only override where their
//! grammar deviates.

use crate::error::Result;
use tree_sitter::{Node, Parser};

/// Statement vocabulary the engine dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// if / elif / ternary-style conditional statement.
    Conditional,
    /// Pre-tested loop (`while`).
    WhileLoop,
    /// Post-tested loop (`do ... while`).
    DoWhileLoop,
    /// init/condition/update loop (C-style `for`).
    CountedLoop,
    /// Iterator loop (`for x in xs`, `for ... range`, enhanced for).
    ForEachLoop,
    /// Loop with no condition (`loop`, `for {}`).
    InfiniteLoop,
    /// switch / match dispatch.
    Switch,
    /// Go `select` over channel operations.
    Select,
    /// try / catch / finally region.
    Try,
    Return,
    Break,
    Continue,
    /// throw / raise / panic-style abrupt exit.
    Throw,
    Goto,
    /// Go's explicit `fallthrough` marker inside a switch case.
    Fallthrough,
    /// Statement whose evaluation suspends (`await`).
    Await,
    /// Fire-and-forget dispatch (`go f()`).
    Spawn,
    /// Braced or indented group of statements; recursed into.
    Block,
    /// Comments, imports, nested definitions: contributes no node.
    NonExecutable,
    /// Anything else: one opaque process node.
    Expression,
}

/// Collect the named children of a node.
pub(crate) fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Body-field children if the node has a `body` field, otherwise its
/// own named children. Shared by the trait default and overrides.
pub(crate) fn default_block_statements<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    match node.child_by_field_name("body") {
        Some(body) => named_children(body),
        None => named_children(node),
    }
}

/// Named children not attached to any of the given grammar fields.
pub(crate) fn named_children_excluding_fields<'t>(
    node: Node<'t>,
    fields: &[&str],
) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let mut out = Vec::new();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            let excluded = cursor
                .field_name()
                .map(|f| fields.contains(&f))
                .unwrap_or(false);
            if child.is_named() && !excluded {
                out.push(child);
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

/// First descendant (depth-first, including `node`) with one of the
/// given kinds. Used for await detection and call extraction.
pub(crate) fn find_descendant<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    if kinds.contains(&node.kind()) {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if let Some(found) = find_descendant(child, kinds) {
            return Some(found);
        }
    }
    None
}

/// Per-language binding between a tree-sitter grammar and the engine.
///
/// Mirrors the shape of a language plugin: identity (name, extensions),
/// parser construction, function discovery queries, and the statement
/// classifier with its field accessors.
pub trait LanguageAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// File extensions claimed by this adapter, dot included.
    fn extensions(&self) -> &[&'static str];

    fn parser(&self) -> Result<Parser>;

    /// Query matching function definitions, with `@function` on the
    /// definition and `@name` on its identifier.
    fn function_query(&self) -> &'static str;

    /// Query matching class-like containers, with `@class` and `@name`
    /// captures. Used for qualified `Class.method` lookups.
    fn class_query(&self) -> &'static str;

    /// Map a statement node to the engine's vocabulary.
    fn classify(&self, node: Node, source: &[u8]) -> StatementKind;

    /// Name of a function definition node, if it has one.
    fn function_name(&self, node: Node, source: &[u8]) -> Option<String>;

    /// Body of a function definition node.
    fn function_body<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("body")
    }

    /// Strip statement wrappers before classification (e.g. Rust's
    /// `expression_statement` around an `if_expression`).
    fn unwrap_statement<'t>(&self, node: Node<'t>) -> Node<'t> {
        node
    }

    // --- conditionals ---

    fn condition<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("condition")
    }

    fn then_branch<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("consequence")
    }

    fn else_branch<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("alternative")
    }

    // --- loops ---

    fn loop_body<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("body")
    }

    fn loop_init<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("initializer")
    }

    fn loop_update<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("update")
    }

    /// Loop condition for counted loops; separate hook because some
    /// grammars nest it inside a clause node.
    fn loop_condition<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        self.condition(node)
    }

    /// Header text for iterator loops, e.g. `item in items`.
    fn iterator_header(&self, node: Node, source: &[u8]) -> String {
        let left = node
            .child_by_field_name("left")
            .and_then(|n| n.utf8_text(source).ok());
        let right = node
            .child_by_field_name("right")
            .and_then(|n| n.utf8_text(source).ok());
        match (left, right) {
            (Some(l), Some(r)) => format!("{l} in {r}"),
            _ => "each item".to_string(),
        }
    }

    // --- switch ---

    /// Subject expression of a switch / match.
    fn switch_subject<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("value")
            .or_else(|| node.child_by_field_name("condition"))
    }

    /// Case clauses in source order.
    fn switch_cases<'t>(&self, node: Node<'t>) -> Vec<Node<'t>>;

    fn case_is_default(&self, case: Node, source: &[u8]) -> bool;

    /// Label text for a non-default case.
    fn case_value(&self, case: Node, source: &[u8]) -> Option<String>;

    /// Executable statements of one case clause.
    fn case_statements<'t>(&self, case: Node<'t>) -> Vec<Node<'t>>;

    /// Whether a case without a terminating jump continues into the
    /// next case (C, Java, TypeScript) rather than leaving the switch.
    fn switch_falls_through(&self) -> bool {
        false
    }

    /// Whether `break` inside a case leaves the switch (C, Java,
    /// TypeScript, Go). Rust and Python `match` leave `break` to the
    /// enclosing loop.
    fn switch_captures_break(&self) -> bool {
        true
    }

    // --- exceptions ---

    fn try_body<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        node.child_by_field_name("body")
    }

    fn catch_clauses<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        let _ = node;
        Vec::new()
    }

    /// Display label for a handler, e.g. `except ValueError`.
    fn catch_label(&self, clause: Node, source: &[u8]) -> String {
        let _ = (clause, source);
        "catch".to_string()
    }

    fn catch_body<'t>(&self, clause: Node<'t>) -> Option<Node<'t>> {
        clause.child_by_field_name("body")
    }

    /// Body of the finally clause, when present.
    fn finally_body<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        let _ = node;
        None
    }

    // --- blocks and calls ---

    /// Statements of a block-like node. The default reads the `body`
    /// field if there is one, otherwise the node's own named children.
    fn block_statements<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        default_block_statements(node)
    }

    /// Outermost call expression inside a statement, if any.
    fn call_node<'t>(&self, stmt: Node<'t>) -> Option<Node<'t>> {
        find_descendant(stmt, &["call_expression", "call", "method_invocation"])
    }

    /// Method-name node of a call (`xs.map(...)` -> `map`), when the
    /// call goes through a member access.
    fn method_name<'t>(&self, call: Node<'t>) -> Option<Node<'t>> {
        let function = call.child_by_field_name("function")?;
        function
            .child_by_field_name("property")
            .or_else(|| function.child_by_field_name("field"))
    }

    /// Receiver of a method call (`xs.map(...)` -> `xs`).
    fn call_receiver<'t>(&self, call: Node<'t>) -> Option<Node<'t>> {
        let function = call.child_by_field_name("function")?;
        function
            .child_by_field_name("object")
            .or_else(|| function.child_by_field_name("value"))
    }

    /// Higher-order iteration methods rendered as loop subgraphs.
    fn hof_method_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether `.then/.catch/.finally` chains exist in this language.
    fn has_promise_chains(&self) -> bool {
        false
    }
}
