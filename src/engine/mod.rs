//! Generic control-flow graph engine.
//!
//! One recursive walk over a function body, parameterized by a
//! [`LanguageAdapter`]. Each statement produces a [`ProcessResult`]
//! subgraph; sequencing and construct builders compose them by
//! resolving exit points. The engine is infallible: malformed input
//! degrades to partial graphs, unknown statements become opaque
//! process nodes, and resource exhaustion ends the graph in a
//! truncation marker.

mod calls;
mod conditional;
pub mod context;
mod exception;
mod jump;
mod loops;
mod switch;

pub use context::{FinallyContext, FlowContext, LoopContext};

use crate::adapter::{LanguageAdapter, StatementKind};
use crate::error::{FlowError, Result};
use crate::ir::{
    ExitPoint, FlowchartEdge, FlowchartIR, FlowchartNode, LocationEntry, NodeId, NodeShape,
    ProcessResult,
};
use rustc_hash::FxHashSet;
use tracing::{debug, trace, warn};
use tree_sitter::Node;

/// Resource caps for one build.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Maximum emitted nodes before the graph is truncated.
    pub max_nodes: usize,
    /// Maximum statement nesting depth before truncation.
    pub max_depth: usize,
    /// Maximum label length in characters; longer text is elided.
    pub max_label_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_nodes: 1000,
            max_depth: 120,
            max_label_len: 60,
        }
    }
}

/// Builds the flowchart for a single function. One instance per call;
/// all state is local, so repeated builds of the same source produce
/// identical output.
pub struct FunctionBuilder<'a> {
    adapter: &'a dyn LanguageAdapter,
    source: &'a [u8],
    config: EngineConfig,
    next_id: u32,
    emitted: usize,
    depth: usize,
    truncated: bool,
    location_map: Vec<LocationEntry>,
}

impl<'a> FunctionBuilder<'a> {
    pub fn new(adapter: &'a dyn LanguageAdapter, source: &'a [u8]) -> Self {
        Self::with_config(adapter, source, EngineConfig::default())
    }

    pub fn with_config(
        adapter: &'a dyn LanguageAdapter,
        source: &'a [u8],
        config: EngineConfig,
    ) -> Self {
        FunctionBuilder {
            adapter,
            source,
            config,
            next_id: 0,
            emitted: 0,
            depth: 0,
            truncated: false,
            location_map: Vec::new(),
        }
    }

    /// Build the complete flowchart for `function`, which must be a
    /// function definition node of this adapter's grammar.
    pub fn build(mut self, function: Node) -> Result<FlowchartIR> {
        let name = self
            .adapter
            .function_name(function, self.source)
            .unwrap_or_else(|| "anonymous".to_string());
        let body = self
            .adapter
            .function_body(function)
            .ok_or_else(|| FlowError::NotAFunction(function.kind().to_string()))?;

        debug!(function = %name, kind = function.kind(), "building flowchart");

        let start = self.make_node("Start", NodeShape::Stadium, None);
        let end = self.make_node("End", NodeShape::Stadium, None);
        let start_id = start.id;
        let end_id = end.id;

        let ctx = FlowContext::function(end_id);
        let body_result = self.process_statement(body, ctx);

        let mut nodes = vec![start];
        let mut edges = Vec::new();
        match body_result.entry {
            Some(entry) => edges.push(FlowchartEdge::unconditional(start_id, entry)),
            None => edges.push(FlowchartEdge::unconditional(start_id, end_id)),
        }
        for ep in body_result.pending_exits() {
            edges.push(FlowchartEdge {
                from: ep.id,
                to: end_id,
                label: ep.label.clone(),
            });
        }
        nodes.extend(body_result.nodes);
        edges.extend(body_result.edges);
        nodes.push(end);

        // Drop edges whose endpoints never made it into the node list.
        let ids: FxHashSet<NodeId> = nodes.iter().map(|n| n.id).collect();
        let before = edges.len();
        edges.retain(|e| ids.contains(&e.from) && ids.contains(&e.to));
        if edges.len() != before {
            warn!(
                function = %name,
                dropped = before - edges.len(),
                "dropped edges with unresolved endpoints"
            );
        }

        let ir = FlowchartIR {
            function_name: name,
            nodes,
            edges,
            entry: start_id,
            exit: end_id,
            location_map: std::mem::take(&mut self.location_map),
            function_range: (function.start_byte() as u32, function.end_byte() as u32),
            truncated: self.truncated,
        };
        if let Err(defect) = ir.validate() {
            warn!(function = %ir.function_name, %defect, "flowchart failed validation");
        }
        Ok(ir)
    }

    // --- dispatch ---

    pub(crate) fn process_statement(&mut self, node: Node, ctx: FlowContext) -> ProcessResult {
        if self.truncated {
            return ProcessResult::empty();
        }
        if self.emitted >= self.config.max_nodes || self.depth >= self.config.max_depth {
            return self.truncate();
        }
        let node = self.adapter.unwrap_statement(node);
        let kind = self.adapter.classify(node, self.source);
        trace!(node_kind = node.kind(), ?kind, depth = self.depth, "dispatch");

        self.depth += 1;
        let result = match kind {
            StatementKind::Conditional => self.process_conditional(node, ctx),
            StatementKind::WhileLoop => self.process_while(node, ctx),
            StatementKind::DoWhileLoop => self.process_do_while(node, ctx),
            StatementKind::CountedLoop => self.process_counted(node, ctx),
            StatementKind::ForEachLoop => self.process_for_each(node, ctx),
            StatementKind::InfiniteLoop => self.process_infinite(node, ctx),
            StatementKind::Switch => self.process_switch(node, ctx),
            StatementKind::Select => self.process_select(node, ctx),
            StatementKind::Try => self.process_try(node, ctx),
            StatementKind::Return
            | StatementKind::Break
            | StatementKind::Continue
            | StatementKind::Throw
            | StatementKind::Goto => self.process_jump(kind, node, ctx),
            // A fallthrough marker is consumed by the switch builder;
            // one appearing elsewhere is just shown as-is.
            StatementKind::Fallthrough => self.opaque_statement(node),
            StatementKind::Await => self.process_await(node),
            StatementKind::Spawn => self.process_spawn(node),
            StatementKind::Block => self.process_block_node(node, ctx),
            StatementKind::NonExecutable => ProcessResult::empty(),
            StatementKind::Expression => self.process_expression(node),
        };
        self.depth -= 1;
        result
    }

    /// Fold a statement sequence left to right, chaining exit points
    /// into entries. Non-executable statements are filtered up front.
    pub(crate) fn process_block(&mut self, statements: &[Node], ctx: FlowContext) -> ProcessResult {
        let mut out = ProcessResult::empty();
        for stmt in statements {
            if self
                .adapter
                .classify(self.adapter.unwrap_statement(*stmt), self.source)
                == StatementKind::NonExecutable
            {
                continue;
            }
            let result = self.process_statement(*stmt, ctx);
            out.chain(result);
            if self.truncated {
                break;
            }
        }
        out
    }

    pub(crate) fn process_block_node(&mut self, node: Node, ctx: FlowContext) -> ProcessResult {
        let statements = self.adapter.block_statements(node);
        self.process_block(&statements, ctx)
    }

    // --- leaves ---

    /// One opaque process node for a statement the engine does not
    /// model structurally.
    pub(crate) fn opaque_statement(&mut self, node: Node) -> ProcessResult {
        let label = self.label_text(node);
        let n = self.make_node(label, NodeShape::Rect, Some(node));
        ProcessResult::single(n)
    }

    fn process_await(&mut self, node: Node) -> ProcessResult {
        let label = self.label_text(node);
        let n = self.make_node(label, NodeShape::Stadium, Some(node));
        ProcessResult::single(n)
    }

    fn process_spawn(&mut self, node: Node) -> ProcessResult {
        let label = self.label_text(node);
        let n = self
            .make_node(label, NodeShape::Stadium, Some(node))
            .with_style("spawn");
        ProcessResult::single(n)
    }

    // --- node emission ---

    pub(crate) fn make_node(
        &mut self,
        label: impl Into<String>,
        shape: NodeShape,
        span: Option<Node>,
    ) -> FlowchartNode {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.emitted += 1;
        let mut node = FlowchartNode::new(id, label, shape);
        if let Some(src) = span {
            let start = src.start_byte() as u32;
            let end = src.end_byte() as u32;
            node.span = Some((start, end));
            self.location_map.push(LocationEntry {
                start,
                end,
                node: id,
            });
        }
        node
    }

    /// Unlabeled junction: break targets, loop and switch exits.
    pub(crate) fn junction_node(&mut self, style: &str) -> FlowchartNode {
        self.make_node("", NodeShape::Round, None).with_style(style)
    }

    /// Emit the single truncation marker and stop producing nodes.
    fn truncate(&mut self) -> ProcessResult {
        debug!(
            emitted = self.emitted,
            depth = self.depth,
            "resource cap hit, truncating graph"
        );
        self.truncated = true;
        let n = self
            .make_node("... (truncated)", NodeShape::Rect, None)
            .with_style("truncated");
        ProcessResult::single(n)
    }

    // --- text ---

    pub(crate) fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.source).unwrap_or("")
    }

    /// Single-line, length-capped label for a syntax node.
    pub(crate) fn label_text(&self, node: Node) -> String {
        let raw = self.node_text(node);
        let mut label = String::with_capacity(raw.len().min(self.config.max_label_len + 3));
        let mut last_space = false;
        for ch in raw.chars() {
            let ch = if ch.is_whitespace() { ' ' } else { ch };
            if ch == ' ' && last_space {
                continue;
            }
            last_space = ch == ' ';
            label.push(ch);
            if label.chars().count() >= self.config.max_label_len {
                label.push_str("...");
                break;
            }
        }
        if label.is_empty() {
            node.kind().to_string()
        } else {
            label
        }
    }

    /// Label for a condition-like child, falling back to a placeholder
    /// when the grammar node is missing (malformed source).
    pub(crate) fn condition_label(&self, cond: Option<Node>) -> String {
        match cond {
            Some(c) => self.label_text(strip_parens(c)),
            None => "?".to_string(),
        }
    }

    /// Resolve the pending exits of `result` to `target`, preserving
    /// labels, and append the edges to `out`.
    pub(crate) fn wire_exits_to(
        &self,
        result: &ProcessResult,
        target: NodeId,
        out: &mut Vec<FlowchartEdge>,
    ) {
        for ep in result.pending_exits() {
            out.push(FlowchartEdge {
                from: ep.id,
                to: target,
                label: ep.label.clone(),
            });
        }
    }

    pub(crate) fn exit_points_of(result: &ProcessResult) -> Vec<ExitPoint> {
        result.pending_exits().cloned().collect()
    }
}

/// Unwrap `parenthesized_expression`-style wrappers for label purposes.
fn strip_parens(node: Node) -> Node {
    if node.kind() == "parenthesized_expression" && node.named_child_count() == 1 {
        if let Some(inner) = node.named_child(0) {
            return inner;
        }
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::find_descendant;
    use crate::ir::NodeShape;
    use crate::lang::Python;

    fn build(source: &str) -> FlowchartIR {
        build_with_config(source, EngineConfig::default())
    }

    fn build_with_config(source: &str, config: EngineConfig) -> FlowchartIR {
        let adapter = Python;
        let mut parser = adapter.parser().unwrap();
        let tree = parser.parse(source, None).unwrap();
        let func = find_descendant(tree.root_node(), &["function_definition"]).unwrap();
        FunctionBuilder::with_config(&adapter, source.as_bytes(), config)
            .build(func)
            .unwrap()
    }

    fn diamonds(ir: &FlowchartIR) -> Vec<&FlowchartNode> {
        ir.nodes
            .iter()
            .filter(|n| n.shape == NodeShape::Diamond)
            .collect()
    }

    #[test]
    fn straight_line_chains_start_to_end() {
        let ir = build("def f():\n    a()\n    b()\n    c()\n");
        assert!(ir.validate().is_ok());
        // Start, a, b, c, End
        assert_eq!(ir.nodes.len(), 5);
        assert_eq!(ir.edges.len(), 4);
        assert_eq!(ir.edges_to(ir.entry).count(), 0);
        assert_eq!(ir.edges_from(ir.exit).count(), 0);
    }

    #[test]
    fn empty_body_wires_start_to_end() {
        let ir = build("def f():\n    pass\n");
        assert_eq!(ir.nodes.len(), 2);
        assert_eq!(ir.edges.len(), 1);
        assert_eq!(ir.edges[0].from, ir.entry);
        assert_eq!(ir.edges[0].to, ir.exit);
    }

    #[test]
    fn comments_and_imports_contribute_no_nodes() {
        let ir = build("def f():\n    # setup\n    import os\n    a()\n");
        // Start, a, End
        assert_eq!(ir.nodes.len(), 3);
    }

    #[test]
    fn if_without_else_falls_through_on_false() {
        let ir = build("def f(x):\n    if x:\n        a()\n    b()\n");
        let d = diamonds(&ir)[0];
        let outgoing: Vec<_> = ir.edges_from(d.id).collect();
        assert_eq!(outgoing.len(), 2);
        let false_edge = outgoing
            .iter()
            .find(|e| e.label.as_deref() == Some("False"))
            .unwrap();
        let true_edge = outgoing
            .iter()
            .find(|e| e.label.as_deref() == Some("True"))
            .unwrap();
        // both branches converge on b()
        let b_node = ir
            .nodes
            .iter()
            .find(|n| n.label == "b()")
            .unwrap();
        assert_eq!(false_edge.to, b_node.id);
        let a_node = ir.nodes.iter().find(|n| n.label == "a()").unwrap();
        assert_eq!(true_edge.to, a_node.id);
        assert!(ir.edges.iter().any(|e| e.from == a_node.id && e.to == b_node.id));
    }

    #[test]
    fn elif_chain_produces_nested_diamonds() {
        let ir = build(
            "def f(x):\n    if x == 1:\n        a()\n    elif x == 2:\n        b()\n    else:\n        c()\n",
        );
        let ds = diamonds(&ir);
        assert_eq!(ds.len(), 2);
        // the first diamond's False edge enters the second diamond
        let false_edge = ir
            .edges_from(ds[0].id)
            .find(|e| e.label.as_deref() == Some("False"))
            .unwrap();
        assert_eq!(false_edge.to, ds[1].id);
        assert!(ir.validate().is_ok());
    }

    #[test]
    fn while_loop_has_back_edge_and_single_exit_path() {
        let ir = build("def f(n):\n    while n > 0:\n        n -= 1\n    done()\n");
        let header = diamonds(&ir)[0];
        // back edge from body to header
        assert!(ir.edges_to(header.id).count() >= 2);
        let false_edge = ir
            .edges_from(header.id)
            .find(|e| e.label.as_deref() == Some("False"))
            .unwrap();
        let exit_node = ir.node(false_edge.to).unwrap();
        assert_eq!(exit_node.style.as_deref(), Some("loop-exit"));
        // the loop exit is the only way to done()
        let done = ir.nodes.iter().find(|n| n.label == "done()").unwrap();
        let incoming: Vec<_> = ir.edges_to(done.id).collect();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].from, exit_node.id);
    }

    #[test]
    fn break_targets_loop_exit_and_continue_targets_header() {
        let ir = build(
            "def f(xs):\n    for x in xs:\n        if x < 0:\n            continue\n        if x > 9:\n            break\n        use(x)\n",
        );
        assert!(ir.validate().is_ok());
        let header = diamonds(&ir)
            .into_iter()
            .find(|n| n.label.contains("in xs"))
            .unwrap();
        let exit_id = ir
            .edges_from(header.id)
            .find(|e| e.label.as_deref() == Some("exhausted"))
            .unwrap()
            .to;
        let brk = ir.nodes.iter().find(|n| n.label == "break").unwrap();
        let cont = ir.nodes.iter().find(|n| n.label == "continue").unwrap();
        assert!(ir.edges.iter().any(|e| e.from == brk.id && e.to == exit_id));
        assert!(ir
            .edges
            .iter()
            .any(|e| e.from == cont.id && e.to == header.id));
        // a jump node never has a second outgoing edge
        assert_eq!(ir.edges_from(brk.id).count(), 1);
        assert_eq!(ir.edges_from(cont.id).count(), 1);
    }

    #[test]
    fn break_inside_match_still_exits_the_loop() {
        let ir = build(
            "def f(x):\n    while True:\n        match x:\n            case 0:\n                break\n            case _:\n                step()\n",
        );
        assert!(ir.validate().is_ok());
        let brk = ir.nodes.iter().find(|n| n.label == "break").unwrap();
        let target = ir.edges_from(brk.id).next().unwrap().to;
        let target = ir.nodes.iter().find(|n| n.id == target).unwrap();
        assert_eq!(target.style.as_deref(), Some("loop-exit"));
        // match never synthesizes its own break junction
        assert!(ir
            .nodes
            .iter()
            .all(|n| n.style.as_deref() != Some("switch-exit")));
    }

    #[test]
    fn if_return_without_else_false_edge_reaches_end() {
        let ir = build("def f(c):\n    if c:\n        return 1\n");
        assert_eq!(diamonds(&ir).len(), 1);
        let d = diamonds(&ir)[0];
        let false_edge = ir
            .edges_from(d.id)
            .find(|e| e.label.as_deref() == Some("False"))
            .unwrap();
        assert_eq!(false_edge.to, ir.exit);
        let ret = ir
            .nodes
            .iter()
            .find(|n| n.label.starts_with("return"))
            .unwrap();
        let out: Vec<_> = ir.edges_from(ret.id).collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, ir.exit);
    }

    #[test]
    fn return_wires_to_exit_not_to_next_statement() {
        let ir = build("def f(x):\n    if x:\n        return 1\n    cleanup()\n");
        let ret = ir
            .nodes
            .iter()
            .find(|n| n.label.starts_with("return"))
            .unwrap();
        let outgoing: Vec<_> = ir.edges_from(ret.id).collect();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].to, ir.exit);
    }

    #[test]
    fn try_finally_intercepts_early_return() {
        let ir = build(
            "def f():\n    try:\n        return acquire()\n    finally:\n        release()\n",
        );
        let ret = ir
            .nodes
            .iter()
            .find(|n| n.label.starts_with("return"))
            .unwrap();
        let release = ir
            .nodes
            .iter()
            .find(|n| n.label == "release()")
            .unwrap();
        let out: Vec<_> = ir.edges_from(ret.id).collect();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to, release.id);
        // the finally body flows on to End
        assert!(ir.edges.iter().any(|e| e.from == release.id && e.to == ir.exit));
    }

    #[test]
    fn except_clause_hangs_off_try_header() {
        let ir = build(
            "def f():\n    try:\n        risky()\n    except ValueError:\n        recover()\n",
        );
        let try_node = ir.nodes.iter().find(|n| n.label == "try").unwrap();
        let handler = ir
            .nodes
            .iter()
            .find(|n| n.label == "except ValueError")
            .unwrap();
        let exc_edge = ir
            .edges
            .iter()
            .find(|e| e.from == try_node.id && e.to == handler.id)
            .unwrap();
        assert_eq!(exc_edge.label.as_deref(), Some("exception"));
        assert!(ir.validate().is_ok());
    }

    #[test]
    fn node_cap_truncates_with_marker() {
        let body: String = (0..50).map(|i| format!("    step_{i}()\n")).collect();
        let source = format!("def f():\n{body}");
        let ir = build_with_config(
            &source,
            EngineConfig {
                max_nodes: 10,
                ..EngineConfig::default()
            },
        );
        assert!(ir.truncated);
        assert!(ir.validate().is_ok());
        let marker = ir
            .nodes
            .iter()
            .find(|n| n.style.as_deref() == Some("truncated"))
            .unwrap();
        assert_eq!(marker.label, "... (truncated)");
        assert_eq!(
            ir.nodes
                .iter()
                .filter(|n| n.style.as_deref() == Some("truncated"))
                .count(),
            1
        );
        assert!(ir.nodes.len() <= 13);
    }

    #[test]
    fn depth_cap_truncates_deep_nesting() {
        let mut source = String::from("def f(x):\n");
        let mut indent = String::from("    ");
        for _ in 0..40 {
            source.push_str(&format!("{indent}if x:\n"));
            indent.push_str("    ");
        }
        source.push_str(&format!("{indent}leaf()\n"));
        let ir = build_with_config(
            &source,
            EngineConfig {
                max_depth: 20,
                ..EngineConfig::default()
            },
        );
        assert!(ir.truncated);
        assert!(ir.validate().is_ok());
    }

    #[test]
    fn repeated_builds_are_identical() {
        let source =
            "def f(xs):\n    for x in xs:\n        if x:\n            emit(x)\n    return len(xs)\n";
        assert_eq!(build(source), build(source));
    }

    #[test]
    fn long_labels_are_elided() {
        let call = format!("compute({})", "x, ".repeat(60));
        let ir = build(&format!("def f(x):\n    {call}\n"));
        let node = ir
            .nodes
            .iter()
            .find(|n| n.label.starts_with("compute"))
            .unwrap();
        assert!(node.label.chars().count() <= 64);
        assert!(node.label.ends_with("..."));
    }

    #[test]
    fn location_map_covers_statements() {
        let source = "def f(x):\n    if x:\n        a()\n";
        let ir = build(source);
        let offset = source.find("a()").unwrap() as u32;
        let hit = ir.node_at(offset).unwrap();
        assert_eq!(ir.node(hit).unwrap().label, "a()");
    }
}
