//! Loop constructs.
//!
//! Every loop allocates its exit node before processing the body, so
//! `break` statements inside have a concrete target to wire to. Exit
//! nodes that end up unreferenced (infinite loops without a `break`)
//! are discarded again.

use super::{FlowContext, FunctionBuilder, LoopContext};
use crate::ir::{ExitPoint, FlowchartEdge, FlowchartNode, NodeShape, ProcessResult};
use tree_sitter::Node;

impl FunctionBuilder<'_> {
    fn loop_exit_node(&mut self) -> FlowchartNode {
        self.junction_node("loop-exit")
    }

    /// Pre-tested loop: condition diamond, `True` into the body, body
    /// exits loop back to the condition, `False` to the exit node.
    pub(crate) fn process_while(&mut self, node: Node, ctx: FlowContext) -> ProcessResult {
        let cond = self.adapter.condition(node);
        let label = self.condition_label(cond);
        let header = self.make_node(label, NodeShape::Diamond, cond.or(Some(node)));
        let header_id = header.id;
        let exit = self.loop_exit_node();
        let exit_id = exit.id;

        let lc = LoopContext {
            break_target: exit_id,
            continue_target: Some(header_id),
        };
        let body = match self.adapter.loop_body(node) {
            Some(b) => self.process_statement(b, ctx.with_loop(lc)),
            None => ProcessResult::empty(),
        };

        let mut out = ProcessResult {
            nodes: vec![header],
            entry: Some(header_id),
            ..Default::default()
        };
        match body.entry {
            Some(entry) => {
                out.edges.push(FlowchartEdge::labeled(header_id, entry, "True"));
                self.wire_exits_to(&body, header_id, &mut out.edges);
            }
            None => out
                .edges
                .push(FlowchartEdge::labeled(header_id, header_id, "True")),
        }
        out.absorb(body);
        out.edges
            .push(FlowchartEdge::labeled(header_id, exit_id, "False"));
        out.nodes.push(exit);
        out.exit_points = vec![ExitPoint::new(exit_id)];
        out
    }

    /// Post-tested loop: control enters the body first, the condition
    /// sits after it with a `True` back edge to the body entry.
    pub(crate) fn process_do_while(&mut self, node: Node, ctx: FlowContext) -> ProcessResult {
        let cond = self.adapter.condition(node);
        let label = self.condition_label(cond);
        let header = self.make_node(label, NodeShape::Diamond, cond.or(Some(node)));
        let header_id = header.id;
        let exit = self.loop_exit_node();
        let exit_id = exit.id;

        let lc = LoopContext {
            break_target: exit_id,
            continue_target: Some(header_id),
        };
        let body = match self.adapter.loop_body(node) {
            Some(b) => self.process_statement(b, ctx.with_loop(lc)),
            None => ProcessResult::empty(),
        };

        let body_entry = body.entry.unwrap_or(header_id);
        let mut out = ProcessResult {
            entry: Some(body_entry),
            ..Default::default()
        };
        self.wire_exits_to(&body, header_id, &mut out.edges);
        out.absorb(body);
        out.nodes.push(header);
        out.edges
            .push(FlowchartEdge::labeled(header_id, body_entry, "True"));
        out.edges
            .push(FlowchartEdge::labeled(header_id, exit_id, "False"));
        out.nodes.push(exit);
        out.exit_points = vec![ExitPoint::new(exit_id)];
        out
    }

    /// C-style `for`: optional init feeds the condition, the update (or
    /// the condition when there is none) is the `continue` target, and
    /// a missing condition makes the loop infinite apart from `break`.
    pub(crate) fn process_counted(&mut self, node: Node, ctx: FlowContext) -> ProcessResult {
        let init = self.adapter.loop_init(node).map(|n| {
            let label = self.label_text(n);
            self.make_node(label, NodeShape::Rect, Some(n))
        });
        let cond = self.adapter.loop_condition(node);
        let header_label = match cond {
            Some(c) => self.label_text(c),
            None => "loop".to_string(),
        };
        let header = self.make_node(header_label, NodeShape::Diamond, cond.or(Some(node)));
        let header_id = header.id;
        let update = self.adapter.loop_update(node).map(|n| {
            let label = self.label_text(n);
            self.make_node(label, NodeShape::Rect, Some(n))
        });
        let exit = self.loop_exit_node();
        let exit_id = exit.id;

        let continue_target = update.as_ref().map(|u| u.id).unwrap_or(header_id);
        let lc = LoopContext {
            break_target: exit_id,
            continue_target: Some(continue_target),
        };
        let body = match self.adapter.loop_body(node) {
            Some(b) => self.process_statement(b, ctx.with_loop(lc)),
            None => ProcessResult::empty(),
        };

        let mut out = ProcessResult {
            entry: Some(header_id),
            nodes: vec![header],
            ..Default::default()
        };
        if let Some(init) = init {
            out.entry = Some(init.id);
            out.edges
                .push(FlowchartEdge::unconditional(init.id, header_id));
            out.nodes.insert(0, init);
        }
        let iterate_label = cond.map(|_| "True");
        match body.entry {
            Some(entry) => {
                out.edges.push(FlowchartEdge {
                    from: header_id,
                    to: entry,
                    label: iterate_label.map(String::from),
                });
                self.wire_exits_to(&body, continue_target, &mut out.edges);
            }
            None => out.edges.push(FlowchartEdge {
                from: header_id,
                to: continue_target,
                label: iterate_label.map(String::from),
            }),
        }
        if let Some(update) = update {
            out.edges
                .push(FlowchartEdge::unconditional(update.id, header_id));
            out.nodes.push(update);
        }
        out.absorb(body);

        if cond.is_some() {
            out.edges
                .push(FlowchartEdge::labeled(header_id, exit_id, "False"));
            out.nodes.push(exit);
            out.exit_points = vec![ExitPoint::new(exit_id)];
        } else {
            self.keep_exit_if_referenced(&mut out, exit);
        }
        out
    }

    /// Iterator loop: the header asks "more items?", `iterate` enters
    /// the body, `exhausted` leaves.
    pub(crate) fn process_for_each(&mut self, node: Node, ctx: FlowContext) -> ProcessResult {
        let label = self.adapter.iterator_header(node, self.source);
        let header = self.make_node(label, NodeShape::Diamond, Some(node));
        let header_id = header.id;
        let exit = self.loop_exit_node();
        let exit_id = exit.id;

        let lc = LoopContext {
            break_target: exit_id,
            continue_target: Some(header_id),
        };
        let body = match self.adapter.loop_body(node) {
            Some(b) => self.process_statement(b, ctx.with_loop(lc)),
            None => ProcessResult::empty(),
        };

        let mut out = ProcessResult {
            entry: Some(header_id),
            nodes: vec![header],
            ..Default::default()
        };
        match body.entry {
            Some(entry) => {
                out.edges
                    .push(FlowchartEdge::labeled(header_id, entry, "iterate"));
                self.wire_exits_to(&body, header_id, &mut out.edges);
            }
            None => out
                .edges
                .push(FlowchartEdge::labeled(header_id, header_id, "iterate")),
        }
        out.absorb(body);
        out.edges
            .push(FlowchartEdge::labeled(header_id, exit_id, "exhausted"));
        out.nodes.push(exit);
        out.exit_points = vec![ExitPoint::new(exit_id)];
        out
    }

    /// Condition-less loop (`loop`, `for {}`). The only way out is a
    /// `break`; without one the construct contributes no exit points
    /// and everything after it is unreachable from it.
    pub(crate) fn process_infinite(&mut self, node: Node, ctx: FlowContext) -> ProcessResult {
        let header = self.make_node("loop", NodeShape::Round, Some(node));
        let header_id = header.id;
        let exit = self.loop_exit_node();
        let exit_id = exit.id;

        let lc = LoopContext {
            break_target: exit_id,
            continue_target: Some(header_id),
        };
        let body = match self.adapter.loop_body(node) {
            Some(b) => self.process_statement(b, ctx.with_loop(lc)),
            None => ProcessResult::empty(),
        };

        let mut out = ProcessResult {
            entry: Some(header_id),
            nodes: vec![header],
            ..Default::default()
        };
        match body.entry {
            Some(entry) => {
                out.edges
                    .push(FlowchartEdge::unconditional(header_id, entry));
                self.wire_exits_to(&body, header_id, &mut out.edges);
            }
            None => out
                .edges
                .push(FlowchartEdge::unconditional(header_id, header_id)),
        }
        out.absorb(body);
        self.keep_exit_if_referenced(&mut out, exit);
        out
    }

    /// Keep a pre-allocated loop exit node only when a `break` inside
    /// the body actually targeted it.
    fn keep_exit_if_referenced(&self, out: &mut ProcessResult, exit: FlowchartNode) {
        if out.edges.iter().any(|e| e.to == exit.id) {
            out.exit_points = vec![ExitPoint::new(exit.id)];
            out.nodes.push(exit);
        } else {
            out.exit_points.clear();
        }
    }
}
