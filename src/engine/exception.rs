//! try / catch / finally regions.
//!
//! The try body is treated as a single fallible unit: one `exception`
//! edge per handler leaves the try header, not every statement inside.
//! The finally body is built first so that jumps inside the protected
//! code already have its entry as their unwind target; the finally
//! body itself runs under the surrounding context, never under its
//! own, so it cannot reroute into itself.

use super::{FinallyContext, FlowContext, FunctionBuilder};
use crate::ir::{ExitPoint, FlowchartEdge, NodeShape, ProcessResult};
use tree_sitter::Node;

impl FunctionBuilder<'_> {
    pub(crate) fn process_try(&mut self, node: Node, ctx: FlowContext) -> ProcessResult {
        let catches = self.adapter.catch_clauses(node);
        let finally_body = self.adapter.finally_body(node);

        // No handlers and no finally: nothing to model, flatten.
        if catches.is_empty() && finally_body.is_none() {
            return match self.adapter.try_body(node) {
                Some(b) => self.process_statement(b, ctx),
                None => ProcessResult::empty(),
            };
        }

        let finally_result = finally_body.map(|b| self.process_statement(b, ctx));
        let finally_entry = finally_result.as_ref().and_then(|r| r.entry);
        let inner_ctx = match finally_entry {
            Some(id) => ctx.with_finally(FinallyContext { finally_entry: id }),
            None => ctx,
        };

        let try_header = self.make_node("try", NodeShape::Round, Some(node));
        let try_id = try_header.id;
        let mut out = ProcessResult {
            entry: Some(try_id),
            nodes: vec![try_header],
            ..Default::default()
        };

        // Normal-completion flows of the body and every handler; all of
        // them converge on the finally entry (or become our exits).
        let mut completions: Vec<ExitPoint> = Vec::new();

        let body = self
            .adapter
            .try_body(node)
            .map(|b| self.process_statement(b, inner_ctx));
        match body {
            Some(body) if body.entry.is_some() => {
                if let Some(entry) = body.entry {
                    out.edges.push(FlowchartEdge::unconditional(try_id, entry));
                }
                completions.extend(Self::exit_points_of(&body));
                out.absorb(body);
            }
            _ => completions.push(ExitPoint::new(try_id)),
        }

        for clause in catches {
            let label = self.adapter.catch_label(clause, self.source);
            let handler = self.make_node(label, NodeShape::Round, Some(clause));
            let handler_id = handler.id;
            out.nodes.push(handler);
            out.edges
                .push(FlowchartEdge::labeled(try_id, handler_id, "exception"));

            let handler_body = self
                .adapter
                .catch_body(clause)
                .map(|b| self.process_statement(b, inner_ctx));
            match handler_body {
                Some(body) if body.entry.is_some() => {
                    if let Some(entry) = body.entry {
                        out.edges
                            .push(FlowchartEdge::unconditional(handler_id, entry));
                    }
                    completions.extend(Self::exit_points_of(&body));
                    out.absorb(body);
                }
                _ => completions.push(ExitPoint::new(handler_id)),
            }
        }

        match (finally_result, finally_entry) {
            (Some(mut finally), Some(entry)) => {
                for ep in completions {
                    out.edges.push(FlowchartEdge {
                        from: ep.id,
                        to: entry,
                        label: ep.label,
                    });
                }
                let exits = std::mem::take(&mut finally.exit_points);
                out.absorb(finally);
                out.exit_points = exits;
            }
            // Absent (or empty) finally: completions are the region's
            // own exits.
            _ => out.exit_points = completions,
        }
        out
    }
}
