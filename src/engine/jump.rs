//! Abrupt transfers: return, throw, break, continue, goto.
//!
//! Each produces a node that is wired to its target immediately and
//! returns no exit points, so nothing downstream chains onto it. A
//! pending `finally` region intercepts all of them.

use super::{FlowContext, FunctionBuilder};
use crate::adapter::StatementKind;
use crate::ir::{FlowchartEdge, NodeShape, ProcessResult};
use tracing::trace;
use tree_sitter::Node;

impl FunctionBuilder<'_> {
    pub(crate) fn process_jump(
        &mut self,
        kind: StatementKind,
        node: Node,
        ctx: FlowContext,
    ) -> ProcessResult {
        let label = self.label_text(node);
        match kind {
            StatementKind::Return => {
                let n = self.make_node(label, NodeShape::Stadium, Some(node));
                let edge = FlowchartEdge::unconditional(n.id, ctx.unwind_target());
                ProcessResult::terminal(n, edge)
            }
            StatementKind::Throw => {
                let n = self
                    .make_node(label, NodeShape::Stadium, Some(node))
                    .with_style("throw");
                let edge = FlowchartEdge::unconditional(n.id, ctx.unwind_target());
                ProcessResult::terminal(n, edge)
            }
            // Label resolution across the function is out of scope;
            // goto is rendered as an early exit through the unwind path.
            StatementKind::Goto => {
                let n = self.make_node(label, NodeShape::Rect, Some(node));
                let edge = FlowchartEdge::unconditional(n.id, ctx.unwind_target());
                ProcessResult::terminal(n, edge)
            }
            StatementKind::Break => match ctx.loop_ctx {
                Some(lc) => {
                    let n = self.make_node(label, NodeShape::Rect, Some(node));
                    let target = ctx.through_finally(lc.break_target);
                    let edge = FlowchartEdge::unconditional(n.id, target);
                    ProcessResult::terminal(n, edge)
                }
                None => {
                    trace!("break outside loop or switch, keeping as plain node");
                    self.opaque_statement(node)
                }
            },
            StatementKind::Continue => match ctx.loop_ctx.and_then(|lc| lc.continue_target) {
                Some(target) => {
                    let n = self.make_node(label, NodeShape::Rect, Some(node));
                    let target = ctx.through_finally(target);
                    let edge = FlowchartEdge::unconditional(n.id, target);
                    ProcessResult::terminal(n, edge)
                }
                None => {
                    trace!("continue outside loop, keeping as plain node");
                    self.opaque_statement(node)
                }
            },
            _ => unreachable!("process_jump called with non-jump kind"),
        }
    }
}
