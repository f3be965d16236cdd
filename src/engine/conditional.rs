//! Conditional statements.

use super::{FlowContext, FunctionBuilder};
use crate::ir::{ExitPoint, FlowchartEdge, NodeId, NodeShape, ProcessResult};
use tree_sitter::Node;

impl FunctionBuilder<'_> {
    /// `if` / `elif` chains. The condition becomes a diamond; each
    /// branch is wired from it with a `True` / `False` edge, and a
    /// missing or empty branch leaves a labeled exit point on the
    /// diamond itself so control falls through to whatever follows.
    pub(crate) fn process_conditional(&mut self, node: Node, ctx: FlowContext) -> ProcessResult {
        let cond = self.adapter.condition(node);
        let label = self.condition_label(cond);
        let diamond = self.make_node(label, NodeShape::Diamond, cond.or(Some(node)));
        let cond_id = diamond.id;

        let mut out = ProcessResult {
            nodes: vec![diamond],
            entry: Some(cond_id),
            ..Default::default()
        };

        match self.adapter.then_branch(node) {
            Some(branch) => {
                let r = self.process_statement(branch, ctx);
                self.attach_branch(&mut out, cond_id, r, "True");
            }
            None => out.push_exit(ExitPoint::labeled(cond_id, "True")),
        }

        // An `else if` arrives here as another Conditional and recurses
        // naturally; adapters whose grammars flatten elif chains hand
        // back the next clause from else_branch.
        match self.adapter.else_branch(node) {
            Some(branch) => {
                let r = self.process_statement(branch, ctx);
                self.attach_branch(&mut out, cond_id, r, "False");
            }
            None => out.push_exit(ExitPoint::labeled(cond_id, "False")),
        }

        out
    }

    /// Wire a branch subgraph from a decision node. An empty branch
    /// collapses to a labeled exit point on the decision itself.
    pub(crate) fn attach_branch(
        &mut self,
        out: &mut ProcessResult,
        from: NodeId,
        mut branch: ProcessResult,
        label: &str,
    ) {
        match branch.entry {
            Some(entry) => {
                out.edges.push(FlowchartEdge::labeled(from, entry, label));
                let exits = std::mem::take(&mut branch.exit_points);
                out.absorb(branch);
                out.exit_points.extend(exits);
            }
            None => {
                out.absorb(branch);
                out.push_exit(ExitPoint::labeled(from, label));
            }
        }
    }
}
