//! Multi-way dispatch: switch / match and Go's select.

use super::{FlowContext, FunctionBuilder, LoopContext};
use crate::adapter::StatementKind;
use crate::ir::{ExitPoint, FlowchartEdge, NodeShape, ProcessResult};
use tree_sitter::Node;

/// One case clause, normalized by the adapter.
struct CaseShape<'t> {
    label: String,
    is_default: bool,
    statements: Vec<Node<'t>>,
}

impl FunctionBuilder<'_> {
    pub(crate) fn process_switch(&mut self, node: Node, ctx: FlowContext) -> ProcessResult {
        let subject = self.adapter.switch_subject(node);
        let header_label = self.condition_label(subject);
        let cases = self
            .adapter
            .switch_cases(node)
            .into_iter()
            .map(|case| self.case_shape(case))
            .collect();
        self.build_dispatch(
            header_label,
            node,
            cases,
            self.adapter.switch_falls_through(),
            ctx,
        )
    }

    /// `select` is a switch over channel operations: one branch per
    /// communication case, no subject, never any fallthrough.
    pub(crate) fn process_select(&mut self, node: Node, ctx: FlowContext) -> ProcessResult {
        let cases = self
            .adapter
            .switch_cases(node)
            .into_iter()
            .map(|case| self.case_shape(case))
            .collect();
        self.build_dispatch("select".to_string(), node, cases, false, ctx)
    }

    /// Edge labels keep the case's own text where the grammar gives one
    /// (match arms label their wildcard `_`); bare default clauses fall
    /// back to `default`.
    fn case_shape<'t>(&self, case: Node<'t>) -> CaseShape<'t> {
        let is_default = self.adapter.case_is_default(case, self.source);
        let label = match self.adapter.case_value(case, self.source) {
            Some(value) => value,
            None if is_default => "default".to_string(),
            None => "case".to_string(),
        };
        CaseShape {
            label,
            is_default,
            statements: self.adapter.case_statements(case),
        }
    }

    /// Shared dispatch wiring.
    ///
    /// The header diamond fans out one labeled edge per case. Where the
    /// language's switch captures `break`, it targets a synthesized exit
    /// junction (continue, if any, still belongs to the enclosing loop);
    /// in Rust and Python `match` both jumps stay with the enclosing
    /// loop. Fallthrough, whether implicit for the language or via an
    /// explicit marker statement, routes a case's dangling exits into
    /// the next case's entry. A missing default leaves a `no match`
    /// exit on the header.
    fn build_dispatch(
        &mut self,
        header_label: String,
        node: Node,
        cases: Vec<CaseShape>,
        falls_through: bool,
        ctx: FlowContext,
    ) -> ProcessResult {
        let header = self.make_node(header_label, NodeShape::Diamond, Some(node));
        let header_id = header.id;
        let exit = self.junction_node("switch-exit");
        let exit_id = exit.id;

        let case_ctx = if self.adapter.switch_captures_break() {
            ctx.with_loop(LoopContext {
                break_target: exit_id,
                continue_target: ctx.loop_ctx.and_then(|l| l.continue_target),
            })
        } else {
            ctx
        };

        struct Built {
            label: String,
            is_default: bool,
            explicit_fallthrough: bool,
            result: ProcessResult,
        }

        let mut built = Vec::with_capacity(cases.len());
        for case in cases {
            let mut statements = case.statements;
            let explicit_fallthrough = statements
                .last()
                .map(|s| {
                    self.adapter
                        .classify(self.adapter.unwrap_statement(*s), self.source)
                        == StatementKind::Fallthrough
                })
                .unwrap_or(false);
            if explicit_fallthrough {
                statements.pop();
            }
            let result = self.process_block(&statements, case_ctx);
            built.push(Built {
                label: case.label,
                is_default: case.is_default,
                explicit_fallthrough,
                result,
            });
        }

        let entries: Vec<_> = built.iter().map(|b| b.result.entry).collect();
        let mut out = ProcessResult {
            entry: Some(header_id),
            nodes: vec![header],
            ..Default::default()
        };
        let mut has_default = false;
        // Header labels of empty cases waiting for the next case entry
        // (fallthrough languages only).
        let mut pending_labels: Vec<String> = Vec::new();

        for (i, mut b) in built.into_iter().enumerate() {
            has_default |= b.is_default;
            match b.result.entry {
                Some(entry) => {
                    out.edges
                        .push(FlowchartEdge::labeled(header_id, entry, b.label));
                    for label in pending_labels.drain(..) {
                        out.edges
                            .push(FlowchartEdge::labeled(header_id, entry, label));
                    }
                    let next_entry = entries[i + 1..].iter().flatten().next().copied();
                    let routes_on = falls_through || b.explicit_fallthrough;
                    let exits = std::mem::take(&mut b.result.exit_points);
                    match next_entry {
                        Some(next) if routes_on => {
                            for ep in exits {
                                if b.result.connected.contains(&ep.id) {
                                    continue;
                                }
                                out.edges.push(FlowchartEdge {
                                    from: ep.id,
                                    to: next,
                                    label: ep.label,
                                });
                            }
                        }
                        _ => out.exit_points.extend(exits),
                    }
                    out.absorb(b.result);
                }
                None => {
                    out.absorb(b.result);
                    if falls_through {
                        pending_labels.push(b.label);
                    } else {
                        out.push_exit(ExitPoint::labeled(header_id, b.label));
                    }
                }
            }
        }
        for label in pending_labels {
            out.push_exit(ExitPoint::labeled(header_id, label));
        }

        if !has_default {
            out.push_exit(ExitPoint::labeled(header_id, "no match"));
        }
        if out.edges.iter().any(|e| e.to == exit_id) {
            out.nodes.push(exit);
            out.push_exit(ExitPoint::new(exit_id));
        }
        out
    }
}
