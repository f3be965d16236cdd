//! Call-level flow: higher-order iteration methods and promise chains.
//!
//! `xs.map(f)` and friends are really loops, and `p.then().catch()`
//! chains are really branching flows; both get small dedicated
//! subgraphs instead of one opaque node.

use super::FunctionBuilder;
use crate::ir::{ExitPoint, FlowchartEdge, NodeId, NodeShape, ProcessResult};
use rustc_hash::FxHashSet;
use tree_sitter::Node;

#[derive(Clone, Copy)]
enum LinkKind {
    Then,
    Catch,
    Finally,
}

struct ChainLink<'t> {
    kind: LinkKind,
    callback: Option<Node<'t>>,
    call: Node<'t>,
}

struct HofCall<'t> {
    method: String,
    receiver: String,
    callback: Option<Node<'t>>,
    call: Node<'t>,
}

impl FunctionBuilder<'_> {
    /// Statement not matched by any structural kind: try to recognize
    /// a promise chain or an iteration method, else emit one opaque
    /// process node.
    pub(crate) fn process_expression(&mut self, node: Node) -> ProcessResult {
        if let Some(call) = self.adapter.call_node(node) {
            if self.adapter.has_promise_chains() {
                if let Some((root, links)) = self.promise_chain(call) {
                    return self.build_promise_chain(root, links);
                }
            }
            if let Some(hof) = self.hof_call(call) {
                return self.build_hof(hof);
            }
        }
        self.opaque_statement(node)
    }

    fn hof_call<'t>(&self, call: Node<'t>) -> Option<HofCall<'t>> {
        let names = self.adapter.hof_method_names();
        if names.is_empty() {
            return None;
        }
        let method_node = self.adapter.method_name(call)?;
        let method = self.node_text(method_node);
        if !names.contains(&method) {
            return None;
        }
        let receiver = self
            .adapter
            .call_receiver(call)
            .map(|n| self.label_text(n))
            .unwrap_or_else(|| "items".to_string());
        let callback = call
            .child_by_field_name("arguments")
            .and_then(|args| args.named_child(0));
        Some(HofCall {
            method: method.to_string(),
            receiver,
            callback,
            call,
        })
    }

    /// Iteration-method call as a three-node loop: header decision,
    /// callback application with a back edge, result node.
    fn build_hof(&mut self, hof: HofCall) -> ProcessResult {
        let header = self.make_node(
            format!("for each in {}", hof.receiver),
            NodeShape::Diamond,
            Some(hof.call),
        );
        let header_id = header.id;
        let callback_label = hof
            .callback
            .map(|c| self.label_text(c))
            .unwrap_or_else(|| "fn".to_string());
        let apply = self.make_node(
            format!("{}: {}", hof.method, callback_label),
            NodeShape::Rect,
            hof.callback,
        );
        let apply_id = apply.id;
        let done = self.make_node(format!("{} result", hof.method), NodeShape::Rect, None);
        let done_id = done.id;

        ProcessResult {
            nodes: vec![header, apply, done],
            edges: vec![
                FlowchartEdge::labeled(header_id, apply_id, "iterate"),
                FlowchartEdge::unconditional(apply_id, header_id),
                FlowchartEdge::labeled(header_id, done_id, "exhausted"),
            ],
            entry: Some(header_id),
            exit_points: vec![ExitPoint::new(done_id)],
            connected: FxHashSet::default(),
        }
    }

    /// Walk a `.then/.catch/.finally` chain inward to its producer.
    /// Returns the producer node and the links in execution order.
    fn promise_chain<'t>(&self, call: Node<'t>) -> Option<(Node<'t>, Vec<ChainLink<'t>>)> {
        let mut links = Vec::new();
        let mut cur = call;
        let root = loop {
            let kind = match self
                .adapter
                .method_name(cur)
                .map(|m| self.node_text(m))
            {
                Some("then") => LinkKind::Then,
                Some("catch") => LinkKind::Catch,
                Some("finally") => LinkKind::Finally,
                _ => break cur,
            };
            let callback = cur
                .child_by_field_name("arguments")
                .and_then(|args| args.named_child(0));
            links.push(ChainLink {
                kind,
                callback,
                call: cur,
            });
            match self.adapter.call_receiver(cur) {
                Some(r) if r.kind() == "call_expression" => cur = r,
                Some(r) => break r,
                None => break cur,
            }
        };
        if links.is_empty() {
            return None;
        }
        links.reverse();
        Some((root, links))
    }

    /// Flatten a promise chain. A fulfilled set and a rejection set
    /// move forward through the links: `.then` advances the fulfilled
    /// path and can itself reject, `.catch` consumes every accumulated
    /// rejection source and rejoins the fulfilled path, `.finally`
    /// collects both. Rejections never consumed by a `.catch` are left
    /// unwired, mirroring an unhandled rejection in the source.
    fn build_promise_chain(&mut self, root: Node, links: Vec<ChainLink>) -> ProcessResult {
        let label = self.label_text(root);
        let root_node = self.make_node(label, NodeShape::Rect, Some(root));
        let root_id = root_node.id;
        let mut out = ProcessResult {
            entry: Some(root_id),
            nodes: vec![root_node],
            ..Default::default()
        };
        let mut fulfilled: Vec<NodeId> = vec![root_id];
        let mut rejections: Vec<NodeId> = vec![root_id];

        for link in links {
            let cb = link
                .callback
                .map(|c| self.label_text(c))
                .unwrap_or_default();
            match link.kind {
                LinkKind::Then => {
                    let n = self.make_node(format!(".then {cb}"), NodeShape::Rect, Some(link.call));
                    for f in fulfilled.drain(..) {
                        out.edges.push(FlowchartEdge::labeled(f, n.id, "fulfilled"));
                    }
                    fulfilled.push(n.id);
                    rejections.push(n.id);
                    out.nodes.push(n);
                }
                LinkKind::Catch => {
                    let n =
                        self.make_node(format!(".catch {cb}"), NodeShape::Rect, Some(link.call));
                    for r in rejections.drain(..) {
                        out.edges.push(FlowchartEdge::labeled(r, n.id, "rejected"));
                    }
                    // The catch callback can throw in turn.
                    rejections.push(n.id);
                    fulfilled.push(n.id);
                    out.nodes.push(n);
                }
                LinkKind::Finally => {
                    let n =
                        self.make_node(format!(".finally {cb}"), NodeShape::Rect, Some(link.call));
                    let sources: FxHashSet<NodeId> =
                        fulfilled.drain(..).chain(rejections.drain(..)).collect();
                    let mut sources: Vec<NodeId> = sources.into_iter().collect();
                    sources.sort();
                    for s in sources {
                        out.edges.push(FlowchartEdge::labeled(s, n.id, "settled"));
                    }
                    fulfilled.push(n.id);
                    out.nodes.push(n);
                }
            }
        }

        out.exit_points = fulfilled.into_iter().map(ExitPoint::new).collect();
        out
    }
}
