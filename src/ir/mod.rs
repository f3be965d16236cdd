//! Diagram-oriented intermediate representation.
//!
//! The engine produces a [`FlowchartIR`]: labeled nodes and resolved
//! edges plus a byte-span index used to map source locations back onto
//! nodes. During construction, subgraphs travel as [`ProcessResult`]
//! values whose dangling outward flows are [`ExitPoint`]s; every exit
//! point is resolved to a concrete edge before the IR is returned.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier of a flowchart node, unique within one function's graph.
///
/// Ids are allocated from a monotonically increasing per-build counter,
/// so a given source always yields the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{}", self.0)
    }
}

/// Rendering shape of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeShape {
    /// Ordinary process step.
    #[default]
    Rect,
    /// Decision point (condition, loop header, switch subject).
    Diamond,
    /// Grouping marker (try/catch headers, loop exits).
    Round,
    /// Terminal or suspension point (start, end, return, await).
    Stadium,
}

/// A single node in the flowchart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowchartNode {
    pub id: NodeId,
    pub label: String,
    pub shape: NodeShape,
    /// Optional renderer style class (e.g. `loop-exit`, `truncated`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Source byte span this node was built from, when it has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<(u32, u32)>,
}

impl FlowchartNode {
    pub fn new(id: NodeId, label: impl Into<String>, shape: NodeShape) -> Self {
        FlowchartNode {
            id,
            label: label.into(),
            shape,
            style: None,
            span: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// A resolved, directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowchartEdge {
    pub from: NodeId,
    pub to: NodeId,
    /// Branch label (`True`, `False`, `exception`, a case value, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FlowchartEdge {
    pub fn unconditional(from: NodeId, to: NodeId) -> Self {
        FlowchartEdge {
            from,
            to,
            label: None,
        }
    }

    pub fn labeled(from: NodeId, to: NodeId, label: impl Into<String>) -> Self {
        FlowchartEdge {
            from,
            to,
            label: Some(label.into()),
        }
    }
}

/// A dangling outward flow of a subgraph: "control leaves here, going
/// wherever the surrounding construct decides".
///
/// The label, if any, becomes the label of the edge created when the
/// caller resolves the exit point to a target node.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitPoint {
    pub id: NodeId,
    pub label: Option<String>,
}

impl ExitPoint {
    pub fn new(id: NodeId) -> Self {
        ExitPoint { id, label: None }
    }

    pub fn labeled(id: NodeId, label: impl Into<String>) -> Self {
        ExitPoint {
            id,
            label: Some(label.into()),
        }
    }
}

/// The unit of composition during graph construction.
///
/// Every statement builder returns one of these; sequencing, branching
/// and loop constructs are all expressed by absorbing child results and
/// re-wiring their exit points.
#[derive(Debug, Clone, Default)]
pub struct ProcessResult {
    pub nodes: Vec<FlowchartNode>,
    pub edges: Vec<FlowchartEdge>,
    /// First node control reaches in this subgraph. `None` means the
    /// subgraph is empty and control falls straight through.
    pub entry: Option<NodeId>,
    /// Dangling flows the caller must resolve.
    pub exit_points: Vec<ExitPoint>,
    /// Nodes whose outward flow is already fully wired (jumps). Their
    /// stale exit points, if any leak upward, must not be re-resolved.
    pub connected: FxHashSet<NodeId>,
}

impl ProcessResult {
    pub fn empty() -> Self {
        ProcessResult::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none() && self.nodes.is_empty()
    }

    /// Single-node subgraph: entry and sole (unlabeled) exit point.
    pub fn single(node: FlowchartNode) -> Self {
        let id = node.id;
        ProcessResult {
            nodes: vec![node],
            edges: Vec::new(),
            entry: Some(id),
            exit_points: vec![ExitPoint::new(id)],
            connected: FxHashSet::default(),
        }
    }

    /// Single node whose outward flow is already wired elsewhere
    /// (return, throw, break, continue). No exit points.
    pub fn terminal(node: FlowchartNode, edge: FlowchartEdge) -> Self {
        let id = node.id;
        let mut connected = FxHashSet::default();
        connected.insert(id);
        ProcessResult {
            nodes: vec![node],
            edges: vec![edge],
            entry: Some(id),
            exit_points: Vec::new(),
            connected,
        }
    }

    /// Merge another result's graph material (nodes, edges, connected
    /// set) without touching entry or exit points.
    pub fn absorb(&mut self, other: ProcessResult) {
        self.nodes.extend(other.nodes);
        self.edges.extend(other.edges);
        self.connected.extend(other.connected);
    }

    /// Sequence `next` after this result: the current exit points are
    /// resolved into edges to `next`'s entry, and `next`'s exit points
    /// take over. An empty `next` leaves the current exits in place.
    pub fn chain(&mut self, next: ProcessResult) {
        if let Some(entry) = next.entry {
            if self.entry.is_none() {
                self.entry = Some(entry);
            }
            for ep in self.exit_points.drain(..) {
                self.edges.push(FlowchartEdge {
                    from: ep.id,
                    to: entry,
                    label: ep.label,
                });
            }
            let exits = next.exit_points.clone();
            self.absorb(ProcessResult {
                exit_points: Vec::new(),
                entry: None,
                ..next
            });
            self.exit_points = exits;
        } else {
            self.absorb(next);
        }
    }

    pub fn push_exit(&mut self, ep: ExitPoint) {
        self.exit_points.push(ep);
    }

    /// Exit points not superseded by an already-wired jump.
    pub fn pending_exits(&self) -> impl Iterator<Item = &ExitPoint> {
        self.exit_points
            .iter()
            .filter(|ep| !self.connected.contains(&ep.id))
    }
}

/// Entry in the source-span index: byte range to the node built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEntry {
    pub start: u32,
    pub end: u32,
    pub node: NodeId,
}

/// Structural defects found by [`FlowchartIR::validate`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    #[error("entry node {0} is not in the graph")]
    MissingEntry(NodeId),
    #[error("exit node {0} is not in the graph")]
    MissingExit(NodeId),
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),
    #[error("edge references missing node {0}")]
    DanglingEdge(NodeId),
}

/// Complete flowchart for one function: the engine's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowchartIR {
    pub function_name: String,
    pub nodes: Vec<FlowchartNode>,
    pub edges: Vec<FlowchartEdge>,
    pub entry: NodeId,
    pub exit: NodeId,
    /// Byte-span index for source-to-node lookups, in emission order.
    pub location_map: Vec<LocationEntry>,
    /// Byte range of the whole function definition.
    pub function_range: (u32, u32),
    /// True when a resource cap was hit and the graph ends in a
    /// truncation marker instead of the full body.
    pub truncated: bool,
}

impl FlowchartIR {
    pub fn node(&self, id: NodeId) -> Option<&FlowchartNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edges_from(&self, id: NodeId) -> impl Iterator<Item = &FlowchartEdge> {
        self.edges.iter().filter(move |e| e.from == id)
    }

    pub fn edges_to(&self, id: NodeId) -> impl Iterator<Item = &FlowchartEdge> {
        self.edges.iter().filter(move |e| e.to == id)
    }

    /// Innermost node covering the given source byte offset.
    pub fn node_at(&self, offset: u32) -> Option<NodeId> {
        self.location_map
            .iter()
            .filter(|e| e.start <= offset && offset < e.end)
            .min_by_key(|e| e.end - e.start)
            .map(|e| e.node)
    }

    /// Check structural invariants: unique ids, entry/exit present,
    /// every edge endpoint resolves to a node.
    pub fn validate(&self) -> std::result::Result<(), IrError> {
        let mut ids = FxHashSet::default();
        for node in &self.nodes {
            if !ids.insert(node.id) {
                return Err(IrError::DuplicateNode(node.id));
            }
        }
        if !ids.contains(&self.entry) {
            return Err(IrError::MissingEntry(self.entry));
        }
        if !ids.contains(&self.exit) {
            return Err(IrError::MissingExit(self.exit));
        }
        for edge in &self.edges {
            if !ids.contains(&edge.from) {
                return Err(IrError::DanglingEdge(edge.from));
            }
            if !ids.contains(&edge.to) {
                return Err(IrError::DanglingEdge(edge.to));
            }
        }
        Ok(())
    }
}
