//! flowgraph: control-flow graphs for diagram generation.
//!
//! Turns a parsed function body into a flowchart-oriented graph:
//! labeled nodes with rendering shapes, resolved labeled edges, and a
//! source-span index for mapping editor positions back onto nodes.
//! Parsing is tree-sitter based; one generic engine handles every
//! supported language through a per-language [`adapter::LanguageAdapter`].
//!
//! ```no_run
//! use flowgraph::FlowchartGenerator;
//!
//! let source = "def f(x):\n    if x:\n        return 1\n    return 0\n";
//! let ir = FlowchartGenerator::new()
//!     .from_source(source, "python", "f")
//!     .unwrap();
//! assert_eq!(ir.function_name, "f");
//! ```
//!
//! Graph construction never fails: malformed syntax produces a partial
//! graph, unrecognized statements become opaque process nodes, and
//! resource exhaustion ends the graph in a truncation marker. Errors
//! only occur at the [`generator`] boundary (I/O, language detection,
//! parsing, function lookup).

pub mod adapter;
pub mod engine;
pub mod error;
pub mod generator;
pub mod ir;
pub mod lang;
pub mod util;

pub use adapter::{LanguageAdapter, StatementKind};
pub use engine::{EngineConfig, FunctionBuilder};
pub use error::{FlowError, Result};
pub use generator::FlowchartGenerator;
pub use ir::{
    ExitPoint, FlowchartEdge, FlowchartIR, FlowchartNode, LocationEntry, NodeId, NodeShape,
    ProcessResult,
};
