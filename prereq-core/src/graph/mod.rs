//! Revealed-graph state and the engine that drives it.

pub mod engine;
pub mod state;

pub use engine::PrereqGraph;
pub use state::{EdgeKey, GraphEdge, GraphNode, GraphState, HIGHLIGHT_MS, OpContext};
