//! prereq-core: interactive course prerequisite graphs.
//!
//! - [`catalog`]: course export decoding, requirement trees, alternative-group extraction
//! - [`graph`]: the revealed graph (open/close/hover with reopen memory) and its engine
//! - [`layout`]: depths, ring angles, relaxation and the frame-chunked layout run
//! - [`output`]: the JSON snapshot handed to the renderer
//!
//! The `wasm` module exposes a [`graph::PrereqGraph`] to JavaScript.

pub mod catalog;
pub mod graph;
pub mod layout;
pub mod output;
mod wasm;

pub use catalog::{Catalog, CatalogError};
pub use graph::PrereqGraph;
pub use layout::LayoutSettings;
pub use output::GraphOutput;
pub use wasm::CourseGraph;
