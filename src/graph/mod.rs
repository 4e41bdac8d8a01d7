pub mod cycles;
pub mod dot;
pub mod types;

pub use cycles::{CycleReport, mark_cycles};
pub use dot::GraphSerializer;
pub use types::{DependencyGraph, EdgeInfo};
