pub mod imports;
pub mod manifest;

pub use imports::{DynamicEdgeCollector, SourceFileSet};
pub use manifest::ManifestEdgeCollector;
