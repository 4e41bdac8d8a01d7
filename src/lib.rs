//! # depviz - Visualize Workspace Package Dependencies
//!
//! depviz analyzes an npm-style multi-package workspace and renders a directed
//! dependency graph between the workspace's own packages. Edges come from two
//! sources: the dependency lists declared in each package manifest, and
//! (optionally) static analysis of source files for wildcard import
//! declarations and `require.context` directory imports that manifests do not
//! capture. Dependency cycles are detected and highlighted, and the graph is
//! rendered through the external Graphviz `dot` process.
//!
//! ## Main Components
//!
//! - **Workspace**: Discovers the workspace's member packages from the root
//!   manifest's `workspaces` patterns
//! - **Collectors**: Turn manifest declarations and source imports into graph
//!   edges
//! - **Graph**: The dependency graph, cycle marking, and DOT serialization
//! - **Renderer**: Pipes the DOT text to Graphviz
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! use depviz::config::PipelineOptions;
//! use depviz::executor::PipelineExecutor;
//!
//! # fn main() -> miette::Result<()> {
//! let options = PipelineOptions {
//!     root: PathBuf::from("/path/to/monorepo"),
//!     output: PathBuf::from("dependencies.svg"),
//!     extensions: vec!["js".to_string()],
//!     bundler_imports: true,
//!     allow_parse_error: false,
//! };
//!
//! let cycles = PipelineExecutor::execute(&options)?;
//! if cycles > 0 {
//!     eprintln!("Found {cycles} dependency cycles");
//! }
//! # Ok(())
//! # }
//! ```

use std::process::ExitCode;

pub mod cli;
pub mod collector;
pub mod config;
pub mod constants;
pub mod error;
pub mod executor;
pub mod graph;
pub mod index;
pub mod manifest;
pub mod progress;
pub mod render;
pub mod workspace;

/// CLI entry point. On success the exit code equals the number of cycles
/// found, saturating at 255.
pub fn run() -> miette::Result<ExitCode> {
    use clap::Parser;

    use crate::cli::Cli;
    use crate::config::PipelineOptions;
    use crate::executor::PipelineExecutor;

    let cli = Cli::parse();
    let cycles = PipelineExecutor::execute(&PipelineOptions::from(cli))?;

    Ok(ExitCode::from(u8::try_from(cycles).unwrap_or(u8::MAX)))
}
