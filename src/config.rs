use std::path::PathBuf;

use crate::cli::Cli;

/// Resolved options for a pipeline run.
///
/// A relative output file resolves against the workspace root, not the
/// process working directory, so `depviz -p some/repo -o graph.svg` writes
/// `some/repo/graph.svg`. Extensions are trimmed and lowercased.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub root: PathBuf,
    pub output: PathBuf,
    pub extensions: Vec<String>,
    pub bundler_imports: bool,
    pub allow_parse_error: bool,
}

impl From<Cli> for PipelineOptions {
    fn from(cli: Cli) -> Self {
        let output = if cli.output.is_absolute() {
            cli.output
        } else {
            cli.path.join(&cli.output)
        };

        let extensions = cli
            .extensions
            .iter()
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Self {
            root: cli.path,
            output,
            extensions,
            bundler_imports: cli.bundler_imports,
            allow_parse_error: cli.allow_parse_error,
        }
    }
}
