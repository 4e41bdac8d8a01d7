use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "depviz",
    about = "Render a workspace package dependency graph",
    long_about = "depviz analyzes an npm-style multi-package workspace, builds a dependency \
                  graph between the workspace's own packages from their manifests (and \
                  optionally from static analysis of wildcard and require.context imports), \
                  highlights dependency cycles, and renders the graph with Graphviz. The exit \
                  code equals the number of cycles found.",
    version
)]
pub struct Cli {
    /// Workspace root directory
    #[arg(short, long, default_value = ".", env = "DEPVIZ_PATH")]
    pub path: PathBuf,

    /// Output image file; the render format is inferred from its extension
    #[arg(short, long, default_value = "dependencies.svg", env = "DEPVIZ_OUTPUT")]
    pub output: PathBuf,

    /// Comma-separated source file extensions to scan
    #[arg(
        long,
        default_value = "js",
        value_delimiter = ',',
        env = "DEPVIZ_EXTENSIONS"
    )]
    pub extensions: Vec<String>,

    /// Also scan sources for wildcard imports and require.context calls
    #[arg(long, env = "DEPVIZ_BUNDLER_IMPORTS")]
    pub bundler_imports: bool,

    /// Downgrade source parse failures to warnings instead of aborting
    #[arg(long, env = "DEPVIZ_ALLOW_PARSE_ERROR")]
    pub allow_parse_error: bool,
}
