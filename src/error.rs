use std::path::PathBuf;
use std::process::ExitStatus;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
#[error("Invalid JSON syntax in '{file}'")]
#[diagnostic(
    code(depviz::manifest_parse_error),
    help("Check the JSON syntax near the highlighted position")
)]
pub struct ManifestParseError {
    pub file: String,
    #[source_code]
    pub source_code: NamedSource<String>,
    #[label("syntax error here")]
    pub span: Option<SourceSpan>,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Error, Debug, Diagnostic)]
pub enum DepvizError {
    #[error("Failed to read file '{}'", path.display())]
    #[diagnostic(
        code(depviz::io_error),
        help("Check if the file exists and you have read permissions")
    )]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    ManifestParseError(Box<ManifestParseError>),

    #[error("No readable package manifest in '{}'", dir.display())]
    #[diagnostic(
        code(depviz::manifest_missing),
        help("Every workspace member directory must contain a package.json with a \"name\" field")
    )]
    ManifestMissing { dir: PathBuf },

    #[error("Failed to parse source file '{}' at line {line}, column {column}", path.display())]
    #[diagnostic(
        code(depviz::parse_failure),
        help("Fix the syntax error, or pass --allow-parse-error to skip unparseable files")
    )]
    ParseFailure {
        path: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("Failed to spawn the 'dot' renderer")]
    #[diagnostic(
        code(depviz::renderer_unavailable),
        help("Graphviz must be installed and 'dot' must be on your PATH")
    )]
    RendererUnavailable {
        #[source]
        source: std::io::Error,
    },

    #[error("The 'dot' renderer exited with {status}")]
    #[diagnostic(
        code(depviz::renderer_failure),
        help("Run 'dot' manually on the generated graph description to see the full error")
    )]
    RendererFailure { status: ExitStatus },

    #[error("IO error")]
    #[diagnostic(
        code(depviz::io_error),
        help("Check file permissions and disk space")
    )]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(depviz::config_error),
        help("Check your command arguments and configuration")
    )]
    ConfigurationError { message: String },
}
