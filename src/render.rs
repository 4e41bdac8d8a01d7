use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use miette::Result;

use crate::error::DepvizError;

/// Drives the external Graphviz `dot` process.
///
/// The output format is inferred from the output file's extension
/// (`dependencies.svg` renders with `-Tsvg`). The DOT text is streamed to the
/// renderer's stdin; `dot` writes the image itself.
#[derive(Debug)]
pub struct GraphRenderer {
    output: PathBuf,
    format: String,
}

impl GraphRenderer {
    pub fn new(output: &Path) -> Result<Self> {
        let format = output
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| DepvizError::ConfigurationError {
                message: format!(
                    "Cannot infer an output format from '{}' (no file extension)",
                    output.display()
                ),
            })?;

        Ok(Self {
            output: output.to_path_buf(),
            format: format.to_lowercase(),
        })
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Probes for the renderer before any graph work starts, so a missing
    /// installation never discards a completed analysis.
    pub fn ensure_available() -> Result<()> {
        let status = Command::new("dot")
            .arg("-?")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| DepvizError::RendererUnavailable { source: e })?;

        if !status.success() {
            return Err(DepvizError::RendererUnavailable {
                source: std::io::Error::other(format!("'dot -?' exited with {status}")),
            }
            .into());
        }
        Ok(())
    }

    pub fn render(&self, dot_source: &str) -> Result<()> {
        let mut child = Command::new("dot")
            .arg(format!("-T{}", self.format))
            .arg("-o")
            .arg(&self.output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| DepvizError::RendererUnavailable { source: e })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(dot_source.as_bytes())
                .map_err(DepvizError::Io)?;
        }

        let status = child.wait().map_err(DepvizError::Io)?;
        if !status.success() {
            return Err(DepvizError::RendererFailure { status }.into());
        }
        Ok(())
    }
}
