use std::collections::HashMap;
use std::path::Path;

use miette::{NamedSource, Result, SourceSpan};
use serde::Deserialize;

use crate::error::DepvizError;

/// A package manifest (`package.json`), reduced to the fields the graph
/// pipeline cares about: the package name, the workspace member patterns, and
/// the dependency lists by kind. Dependency values (version ranges, protocol
/// specifiers) are kept opaque since only the declared names matter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub workspaces: Option<WorkspacesField>,
    pub dependencies: Option<HashMap<String, serde_json::Value>>,
    #[serde(rename = "devDependencies")]
    pub dev_dependencies: Option<HashMap<String, serde_json::Value>>,
    #[serde(rename = "optionalDependencies")]
    pub optional_dependencies: Option<HashMap<String, serde_json::Value>>,
}

/// The `workspaces` field comes in two shapes: a flat list of glob patterns,
/// or an object with a `packages` key (yarn style).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WorkspacesField {
    Patterns(Vec<String>),
    Config { packages: Vec<String> },
}

impl WorkspacesField {
    pub fn patterns(&self) -> &[String] {
        match self {
            Self::Patterns(p) => p,
            Self::Config { packages } => packages,
        }
    }
}

impl PackageManifest {
    pub fn parse_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DepvizError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let manifest = serde_json::from_str(&content).map_err(|e| {
            let span = span_for_error(&content, &e);

            DepvizError::ManifestParseError(Box::new(crate::error::ManifestParseError {
                file: path.display().to_string(),
                source_code: NamedSource::new(path.display().to_string(), content.clone()),
                span,
                source: e,
            }))
        })?;

        Ok(manifest)
    }

    pub fn is_workspace_root(&self) -> bool {
        self.workspaces.is_some()
    }

    pub fn workspace_patterns(&self) -> Vec<String> {
        self.workspaces
            .as_ref()
            .map(|ws| ws.patterns().to_vec())
            .unwrap_or_default()
    }

    /// All declared dependency names, paired with the manifest list they came
    /// from.
    pub fn declared_dependencies(&self) -> Vec<(&str, SourceKind)> {
        let mut all_deps = Vec::new();

        let lists = [
            (&self.dependencies, SourceKind::Runtime),
            (&self.dev_dependencies, SourceKind::Development),
            (&self.optional_dependencies, SourceKind::Optional),
        ];

        for (list, kind) in lists {
            if let Some(deps) = list {
                for name in deps.keys() {
                    all_deps.push((name.as_str(), kind));
                }
            }
        }

        all_deps
    }
}

/// Convert the line/column position reported by serde_json into a byte span
/// for miette's source labeling.
fn span_for_error(content: &str, error: &serde_json::Error) -> Option<SourceSpan> {
    if error.line() == 0 {
        return None;
    }

    let line_start: usize = content
        .split_inclusive('\n')
        .take(error.line() - 1)
        .map(str::len)
        .sum();
    let offset = line_start + error.column().saturating_sub(1);

    Some(SourceSpan::new(offset.min(content.len()).into(), 1))
}

/// Where an edge was discovered: one of the manifest dependency lists, or
/// static source analysis of wildcard and directory imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Runtime,
    Development,
    Optional,
    Dynamic,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Runtime => write!(f, "runtime"),
            SourceKind::Development => write!(f, "development"),
            SourceKind::Optional => write!(f, "optional"),
            SourceKind::Dynamic => write!(f, "dynamic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_parse_workspace_root() {
        let json_content = r#"
{
  "name": "monorepo",
  "private": true,
  "workspaces": ["packages/*", "tools/build"]
}
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json_content.as_bytes()).unwrap();

        let manifest = PackageManifest::parse_file(file.path()).unwrap();

        assert!(manifest.is_workspace_root());
        assert_eq!(
            manifest.workspace_patterns(),
            vec!["packages/*", "tools/build"]
        );
    }

    #[test]
    fn test_parse_yarn_style_workspaces() {
        let json_content = r#"
{
  "name": "monorepo",
  "workspaces": { "packages": ["packages/*"] }
}
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json_content.as_bytes()).unwrap();

        let manifest = PackageManifest::parse_file(file.path()).unwrap();
        assert_eq!(manifest.workspace_patterns(), vec!["packages/*"]);
    }

    #[test]
    fn test_parse_package_with_dependencies() {
        let json_content = r#"
{
  "name": "@scope/web",
  "dependencies": {
    "@scope/core": "workspace:*",
    "react": "^18.0.0"
  },
  "devDependencies": {
    "@scope/test-utils": "workspace:*"
  },
  "optionalDependencies": {
    "fsevents": "^2.3.0"
  }
}
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json_content.as_bytes()).unwrap();

        let manifest = PackageManifest::parse_file(file.path()).unwrap();

        assert!(!manifest.is_workspace_root());
        assert_eq!(manifest.name.as_deref(), Some("@scope/web"));

        let mut deps = manifest.declared_dependencies();
        deps.sort();
        assert_eq!(
            deps,
            vec![
                ("@scope/core", SourceKind::Runtime),
                ("@scope/test-utils", SourceKind::Development),
                ("fsevents", SourceKind::Optional),
                ("react", SourceKind::Runtime),
            ]
        );
    }

    #[test]
    fn test_parse_invalid_json_reports_span() {
        let json_content = "{\n  \"name\": oops\n}\n";

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json_content.as_bytes()).unwrap();

        let err = PackageManifest::parse_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON syntax"));
    }

    #[test]
    fn test_source_kind_display() {
        assert_eq!(SourceKind::Runtime.to_string(), "runtime");
        assert_eq!(SourceKind::Development.to_string(), "development");
        assert_eq!(SourceKind::Optional.to_string(), "optional");
        assert_eq!(SourceKind::Dynamic.to_string(), "dynamic");
    }
}
