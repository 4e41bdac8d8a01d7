use std::path::{Path, PathBuf};

use miette::{Result, WrapErr};
use rayon::prelude::*;

use crate::error::DepvizError;
use crate::manifest::PackageManifest;

/// A workspace member package: its manifest-declared name, its directory, and
/// the parsed manifest itself.
#[derive(Debug, Clone)]
pub struct PackageInfo {
    pub name: String,
    pub dir: PathBuf,
    pub manifest: PackageManifest,
}

/// Discovers workspace member packages from the root manifest's `workspaces`
/// patterns.
pub struct WorkspaceScanner;

impl WorkspaceScanner {
    /// Scan the workspace rooted at `root` and load every member package.
    ///
    /// The root must contain a manifest with a `workspaces` field; each
    /// expanded member directory must contain a named manifest. Any member
    /// that fails to load aborts the scan.
    pub fn scan(root: &Path) -> Result<Vec<PackageInfo>> {
        let root_manifest_path = root.join("package.json");
        if !root_manifest_path.exists() {
            return Err(DepvizError::ManifestMissing {
                dir: root.to_path_buf(),
            }
            .into());
        }

        let root_manifest = PackageManifest::parse_file(&root_manifest_path)
            .wrap_err_with(|| format!("Failed to load workspace root '{}'", root.display()))?;

        if !root_manifest.is_workspace_root() {
            return Err(DepvizError::ConfigurationError {
                message: format!(
                    "'{}' does not declare any workspaces",
                    root_manifest_path.display()
                ),
            }
            .into());
        }

        let mut member_dirs = Self::expand_members(root, &root_manifest.workspace_patterns());
        member_dirs.sort();
        member_dirs.dedup();

        let mut packages: Vec<PackageInfo> = member_dirs
            .into_par_iter()
            .map(|dir| Self::load_member(&dir))
            .collect::<Result<_>>()?;

        // Sort by name for consistent output
        packages.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(packages)
    }

    fn expand_members(root: &Path, patterns: &[String]) -> Vec<PathBuf> {
        let mut dirs = Vec::new();

        for pattern in patterns {
            if pattern.contains('*') {
                let glob_pattern = root.join(pattern);
                let glob_str = glob_pattern.to_string_lossy();

                match glob::glob(&glob_str) {
                    Ok(paths) => {
                        dirs.extend(paths.flatten().filter(|path| path.is_dir()));
                    }
                    Err(e) => {
                        eprintln!(
                            "{} Invalid workspace pattern '{}': {}",
                            console::style("⚠").yellow(),
                            pattern,
                            e
                        );
                    }
                }
            } else {
                let member_path = root.join(pattern);
                if member_path.is_dir() {
                    dirs.push(member_path);
                }
            }
        }

        dirs
    }

    fn load_member(dir: &Path) -> Result<PackageInfo> {
        let manifest_path = dir.join("package.json");
        if !manifest_path.exists() {
            return Err(DepvizError::ManifestMissing {
                dir: dir.to_path_buf(),
            }
            .into());
        }

        let manifest = PackageManifest::parse_file(&manifest_path)?;

        let Some(name) = manifest.name.clone() else {
            return Err(DepvizError::ManifestMissing {
                dir: dir.to_path_buf(),
            }
            .into());
        };

        Ok(PackageInfo {
            name,
            dir: dir.to_path_buf(),
            manifest,
        })
    }
}
