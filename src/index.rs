use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::workspace::PackageInfo;

/// Maps every workspace package's declared name to its directory, and resolves
/// arbitrary file paths back to their owning package.
///
/// Directories are canonicalized at build time so that symlinked or
/// non-normalized query paths resolve consistently; ownership is decided by
/// path-prefix containment, nearest ancestor first.
#[derive(Debug, Default)]
pub struct PackageIndex {
    dirs: HashMap<PathBuf, String>,
    names: HashSet<String>,
}

impl PackageIndex {
    pub fn build(packages: &[PackageInfo]) -> Self {
        let mut dirs = HashMap::new();
        let mut names = HashSet::new();

        for pkg in packages {
            let canonical = pkg
                .dir
                .canonicalize()
                .unwrap_or_else(|_| pkg.dir.clone());
            dirs.insert(canonical, pkg.name.clone());
            names.insert(pkg.name.clone());
        }

        Self { dirs, names }
    }

    /// Whether `name` is a workspace package.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve a file path to the package whose directory is its nearest
    /// ancestor. Paths outside every package directory, and paths inside a
    /// vendored `node_modules` tree, have no owner.
    pub fn owner_of(&self, path: &Path) -> Option<&str> {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if canonical
            .components()
            .any(|c| c.as_os_str() == "node_modules")
        {
            return None;
        }

        canonical
            .ancestors()
            .find_map(|ancestor| self.dirs.get(ancestor))
            .map(String::as_str)
    }
}
