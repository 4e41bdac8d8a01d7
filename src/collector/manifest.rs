use std::sync::Mutex;

use rayon::prelude::*;

use crate::graph::DependencyGraph;
use crate::index::PackageIndex;
use crate::workspace::PackageInfo;

/// Collects edges declared in package manifests.
///
/// For each package, every name listed under `dependencies`, `devDependencies`
/// or `optionalDependencies` that is itself a workspace package becomes an
/// edge tagged with the list it came from. Names pointing outside the
/// workspace (registry packages) are ignored.
pub struct ManifestEdgeCollector<'a> {
    index: &'a PackageIndex,
}

impl<'a> ManifestEdgeCollector<'a> {
    pub fn new(index: &'a PackageIndex) -> Self {
        Self { index }
    }

    pub fn collect(&self, packages: &[PackageInfo], graph: &Mutex<DependencyGraph>) {
        packages.par_iter().for_each(|package| {
            for (dependency, kind) in package.manifest.declared_dependencies() {
                if !self.index.contains(dependency) {
                    continue;
                }

                graph
                    .lock()
                    .expect("graph mutex poisoned")
                    .add_edge(&package.name, dependency, kind);
            }
        });
    }
}
