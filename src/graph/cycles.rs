//! Cycle discovery and marking
//!
//! Breadth-first expansion from every node, carrying the ancestor path. When
//! a successor already appears among a path's ancestors, the closing edge
//! completes a cycle: every consecutive pair along the trail is flagged, and
//! all trail nodes are retired from further expansion. The cycle count is the
//! number of closing events, not the number of flagged edges.

use std::collections::{HashSet, VecDeque};

use super::types::DependencyGraph;

/// The outcome of cycle marking: one trail per closing event, in discovery
/// order. A trail is the full ancestor path plus the repeated closing node,
/// e.g. `["a", "b", "a"]`.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub trails: Vec<Vec<String>>,
}

impl CycleReport {
    pub fn count(&self) -> usize {
        self.trails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trails.is_empty()
    }
}

/// Find every cycle in `graph`, set the `cycle` flag on each participating
/// edge, and report the discovered trails.
pub fn mark_cycles(graph: &mut DependencyGraph) -> CycleReport {
    let mut queue: VecDeque<(String, Vec<String>)> = graph
        .nodes()
        .map(|name| (name.to_string(), Vec::new()))
        .collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut report = CycleReport::default();

    while let Some((name, ancestors)) = queue.pop_front() {
        if seen.contains(&name) {
            continue;
        }

        let mut extended = ancestors.clone();
        extended.push(name.clone());

        let successors: Vec<String> = graph
            .edges_from(&name)
            .map(|(dep, _)| dep.to_string())
            .collect();

        for dependency in successors {
            if ancestors.contains(&dependency) {
                let mut trail = extended.clone();
                trail.push(dependency);

                for pair in trail.windows(2) {
                    graph.mark_cycle_edge(&pair[0], &pair[1]);
                }
                for node in &trail {
                    seen.insert(node.clone());
                }

                report.trails.push(trail);
            } else if !seen.contains(&dependency) {
                queue.push_back((dependency, extended.clone()));
            }
        }
    }

    report
}
