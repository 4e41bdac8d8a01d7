use std::collections::HashMap;
use std::io::Write;

use miette::Result;

use super::types::DependencyGraph;
use crate::constants::dot as styles;
use crate::error::DepvizError;

// Helper macro for write operations that converts IO errors
macro_rules! writeln_out {
    ($dst:expr) => {
        writeln!($dst).map_err(DepvizError::from)
    };
    ($dst:expr, $($arg:tt)*) => {
        writeln!($dst, $($arg)*).map_err(DepvizError::from)
    };
}

/// Serializes a [`DependencyGraph`] into the Graphviz DOT description consumed
/// by the external renderer.
///
/// Package labels are de-duplicated by stripping the longest common prefix of
/// all package names (so `@scope/foo` under a shared `@scope/` becomes `foo`).
/// Cycle edges get a distinct stroke, purely dynamic edges render dashed, and
/// nodes are colored by their hyphenated name group.
pub struct GraphSerializer;

impl GraphSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn write_dot(&self, graph: &DependencyGraph, output: &mut dyn Write) -> Result<()> {
        let lcp_len = common_prefix_len(graph);
        let label = |name: &str| format!("\"{}\"", &name[lcp_len..]);

        writeln_out!(output, "digraph g {{")?;
        for style in styles::GRAPH_STYLES {
            writeln_out!(output, "  {style}")?;
        }

        for (dependent, dependency, info) in graph.edges() {
            let mut edge_styles: Vec<&str> = Vec::new();
            if info.cycle {
                edge_styles.extend(styles::EDGE_STYLES_CYCLE);
            }
            if info.is_non_production() {
                edge_styles.extend(styles::EDGE_STYLES_NON_PRODUCTION);
            }

            writeln_out!(
                output,
                "  {} -> {} [{}]",
                label(dependent),
                label(dependency),
                edge_styles.join(",")
            )?;
        }

        let colors = assign_group_colors(graph, lcp_len);

        for name in graph.nodes() {
            let mut node_styles: Vec<String> = styles::NODE_STYLES_DEFAULT
                .iter()
                .map(|s| s.to_string())
                .collect();

            let color = colors[&group_prefix(&name[lcp_len..])];
            node_styles.push(format!("fillcolor={color}"));

            if graph.node_in_cycle(name) {
                node_styles.extend(styles::NODE_STYLES_CYCLE.iter().map(|s| s.to_string()));
            }

            writeln_out!(output, "  {} [{}]", label(name), node_styles.join(","))?;
        }

        writeln_out!(output, "}}")?;
        Ok(())
    }
}

impl Default for GraphSerializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Length of the longest common prefix of all package names. A single-node
/// graph keeps its full label.
fn common_prefix_len(graph: &DependencyGraph) -> usize {
    if graph.node_count() < 2 {
        return 0;
    }

    let mut nodes = graph.nodes();
    let first = nodes.next().unwrap_or_default();

    let mut len = nodes.fold(first.len(), |len, name| {
        first
            .bytes()
            .take(len)
            .zip(name.bytes())
            .take_while(|(a, b)| a == b)
            .count()
    });
    // Shared bytes are shared in every name, so a boundary in one is a
    // boundary in all.
    while !first.is_char_boundary(len) {
        len -= 1;
    }
    len
}

/// The grouping key for node coloring: everything up to and including the
/// first hyphen of the prefix-stripped name.
fn group_prefix(stripped: &str) -> String {
    match stripped.split_once('-') {
        Some((head, _)) => format!("{head}-"),
        None => stripped.to_string(),
    }
}

/// Deterministic fill color per group prefix, assigned in node iteration
/// order and cycling through the fixed palette.
fn assign_group_colors(graph: &DependencyGraph, lcp_len: usize) -> HashMap<String, usize> {
    let mut colors = HashMap::new();
    let mut next = 0usize;

    for name in graph.nodes() {
        let prefix = group_prefix(&name[lcp_len..]);
        colors.entry(prefix).or_insert_with(|| {
            let color = (next % styles::NODE_COLOR_SCHEME_SIZE) + 1;
            next += 1;
            color
        });
    }

    colors
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::graph::mark_cycles;
    use crate::manifest::SourceKind;

    fn render(graph: &DependencyGraph) -> String {
        let mut out = Vec::new();
        GraphSerializer::new().write_dot(graph, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_single_runtime_edge() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "b", SourceKind::Runtime);

        let dot = render(&graph);

        assert!(dot.starts_with("digraph g {\n  rankdir=LR\n"));
        assert!(dot.contains("  \"a\" -> \"b\" []\n"));

        let edge_lines = dot.lines().filter(|l| l.contains("->")).count();
        let node_lines = dot
            .lines()
            .filter(|l| !l.contains("->") && l.contains("[shape=box"))
            .count();
        assert_eq!(edge_lines, 1);
        assert_eq!(node_lines, 2);
    }

    #[test]
    fn test_common_prefix_is_stripped() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("@scope/web", "@scope/core", SourceKind::Runtime);

        let dot = render(&graph);

        assert!(dot.contains("\"web\" -> \"core\""));
        assert!(!dot.contains("@scope"));
    }

    #[test]
    fn test_cycle_edges_and_nodes_are_styled() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("pkg-a", "pkg-b", SourceKind::Runtime);
        graph.add_edge("pkg-b", "pkg-a", SourceKind::Runtime);
        mark_cycles(&mut graph);

        let dot = render(&graph);

        assert!(dot.contains("\"a\" -> \"b\" [color=red,penwidth=2]"));
        assert!(dot.contains("\"b\" -> \"a\" [color=red,penwidth=2]"));
        assert!(dot.contains("fillcolor=yellow"));
        assert!(dot.contains("fontcolor=red"));
    }

    #[test]
    fn test_dynamic_only_edges_render_dashed() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "b", SourceKind::Development);

        let dot = render(&graph);

        assert!(dot.contains("\"a\" -> \"b\" [style=dashed]"));
    }

    #[test]
    fn test_group_colors_are_deterministic() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("app-web", "app-core", SourceKind::Runtime);
        graph.add_edge("app-web", "libs-util", SourceKind::Runtime);

        // Iteration order: app-core, app-web, libs-util. The "app-" group is
        // assigned color 1, "libs-" color 2.
        let dot = render(&graph);

        assert!(dot.contains("\"app-core\" [shape=box,style=filled,colorscheme=set312,fontname=Helvetica,fillcolor=1]"));
        assert!(dot.contains("\"app-web\" [shape=box,style=filled,colorscheme=set312,fontname=Helvetica,fillcolor=1]"));
        assert!(dot.contains("\"libs-util\" [shape=box,style=filled,colorscheme=set312,fontname=Helvetica,fillcolor=2]"));
    }

    #[test]
    fn test_palette_wraps_after_twelve_groups() {
        let mut graph = DependencyGraph::new();
        for i in 0..13 {
            graph.ensure_node(&format!("g{i:02}"));
        }

        let colors = assign_group_colors(&graph, 0);
        assert_eq!(colors["g00"], 1);
        assert_eq!(colors["g11"], 12);
        assert_eq!(colors["g12"], 1);
    }

    #[test]
    fn test_single_node_keeps_full_label() {
        let mut graph = DependencyGraph::new();
        graph.ensure_node("only");

        let dot = render(&graph);
        assert!(dot.contains("\"only\" ["));
    }
}
