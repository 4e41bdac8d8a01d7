use std::sync::Mutex;

use console::style;
use miette::{Result, WrapErr};

use crate::collector::{DynamicEdgeCollector, ManifestEdgeCollector};
use crate::config::PipelineOptions;
use crate::graph::{DependencyGraph, GraphSerializer, mark_cycles};
use crate::index::PackageIndex;
use crate::progress::ProgressReporter;
use crate::render::GraphRenderer;
use crate::workspace::WorkspaceScanner;

/// Runs the whole pipeline: scan the workspace, collect edges, mark cycles,
/// serialize to DOT and hand it to the renderer.
pub struct PipelineExecutor;

impl PipelineExecutor {
    /// Returns the number of dependency cycles found.
    pub fn execute(options: &PipelineOptions) -> Result<usize> {
        // Probe the renderer first so a missing installation never throws
        // away a finished analysis.
        let renderer = GraphRenderer::new(&options.output)?;
        GraphRenderer::ensure_available()?;

        let mut progress = ProgressReporter::new();
        progress.start_scan(&options.root);
        let packages =
            WorkspaceScanner::scan(&options.root).wrap_err("Failed to scan the workspace")?;
        progress.finish_scan(packages.len());

        let index = PackageIndex::build(&packages);

        let graph = Mutex::new(DependencyGraph::new());
        {
            let mut graph = graph.lock().expect("graph mutex poisoned");
            for package in &packages {
                graph.ensure_node(&package.name);
            }
        }

        ManifestEdgeCollector::new(&index).collect(&packages, &graph);

        if options.bundler_imports {
            let collector = DynamicEdgeCollector::new(
                &options.root,
                &index,
                &options.extensions,
                options.allow_parse_error,
            );
            let files = collector.scan_workspace();
            let bar = progress.start_import_analysis(files.len());
            collector
                .collect(&files, &graph, &bar)
                .wrap_err("Failed to analyze source imports")?;
            progress.finish_import_analysis();
        }

        let mut graph = graph.into_inner().expect("graph mutex poisoned");

        progress.start_cycle_detection();
        let report = mark_cycles(&mut graph);
        for trail in &report.trails {
            eprintln!(
                "{} Cycle: {}",
                style("⚠").yellow().bold(),
                style(trail.join(" -> ")).red()
            );
        }
        progress.finish_cycle_detection(report.count());

        let mut dot_source = Vec::new();
        GraphSerializer::new().write_dot(&graph, &mut dot_source)?;
        let dot_source =
            String::from_utf8(dot_source).expect("DOT output is built from UTF-8 names");

        progress.rendering(renderer.output());
        renderer
            .render(&dot_source)
            .wrap_err("Failed to render the dependency graph")?;

        Ok(report.count())
    }
}
