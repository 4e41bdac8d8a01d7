use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use console::style;
use indicatif::ProgressBar;
use miette::Result;
use rayon::prelude::*;
use regex::Regex;
use tree_sitter::{Language, Node};

use crate::error::DepvizError;
use crate::graph::DependencyGraph;
use crate::index::PackageIndex;
use crate::manifest::SourceKind;

/// Filter applied to directory-import matches when the call site supplies
/// none. Matches every context-relative `./path`.
const DEFAULT_CONTEXT_FILTER: &str = r"^\./";

/// Return the tree-sitter [`Language`] for the given file extension, or
/// `None` if the extension is not supported.
///
/// `.ts` and `.tsx` need different grammars: the TypeScript grammar cannot
/// parse JSX, and the TSX grammar breaks angle-bracket type assertions.
fn language_for_extension(ext: &str) -> Option<Language> {
    match ext {
        "ts" => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        "tsx" => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
        "js" | "jsx" | "mjs" | "cjs" => Some(tree_sitter_javascript::LANGUAGE.into()),
        _ => None,
    }
}

/// A statically resolvable dynamic-import pattern found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ImportPattern {
    /// `import ... from './mods/*.js'` where the specifier contains `*`.
    Wildcard(String),
    /// `require.context('./mods', recursive, /filter/)`.
    DirectoryContext {
        dir: String,
        recursive: bool,
        filter: String,
    },
}

/// The workspace file inventory produced by a single ignore-aware walk.
///
/// `sources` are the files to parse (extension in the configured set);
/// `visible` is every tracked file, used to reject glob matches that fall on
/// ignored paths.
pub struct SourceFileSet {
    pub sources: Vec<PathBuf>,
    visible: HashSet<PathBuf>,
}

impl SourceFileSet {
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Collects edges from static analysis of wildcard imports and
/// `require.context` directory imports.
///
/// Each source file is parsed with the tree-sitter grammar for its extension.
/// Discovered patterns are resolved against the filesystem, matched files are
/// mapped back to their owning packages through the [`PackageIndex`], and the
/// surviving owners become [`SourceKind::Dynamic`] edges from the file's own
/// package. Patterns whose arguments are not string or regex literals cannot
/// be resolved statically and are skipped.
pub struct DynamicEdgeCollector<'a> {
    root: PathBuf,
    index: &'a PackageIndex,
    extensions: Vec<String>,
    allow_parse_error: bool,
}

impl<'a> DynamicEdgeCollector<'a> {
    pub fn new(
        root: &Path,
        index: &'a PackageIndex,
        extensions: &[String],
        allow_parse_error: bool,
    ) -> Self {
        Self {
            root: root.canonicalize().unwrap_or_else(|_| root.to_path_buf()),
            index,
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
            allow_parse_error,
        }
    }

    /// Walks the workspace once, honoring gitignore rules and excluding
    /// `node_modules`, and splits the result into parse targets and the full
    /// visible-file set.
    pub fn scan_workspace(&self) -> SourceFileSet {
        let walker = ignore::WalkBuilder::new(&self.root)
            .standard_filters(true)
            .require_git(false)
            .build();

        let mut visible = HashSet::new();
        let mut sources = Vec::new();

        for entry in walker.flatten() {
            let path = entry.path();
            if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(true) {
                continue;
            }
            if path.components().any(|c| c.as_os_str() == "node_modules") {
                continue;
            }

            let path = path
                .canonicalize()
                .unwrap_or_else(|_| path.to_path_buf());

            if self.has_configured_extension(&path) {
                sources.push(path.clone());
            }
            visible.insert(path);
        }

        sources.sort();
        SourceFileSet { sources, visible }
    }

    /// Parses every source file in parallel and inserts the discovered edges.
    pub fn collect(
        &self,
        files: &SourceFileSet,
        graph: &Mutex<DependencyGraph>,
        progress: &ProgressBar,
    ) -> Result<()> {
        files.sources.par_iter().try_for_each(|path| {
            let result = self.scan_file(path, &files.visible, graph);
            progress.inc(1);
            result
        })?;
        Ok(())
    }

    fn scan_file(
        &self,
        path: &Path,
        visible: &HashSet<PathBuf>,
        graph: &Mutex<DependencyGraph>,
    ) -> std::result::Result<(), DepvizError> {
        // Files outside every package directory contribute nothing.
        let Some(dependent) = self.index.owner_of(path) else {
            return Ok(());
        };
        let dependent = dependent.to_string();

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let Some(language) = language_for_extension(&ext) else {
            return Ok(());
        };

        let content =
            std::fs::read_to_string(path).map_err(|e| DepvizError::FileReadError {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&language)
            .expect("grammar should match the linked tree-sitter version");

        let tree = parser.parse(content.as_bytes(), None);
        let tree = match tree {
            Some(tree) if !tree.root_node().has_error() => tree,
            tree => {
                if self.allow_parse_error {
                    eprintln!(
                        "{} Failed to parse {}, skipping",
                        style("⚠").yellow(),
                        style(path.display()).dim()
                    );
                    return Ok(());
                }
                let (line, column) = tree
                    .as_ref()
                    .map(|t| first_error_point(t.root_node()))
                    .unwrap_or((1, 1));
                return Err(DepvizError::ParseFailure {
                    path: path.to_path_buf(),
                    line,
                    column,
                });
            }
        };

        let patterns = extract_patterns(tree.root_node(), content.as_bytes());
        if patterns.is_empty() {
            return Ok(());
        }

        let file_dir = path.parent().unwrap_or(Path::new("."));
        let mut matched = Vec::new();
        for pattern in &patterns {
            match pattern {
                ImportPattern::Wildcard(spec) => {
                    self.resolve_wildcard(file_dir, spec, visible, &mut matched);
                }
                ImportPattern::DirectoryContext {
                    dir,
                    recursive,
                    filter,
                } => {
                    resolve_directory_context(
                        file_dir, dir, *recursive, filter, visible, &mut matched,
                    );
                }
            }
        }

        let mut owners = BTreeSet::new();
        for file in &matched {
            if let Some(owner) = self.index.owner_of(file) {
                if owner != dependent {
                    owners.insert(owner.to_string());
                }
            }
        }

        if !owners.is_empty() {
            let mut graph = graph.lock().expect("graph mutex poisoned");
            for owner in owners {
                graph.add_edge(&dependent, &owner, SourceKind::Dynamic);
            }
        }

        Ok(())
    }

    /// Expands a wildcard import specifier relative to the importing file's
    /// directory. Matches must be tracked files inside the workspace root
    /// with a configured extension.
    fn resolve_wildcard(
        &self,
        file_dir: &Path,
        spec: &str,
        visible: &HashSet<PathBuf>,
        matched: &mut Vec<PathBuf>,
    ) {
        let pattern = file_dir.join(spec);
        let Some(pattern) = pattern.to_str() else {
            return;
        };
        // An unparseable glob is an unresolvable pattern, not an error.
        let Ok(paths) = glob::glob(pattern) else {
            return;
        };

        for entry in paths.flatten() {
            if !entry.is_file() {
                continue;
            }
            let Ok(canonical) = entry.canonicalize() else {
                continue;
            };
            if !visible.contains(&canonical) {
                continue;
            }
            if !self.has_configured_extension(&canonical) {
                continue;
            }
            if canonical.strip_prefix(&self.root).is_err() {
                continue;
            }
            matched.push(canonical);
        }
    }

    fn has_configured_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.iter().any(|c| c == &e.to_lowercase()))
    }
}

/// Expands a `require.context` call. Every tracked file under the base
/// directory (direct children only unless `recursive`) whose context-relative
/// `./path` form matches the filter, with or without its extension, is a
/// match.
fn resolve_directory_context(
    file_dir: &Path,
    dir: &str,
    recursive: bool,
    filter: &str,
    visible: &HashSet<PathBuf>,
    matched: &mut Vec<PathBuf>,
) {
    // A missing directory or an unsupported filter makes the pattern
    // unresolvable; skip it.
    let Ok(base) = file_dir.join(dir).canonicalize() else {
        return;
    };
    let Ok(filter) = Regex::new(filter) else {
        return;
    };

    for file in visible {
        let Ok(rel) = file.strip_prefix(&base) else {
            continue;
        };
        if rel.as_os_str().is_empty() {
            continue;
        }
        if !recursive && rel.components().count() > 1 {
            continue;
        }

        let with_ext = format!("./{}", rel.display());
        let without_ext = format!("./{}", rel.with_extension("").display());
        if filter.is_match(&with_ext) || filter.is_match(&without_ext) {
            matched.push(file.clone());
        }
    }
}

/// Position of the first error or missing node in the tree, 1-based.
fn first_error_point(root: Node) -> (usize, usize) {
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let point = node.start_position();
            return (point.row + 1, point.column + 1);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        // Push in reverse so the earliest subtree is inspected first.
        stack.extend(children.into_iter().rev());
    }

    (1, 1)
}

fn node_text<'t>(node: Node<'t>, source: &'t [u8]) -> &'t str {
    node.utf8_text(source).unwrap_or("")
}

/// The value of a plain string literal node, or `None` for template strings
/// and other expressions.
fn string_value(node: Node, source: &[u8]) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|c| c.kind() == "string_fragment")
        .map(|c| node_text(c, source).to_string())
}

fn regex_value(node: Node, source: &[u8]) -> Option<String> {
    if node.kind() != "regex" {
        return None;
    }
    node.child_by_field_name("pattern")
        .map(|p| node_text(p, source).to_string())
}

/// Walks the syntax tree collecting wildcard import declarations and
/// `require.context(...)` calls with statically known arguments.
fn extract_patterns(root: Node, source: &[u8]) -> Vec<ImportPattern> {
    let mut patterns = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        match node.kind() {
            "import_statement" => {
                if let Some(spec) = node
                    .child_by_field_name("source")
                    .and_then(|s| string_value(s, source))
                {
                    if spec.contains('*') {
                        patterns.push(ImportPattern::Wildcard(spec));
                    }
                }
            }
            "call_expression" => {
                if let Some(pattern) = directory_context_call(node, source) {
                    patterns.push(pattern);
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        stack.extend(node.children(&mut cursor));
    }

    patterns
}

/// Recognizes `require.context(dir, recursive?, filter?)`. Returns `None`
/// when the call has a different shape or any supplied argument is not a
/// literal.
fn directory_context_call(node: Node, source: &[u8]) -> Option<ImportPattern> {
    let function = node.child_by_field_name("function")?;
    if function.kind() != "member_expression" {
        return None;
    }

    let object = function.child_by_field_name("object")?;
    let property = function.child_by_field_name("property")?;
    if object.kind() != "identifier"
        || node_text(object, source) != "require"
        || node_text(property, source) != "context"
    {
        return None;
    }

    let args_node = node.child_by_field_name("arguments")?;
    let mut cursor = args_node.walk();
    let args: Vec<Node> = args_node
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();

    let dir = string_value(*args.first()?, source)?;

    let recursive = match args.get(1) {
        None => false,
        Some(n) if n.kind() == "true" => true,
        Some(n) if n.kind() == "false" => false,
        Some(_) => return None,
    };

    let filter = match args.get(2) {
        None => DEFAULT_CONTEXT_FILTER.to_string(),
        Some(n) => regex_value(*n, source)?,
    };

    Some(ImportPattern::DirectoryContext {
        dir,
        recursive,
        filter,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::manifest::PackageManifest;
    use crate::workspace::PackageInfo;

    fn write_file(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn make_package(root: &Path, name: &str) -> PackageInfo {
        let dir = root.join("packages").join(name);
        write_file(
            &dir.join("package.json"),
            &format!("{{ \"name\": \"{name}\" }}"),
        );
        PackageInfo {
            name: name.to_string(),
            dir,
            manifest: PackageManifest {
                name: Some(name.to_string()),
                ..Default::default()
            },
        }
    }

    fn collect_edges(
        root: &Path,
        packages: &[PackageInfo],
        extensions: &[&str],
        allow_parse_error: bool,
    ) -> Result<DependencyGraph> {
        let index = PackageIndex::build(packages);
        let extensions: Vec<String> = extensions.iter().map(|e| e.to_string()).collect();
        let collector = DynamicEdgeCollector::new(root, &index, &extensions, allow_parse_error);

        let files = collector.scan_workspace();
        let graph = Mutex::new(DependencyGraph::new());
        collector.collect(&files, &graph, &ProgressBar::hidden())?;
        Ok(graph.into_inner().unwrap())
    }

    #[test]
    fn test_wildcard_import_creates_dynamic_edge() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let packages = vec![make_package(root, "a"), make_package(root, "b")];

        write_file(
            &root.join("packages/a/index.js"),
            "import * as mods from '../b/lib/*.js'\n",
        );
        write_file(&root.join("packages/b/lib/x.js"), "export const x = 1\n");

        let graph = collect_edges(root, &packages, &["js"], false).unwrap();

        let edge = graph.edge("a", "b").unwrap();
        assert!(edge.sources.contains(&SourceKind::Dynamic));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_wildcard_respects_extension_filter() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let packages = vec![make_package(root, "a"), make_package(root, "b")];

        write_file(
            &root.join("packages/a/index.js"),
            "import * as mods from '../b/lib/*'\n",
        );
        write_file(&root.join("packages/b/lib/x.ts"), "export const x = 1\n");

        let graph = collect_edges(root, &packages, &["js"], false).unwrap();
        assert!(graph.edge("a", "b").is_none());
    }

    #[test]
    fn test_wildcard_self_matches_are_dropped() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let packages = vec![make_package(root, "a")];

        write_file(
            &root.join("packages/a/index.js"),
            "import * as mods from './lib/*.js'\n",
        );
        write_file(&root.join("packages/a/lib/x.js"), "export const x = 1\n");

        let graph = collect_edges(root, &packages, &["js"], false).unwrap();
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_gitignored_matches_are_excluded() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let packages = vec![make_package(root, "a"), make_package(root, "b")];

        write_file(&root.join(".gitignore"), "generated.js\n");
        write_file(
            &root.join("packages/a/index.js"),
            "import * as mods from '../b/lib/*.js'\n",
        );
        write_file(
            &root.join("packages/b/lib/generated.js"),
            "export const x = 1\n",
        );

        let graph = collect_edges(root, &packages, &["js"], false).unwrap();
        assert!(graph.edge("a", "b").is_none());
    }

    #[test]
    fn test_require_context_recursive() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let packages = vec![make_package(root, "a"), make_package(root, "b")];

        write_file(
            &root.join("packages/a/index.js"),
            "const ctx = require.context('../b/lib', true, /\\.js$/)\n",
        );
        write_file(
            &root.join("packages/b/lib/sub/deep.js"),
            "export const x = 1\n",
        );

        let graph = collect_edges(root, &packages, &["js"], false).unwrap();
        let edge = graph.edge("a", "b").unwrap();
        assert!(edge.sources.contains(&SourceKind::Dynamic));
    }

    #[test]
    fn test_require_context_non_recursive_skips_subdirectories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let packages = vec![make_package(root, "a"), make_package(root, "b")];

        write_file(
            &root.join("packages/a/index.js"),
            "const ctx = require.context('../b/lib')\n",
        );
        write_file(
            &root.join("packages/b/lib/sub/deep.js"),
            "export const x = 1\n",
        );

        let graph = collect_edges(root, &packages, &["js"], false).unwrap();
        assert!(graph.edge("a", "b").is_none());
    }

    #[test]
    fn test_require_context_filter_matches_without_extension() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let packages = vec![make_package(root, "a"), make_package(root, "b")];

        write_file(
            &root.join("packages/a/index.js"),
            "const ctx = require.context('../b/lib', false, /^\\.\\/mod-/)\n",
        );
        write_file(
            &root.join("packages/b/lib/mod-one.js"),
            "export const x = 1\n",
        );

        let graph = collect_edges(root, &packages, &["js"], false).unwrap();
        assert!(graph.edge("a", "b").is_some());
    }

    #[test]
    fn test_non_literal_context_argument_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let packages = vec![make_package(root, "a"), make_package(root, "b")];

        write_file(
            &root.join("packages/a/index.js"),
            "const dir = '../b/lib'\nconst ctx = require.context(dir, true)\n",
        );
        write_file(&root.join("packages/b/lib/x.js"), "export const x = 1\n");

        let graph = collect_edges(root, &packages, &["js"], false).unwrap();
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_parse_failure_is_fatal_by_default() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let packages = vec![make_package(root, "a")];

        write_file(&root.join("packages/a/index.js"), "import {\n");

        let err = collect_edges(root, &packages, &["js"], false).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_parse_failure_reports_error_location() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let packages = vec![make_package(root, "a")];

        write_file(&root.join("packages/a/index.js"), "const a = 1\n= = =\n");

        let err = collect_edges(root, &packages, &["js"], false).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("index.js"), "{message}");
        assert!(message.contains("at line 2"), "{message}");
    }

    #[test]
    fn test_first_error_point_finds_the_broken_line() {
        let source = b"const a = 1\n= = =\n";
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();
        assert!(tree.root_node().has_error());

        let (line, _column) = first_error_point(tree.root_node());
        assert_eq!(line, 2);
    }

    #[test]
    fn test_parse_failure_downgraded_with_allow_parse_error() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let packages = vec![make_package(root, "a")];

        write_file(&root.join("packages/a/index.js"), "import {\n");

        let graph = collect_edges(root, &packages, &["js"], true).unwrap();
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_typescript_wildcard_import() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let packages = vec![make_package(root, "a"), make_package(root, "b")];

        write_file(
            &root.join("packages/a/index.ts"),
            "import * as mods from '../b/lib/*.ts'\n",
        );
        write_file(&root.join("packages/b/lib/x.ts"), "export const x = 1\n");

        let graph = collect_edges(root, &packages, &["ts"], false).unwrap();
        assert!(graph.edge("a", "b").is_some());
    }

    #[test]
    fn test_extract_wildcard_pattern() {
        let source = b"import * as mods from './lib/*.js'\nimport plain from './one'\n";
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();

        let patterns = extract_patterns(tree.root_node(), source);
        assert_eq!(
            patterns,
            vec![ImportPattern::Wildcard("./lib/*.js".to_string())]
        );
    }

    #[test]
    fn test_extract_context_defaults() {
        let source = b"const ctx = require.context('./mods')\n";
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(source, None).unwrap();

        let patterns = extract_patterns(tree.root_node(), source);
        assert_eq!(
            patterns,
            vec![ImportPattern::DirectoryContext {
                dir: "./mods".to_string(),
                recursive: false,
                filter: DEFAULT_CONTEXT_FILTER.to_string(),
            }]
        );
    }
}
