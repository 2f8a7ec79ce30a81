use crate::config::AnalyzerConfig;
use crate::error::{Result, SemconvError};
use crate::imports::{
    parse_import_spec, ImportName, ImportTable, SemconvImport, SemconvPathMatcher,
};
use crate::language::{go_parser, parse_go};
use crate::resolver::PackageResolver;
use crate::syntax::selector_parts;
use semconview_protocol::SemconvAttribute;
use std::fs;
use std::path::Path;
use tree_sitter::{Node, Parser};

/// What one file contributed to a run
#[derive(Debug, Default)]
pub struct FileReport {
    pub attributes: Vec<SemconvAttribute>,
    /// Package resolution failures first triggered by this file
    pub errors: Vec<SemconvError>,
}

/// Walks Go files and reports references to semconv attribute symbols.
///
/// Each call to [`SourceWalker::walk_file`] starts with an empty import
/// table; only the resolver's package cache is shared between files.
pub struct SourceWalker<'r> {
    resolver: &'r PackageResolver,
    matcher: SemconvPathMatcher,
    parser: Parser,
}

impl<'r> SourceWalker<'r> {
    pub fn new(resolver: &'r PackageResolver, config: &AnalyzerConfig) -> Result<Self> {
        Ok(Self {
            resolver,
            matcher: SemconvPathMatcher::new(&config.semconv_namespace),
            parser: go_parser()?,
        })
    }

    /// Read, parse and walk one file.
    ///
    /// Read and syntax errors are returned as `Err`; resolution failures
    /// end up in [`FileReport::errors`] next to whatever was found.
    pub fn walk_file(&mut self, path: &Path) -> Result<FileReport> {
        let source = fs::read_to_string(path).map_err(|e| SemconvError::read_file(path, e))?;
        self.walk_source(path, &source)
    }

    pub fn walk_source(&mut self, path: &Path, source: &str) -> Result<FileReport> {
        let tree = parse_go(&mut self.parser, source, path)?;
        let mut visitor = FileVisitor {
            resolver: self.resolver,
            matcher: &self.matcher,
            source,
            imports: ImportTable::new(),
            report: FileReport::default(),
        };
        visitor.visit(tree.root_node());
        log::debug!(
            "{}: {} semconv imports, {} attribute references",
            path.display(),
            visitor.imports.len(),
            visitor.report.attributes.len()
        );
        Ok(visitor.report)
    }
}

struct FileVisitor<'a> {
    resolver: &'a PackageResolver,
    matcher: &'a SemconvPathMatcher,
    source: &'a str,
    imports: ImportTable,
    report: FileReport,
}

/// Which table a reference is looked up in
#[derive(Clone, Copy)]
enum Lookup {
    Function,
    Constant,
}

impl FileVisitor<'_> {
    /// Pre-order walk over named nodes. Uses an explicit stack so nesting
    /// depth is not bounded by the thread's stack size.
    fn visit(&mut self, root: Node) {
        let mut pending = vec![root];
        while let Some(node) = pending.pop() {
            match node.kind() {
                "import_spec" => {
                    self.visit_import_spec(node);
                    continue;
                }
                "call_expression" => self.visit_call(node),
                "selector_expression" => self.visit_selector(node),
                _ => {}
            }

            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            pending.extend(children.into_iter().rev());
        }
    }

    fn visit_import_spec(&mut self, node: Node) {
        let Some(spec) = parse_import_spec(node, self.source) else {
            return;
        };
        let Some(version) = self.matcher.version(&spec.path) else {
            return;
        };
        match spec.name {
            ImportName::Blank => return,
            ImportName::Dot => {
                log::debug!("skipping dot import of {}", spec.path);
                return;
            }
            _ => {}
        }
        if let Some(local_name) = spec.local_name() {
            let import = SemconvImport {
                version: version.to_string(),
                path: spec.path,
            };
            self.imports.insert(local_name, import);
        }
    }

    /// `<identifier>.<member>(...)`
    fn visit_call(&mut self, node: Node) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        self.lookup(function, Lookup::Function);
    }

    /// `<identifier>.<member>`
    fn visit_selector(&mut self, node: Node) {
        self.lookup(node, Lookup::Constant);
    }

    fn lookup(&mut self, selector: Node, lookup: Lookup) {
        let Some((identifier, member)) = selector_parts(selector, self.source) else {
            return;
        };
        let Some(import) = self.imports.get(identifier) else {
            return;
        };

        let resolved = match lookup {
            Lookup::Function => self.resolver.function_key(&import.path, member),
            Lookup::Constant => self.resolver.constant_key(&import.path, member),
        };
        match resolved {
            Ok(Some(key)) => self
                .report
                .attributes
                .push(SemconvAttribute::attribute(key, import.version.clone())),
            Ok(None) => {}
            Err(err) => {
                log::warn!("{err}");
                self.report.errors.push(err);
            }
        }
    }
}
