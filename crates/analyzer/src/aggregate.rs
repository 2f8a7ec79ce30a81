use crate::config::AnalyzerConfig;
use crate::error::{ErrorList, Result};
use crate::files::resolve_files;
use crate::loader::{GoListLoader, PackageLoader};
use crate::resolver::PackageResolver;
use crate::walker::{FileReport, SourceWalker};
use rayon::prelude::*;
use semconview_protocol::{SemconvAttribute, SemconvDependencies};
use std::path::Path;
use std::sync::Arc;

/// Outcome of one analysis run: always a usable result, plus every
/// recoverable problem met on the way.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub dependencies: SemconvDependencies,
    pub errors: ErrorList,
    /// Number of source files walked
    pub files_analyzed: usize,
    /// Number of distinct semconv packages analyzed
    pub packages_analyzed: usize,
}

impl Analysis {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> Option<&ErrorList> {
        (!self.errors.is_empty()).then_some(&self.errors)
    }

    /// Pass/fail view: any recoverable error fails the whole run
    pub fn into_result(self) -> std::result::Result<SemconvDependencies, ErrorList> {
        if self.errors.is_empty() {
            Ok(self.dependencies)
        } else {
            Err(self.errors)
        }
    }
}

/// Runs the file-set → walker → resolver → aggregation pipeline
pub struct Analyzer {
    config: AnalyzerConfig,
    loader: Arc<dyn PackageLoader>,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig, loader: Arc<dyn PackageLoader>) -> Self {
        Self { config, loader }
    }

    /// Analyzer resolving packages through `go list`
    pub fn with_go_toolchain(config: AnalyzerConfig) -> Self {
        Self::new(config, Arc::new(GoListLoader::new()))
    }

    /// Analyze every source file matched by `patterns`.
    ///
    /// Each call gets a fresh package cache.
    pub fn analyze<S: AsRef<str>>(&self, patterns: &[S]) -> Analysis {
        let file_set = resolve_files(patterns, &self.config.source_extension);
        if file_set.files.is_empty() {
            // pattern errors were already logged; an empty file set is a valid outcome
            log::info!("no files matched");
            return Analysis::default();
        }
        let mut errors: ErrorList = file_set.errors.into_iter().collect();

        let resolver = PackageResolver::new(self.loader.clone(), self.config.clone());
        let outcomes = if self.config.parallel {
            file_set
                .files
                .par_iter()
                .map_init(
                    || SourceWalker::new(&resolver, &self.config),
                    |walker, path| walk_one(walker, path),
                )
                .collect::<Vec<_>>()
        } else {
            let mut walker = SourceWalker::new(&resolver, &self.config);
            file_set
                .files
                .iter()
                .map(|path| walk_one(&mut walker, path))
                .collect()
        };

        let mut attributes: Vec<SemconvAttribute> = Vec::new();
        let mut load_errors = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(report) => {
                    attributes.extend(report.attributes);
                    load_errors.extend(report.errors);
                }
                Err(err) => errors.push(err),
            }
        }
        // which file triggers a failing load depends on scheduling
        load_errors.sort_by_cached_key(|err| err.to_string());
        errors.extend(load_errors);

        let dependencies = SemconvDependencies::from_usages(attributes);
        log::info!(
            "analyzed {} files and {} packages: {} attributes, {} errors",
            file_set.files.len(),
            resolver.packages_analyzed(),
            dependencies.len(),
            errors.len()
        );

        Analysis {
            dependencies,
            errors,
            files_analyzed: file_set.files.len(),
            packages_analyzed: resolver.packages_analyzed(),
        }
    }
}

fn walk_one(walker: &mut Result<SourceWalker<'_>>, path: &Path) -> Result<FileReport> {
    let walker = walker.as_mut().map_err(|e| e.clone())?;
    walker
        .walk_file(path)
        .inspect_err(|err| log::warn!("{err}"))
}

/// Analyze `patterns` with the default configuration and the Go toolchain
/// loader.
///
/// Returns the (possibly empty) result together with the composite error,
/// which is `Some` only when at least one recoverable problem occurred.
pub fn analyze_semconv_dependencies<S: AsRef<str>>(
    patterns: &[S],
) -> (SemconvDependencies, Option<ErrorList>) {
    let analysis = Analyzer::with_go_toolchain(AnalyzerConfig::default()).analyze(patterns);
    let errors = (!analysis.errors.is_empty()).then_some(analysis.errors);
    (analysis.dependencies, errors)
}
