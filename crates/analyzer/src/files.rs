use crate::error::SemconvError;
use crate::language::has_source_extension;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Files matched by a set of glob patterns
#[derive(Debug, Default)]
pub struct FileSet {
    /// Regular files with the source extension, deduplicated and sorted
    pub files: Vec<PathBuf>,
    /// Patterns that failed to expand, in pattern order
    pub errors: Vec<SemconvError>,
}

/// Expand `patterns` into the set of source files they match.
///
/// Every pattern is expanded independently: a malformed pattern or an
/// unreadable directory is recorded and the remaining patterns still run.
pub fn resolve_files<S: AsRef<str>>(patterns: &[S], extension: &str) -> FileSet {
    let mut files = BTreeSet::new();
    let mut errors = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let paths = match glob::glob(pattern) {
            Ok(paths) => paths,
            Err(err) => {
                log::warn!("invalid pattern {pattern:?}: {err}");
                errors.push(SemconvError::pattern(pattern, err));
                continue;
            }
        };

        let mut matched = 0usize;
        for entry in paths {
            match entry {
                Ok(path) => {
                    if path.is_file() && has_source_extension(&path, extension) {
                        matched += 1;
                        files.insert(path);
                    }
                }
                Err(err) => {
                    log::warn!("failed to expand pattern {pattern:?}: {err}");
                    errors.push(SemconvError::pattern(pattern, err));
                }
            }
        }
        log::debug!("pattern {pattern:?} matched {matched} files");
    }

    FileSet {
        files: files.into_iter().collect(),
        errors,
    }
}
