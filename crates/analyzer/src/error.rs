use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, SemconvError>;

/// Recoverable problems captured during an analysis run.
///
/// None of these abort a run; they are collected into an [`ErrorList`] and
/// returned next to whatever partial result could be computed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemconvError {
    /// A glob pattern is malformed or its expansion failed
    #[error("Invalid pattern {pattern:?}: {message}")]
    Pattern { pattern: String, message: String },

    /// A source file could not be read
    #[error("Failed to read {}: {message}", path.display())]
    ReadFile { path: PathBuf, message: String },

    /// A source file is not syntactically valid
    #[error("Failed to parse {}:{line}:{column}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// A semantic-convention package could not be loaded or analyzed
    #[error("Failed to load package {package}: {message}")]
    PackageLoad { package: String, message: String },

    /// Tree-sitter grammar setup failed
    #[error("Parser error: {0}")]
    Parser(String),
}

impl SemconvError {
    pub fn pattern(pattern: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.to_string(),
        }
    }

    pub fn read_file(path: &Path, message: impl fmt::Display) -> Self {
        Self::ReadFile {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub fn package_load(package: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::PackageLoad {
            package: package.into(),
            message: message.to_string(),
        }
    }
}

/// Ordered collection of recoverable errors gathered over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList {
    errors: Vec<SemconvError>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: SemconvError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SemconvError> {
        self.errors.iter()
    }
}

impl Extend<SemconvError> for ErrorList {
    fn extend<I: IntoIterator<Item = SemconvError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl FromIterator<SemconvError> for ErrorList {
    fn from_iter<I: IntoIterator<Item = SemconvError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ErrorList {
    type Item = SemconvError;
    type IntoIter = std::vec::IntoIter<SemconvError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            0 => write!(f, "no errors occurred"),
            1 => write!(f, "1 error occurred:\n\t* {}", self.errors[0]),
            n => {
                write!(f, "{n} errors occurred:")?;
                for error in &self.errors {
                    write!(f, "\n\t* {error}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ErrorList {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_every_error() {
        let mut errors = ErrorList::new();
        errors.push(SemconvError::pattern("[", "unclosed character class"));
        errors.push(SemconvError::package_load(
            "go.opentelemetry.io/otel/semconv/v9.9.9",
            "package not found",
        ));

        let rendered = errors.to_string();
        assert!(rendered.starts_with("2 errors occurred:"), "{rendered}");
        assert!(rendered.contains("\t* Invalid pattern \"[\""), "{rendered}");
        assert!(rendered.contains("semconv/v9.9.9: package not found"), "{rendered}");
    }

    #[test]
    fn parse_error_carries_location() {
        let err = SemconvError::Parse {
            path: PathBuf::from("cmd/main.go"),
            line: 3,
            column: 7,
            message: "syntax error".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to parse cmd/main.go:3:7: syntax error");
    }
}
