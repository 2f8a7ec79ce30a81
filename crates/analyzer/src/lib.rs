//! # semconview analyzer
//!
//! Finds which OpenTelemetry semantic-convention attribute keys a Go codebase
//! references, per semconv package version.
//!
//! ## Architecture
//!
//! ```text
//! Glob patterns
//!     │
//!     ├──> File Set (glob expansion, `.go` filter, dedup)
//!     │
//!     ├──> Source Walker (one per file, tree-sitter-go)
//!     │      ├─ Import table: local name → semconv package path
//!     │      ├─ `pkg.Func(...)`  → function table lookup
//!     │      └─ `pkg.Const`      → constant table lookup
//!     │
//!     ├──> Package Resolver (single-flight cache per run)
//!     │      ├─ PackageLoader: `go list` or a vendor tree
//!     │      ├─ Constant pass: `X = attribute.Key("a.b")`
//!     │      └─ Function pass: `func F(..) { return X.Int(..) }`
//!     │
//!     └──> Aggregation
//!            ├─ sort by `key|version`, dedup
//!            └─ composite error list
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use semconview_analyzer::{Analyzer, AnalyzerConfig};
//!
//! let analysis = Analyzer::with_go_toolchain(AnalyzerConfig::default()).analyze(&["**/*.go"]);
//! for attr in analysis.dependencies.iter() {
//!     println!("{} {}", attr.key, attr.version);
//! }
//! if let Some(errors) = analysis.errors() {
//!     eprintln!("{errors}");
//! }
//! ```

mod aggregate;
mod config;
mod error;
mod files;
mod imports;
mod language;
mod loader;
mod resolver;
mod symbols;
mod syntax;
mod walker;

pub use aggregate::{analyze_semconv_dependencies, Analysis, Analyzer};
pub use config::AnalyzerConfig;
pub use error::{ErrorList, Result, SemconvError};
pub use files::{resolve_files, FileSet};
pub use imports::{default_package_name, ImportTable, SemconvImport, SemconvPathMatcher};
pub use loader::{
    GoListLoader, LoadedPackage, PackageFile, PackageLoader, VendorLoader, GO_BINARY_ENV,
};
pub use resolver::PackageResolver;
pub use semconview_protocol::{AttributeKind, SemconvAttribute, SemconvDependencies};
pub use symbols::PackageSymbols;
pub use walker::{FileReport, SourceWalker};
