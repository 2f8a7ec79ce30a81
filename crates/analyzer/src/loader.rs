//! Locating and reading the sources of an imported Go package.
//!
//! The analyzer never builds the target program; it only needs the source
//! files of the semconv packages it meets. [`PackageLoader`] is the seam:
//! [`GoListLoader`] asks the Go toolchain (module cache, replace directives and
//! all), [`VendorLoader`] reads a directory tree laid out by import path.

use crate::error::{Result, SemconvError};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

/// Environment variable overriding the `go` binary used by [`GoListLoader`]
pub const GO_BINARY_ENV: &str = "SEMCONVIEW_GO";

/// One source file of a loaded package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    pub path: PathBuf,
    pub source: String,
}

/// Sources of one package as reported by a loader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedPackage {
    pub import_path: String,
    /// Declared package name, when the loader knows it
    pub name: Option<String>,
    pub dir: PathBuf,
    pub files: Vec<PackageFile>,
    /// Problems the loader found with the package itself
    pub errors: Vec<String>,
}

/// Loads the sources of a package by import path.
///
/// More than one package may come back for a single path; callers decide how
/// to pick among them.
pub trait PackageLoader: Send + Sync {
    fn load(&self, package_path: &str) -> Result<Vec<LoadedPackage>>;
}

/// Loader backed by `go list -e -json`
#[derive(Debug, Clone)]
pub struct GoListLoader {
    go_binary: PathBuf,
    working_dir: Option<PathBuf>,
}

impl Default for GoListLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl GoListLoader {
    pub fn new() -> Self {
        let go_binary = env::var_os(GO_BINARY_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("go"));
        Self {
            go_binary,
            working_dir: None,
        }
    }

    pub fn with_go_binary(mut self, go_binary: impl Into<PathBuf>) -> Self {
        self.go_binary = go_binary.into();
        self
    }

    /// Run `go list` from `dir` (selects the module whose requirements apply)
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListPackage {
    import_path: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    dir: String,
    #[serde(default)]
    go_files: Vec<String>,
    error: Option<GoListError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListError {
    err: String,
}

impl PackageLoader for GoListLoader {
    fn load(&self, package_path: &str) -> Result<Vec<LoadedPackage>> {
        let mut command = Command::new(&self.go_binary);
        command.args(["list", "-e", "-json", "--", package_path]);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        log::debug!("running {} list for {package_path}", self.go_binary.display());
        let output = command.output().map_err(|e| {
            SemconvError::package_load(
                package_path,
                format!("failed to run {}: {e}", self.go_binary.display()),
            )
        })?;

        if !output.status.success() && output.stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SemconvError::package_load(
                package_path,
                format!("go list exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let stream =
            serde_json::Deserializer::from_slice(&output.stdout).into_iter::<GoListPackage>();
        let mut packages = Vec::new();
        for listed in stream {
            let listed = listed.map_err(|e| {
                SemconvError::package_load(package_path, format!("invalid go list output: {e}"))
            })?;
            packages.push(read_listed_package(package_path, listed)?);
        }
        Ok(packages)
    }
}

fn read_listed_package(requested: &str, listed: GoListPackage) -> Result<LoadedPackage> {
    let dir = PathBuf::from(&listed.dir);
    let mut errors = Vec::new();
    if let Some(error) = listed.error {
        errors.push(error.err);
    }

    let mut files = Vec::with_capacity(listed.go_files.len());
    for file in &listed.go_files {
        let path = dir.join(file);
        let source = fs::read_to_string(&path).map_err(|e| {
            SemconvError::package_load(requested, format!("failed to read {}: {e}", path.display()))
        })?;
        files.push(PackageFile { path, source });
    }

    Ok(LoadedPackage {
        import_path: listed.import_path,
        name: (!listed.name.is_empty()).then_some(listed.name),
        dir,
        files,
        errors,
    })
}

/// Loader that maps import paths onto a directory tree (`vendor/` layout)
#[derive(Debug, Clone)]
pub struct VendorLoader {
    root: PathBuf,
}

impl VendorLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PackageLoader for VendorLoader {
    fn load(&self, package_path: &str) -> Result<Vec<LoadedPackage>> {
        let dir = package_path
            .split('/')
            .fold(self.root.clone(), |dir, segment| dir.join(segment));
        let entries = fs::read_dir(&dir).map_err(|e| {
            SemconvError::package_load(
                package_path,
                format!("package not found in {}: {e}", self.root.display()),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SemconvError::package_load(package_path, e))?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.ends_with(".go") && !name.ends_with("_test.go") && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let source = fs::read_to_string(&path).map_err(|e| {
                SemconvError::package_load(
                    package_path,
                    format!("failed to read {}: {e}", path.display()),
                )
            })?;
            files.push(PackageFile { path, source });
        }

        if files.is_empty() {
            return Err(SemconvError::package_load(
                package_path,
                format!("no Go files in {}", dir.display()),
            ));
        }

        Ok(vec![LoadedPackage {
            import_path: package_path.to_string(),
            name: None,
            dir,
            files,
            errors: Vec::new(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn vendor_loader_reads_non_test_go_files() {
        let temp = tempdir().unwrap();
        let pkg_dir = temp.path().join("example.com/otel/semconv/v1.0.0");
        fs::create_dir_all(&pkg_dir).unwrap();
        fs::write(pkg_dir.join("b.go"), "package semconv\n").unwrap();
        fs::write(pkg_dir.join("a.go"), "package semconv\n").unwrap();
        fs::write(pkg_dir.join("a_test.go"), "package semconv\n").unwrap();
        fs::write(pkg_dir.join("README.md"), "docs").unwrap();

        let loader = VendorLoader::new(temp.path());
        let packages = loader.load("example.com/otel/semconv/v1.0.0").unwrap();
        assert_eq!(packages.len(), 1);
        let names: Vec<_> = packages[0]
            .files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.go", "b.go"]);
    }

    #[test]
    fn vendor_loader_reports_missing_package() {
        let temp = tempdir().unwrap();
        let loader = VendorLoader::new(temp.path());
        let err = loader.load("example.com/missing").unwrap_err();
        assert!(matches!(
            err,
            SemconvError::PackageLoad { ref package, .. } if package == "example.com/missing"
        ));
    }

    #[test]
    fn go_list_loader_reports_missing_binary() {
        let loader = GoListLoader::new().with_go_binary("/nonexistent/semconview-go-binary");
        let err = loader.load("example.com/pkg").unwrap_err();
        assert!(err.to_string().contains("failed to run"), "{err}");
    }

    #[test]
    fn go_list_output_decodes_package_errors() {
        let listed: GoListPackage = serde_json::from_str(
            r#"{"ImportPath":"example.com/x","Error":{"Err":"cannot find module"}}"#,
        )
        .unwrap();
        let loaded = read_listed_package("example.com/x", listed).unwrap();
        assert_eq!(loaded.errors, vec!["cannot find module".to_string()]);
        assert!(loaded.files.is_empty());
        assert_eq!(loaded.name, None);
    }
}
