use crate::syntax::{node_text, string_literal_value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tree_sitter::Node;

static VERSION_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v\d+(\.\d+)*$").expect("valid version regex"));

static SEMCONV_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v\d+\.\d+\.\d+$").expect("valid semconv version regex"));

static GOPKG_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.v\d+$").expect("valid gopkg suffix regex"));

/// Local name given to an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportName {
    /// No explicit name: the package's own name is used
    Default,
    Named(String),
    /// `_`
    Blank,
    /// `.`
    Dot,
}

/// One `import_spec` of a Go file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub name: ImportName,
    pub path: String,
}

impl ImportSpec {
    /// Identifier that refers to this import at use sites, if any
    pub fn local_name(&self) -> Option<String> {
        match &self.name {
            ImportName::Named(name) => Some(name.clone()),
            ImportName::Default => Some(default_package_name(&self.path).to_string()),
            ImportName::Blank | ImportName::Dot => None,
        }
    }
}

/// Decode an `import_spec` node
pub fn parse_import_spec(node: Node, source: &str) -> Option<ImportSpec> {
    if node.kind() != "import_spec" {
        return None;
    }
    let path_node = node.child_by_field_name("path")?;
    let path = string_literal_value(path_node, source)?;
    let name = match node.child_by_field_name("name") {
        None => ImportName::Default,
        Some(name) => match name.kind() {
            "blank_identifier" => ImportName::Blank,
            "dot" => ImportName::Dot,
            _ => match node_text(name, source) {
                "_" => ImportName::Blank,
                "." => ImportName::Dot,
                other => ImportName::Named(other.to_string()),
            },
        },
    };
    Some(ImportSpec { name, path })
}

/// All import specs declared at the top of a Go file
pub fn file_imports(root: Node, source: &str) -> Vec<ImportSpec> {
    let mut specs = Vec::new();
    let mut cursor = root.walk();
    for decl in root.children(&mut cursor) {
        if decl.kind() != "import_declaration" {
            continue;
        }
        let mut decl_cursor = decl.walk();
        for child in decl.named_children(&mut decl_cursor) {
            match child.kind() {
                "import_spec" => specs.extend(parse_import_spec(child, source)),
                "import_spec_list" => {
                    let mut list_cursor = child.walk();
                    for spec in child.named_children(&mut list_cursor) {
                        specs.extend(parse_import_spec(spec, source));
                    }
                }
                _ => {}
            }
        }
    }
    specs
}

/// Name a package is referred to by when imported without an alias.
///
/// Go packages conventionally carry the name of their last path segment; a
/// trailing version segment (`/v2`, `/v1.20.0`) or a gopkg.in suffix
/// (`yaml.v3`) is not part of the name.
pub fn default_package_name(path: &str) -> &str {
    let mut segments = path.rsplit('/');
    let last = segments.next().unwrap_or(path);
    if VERSION_SEGMENT.is_match(last) {
        if let Some(previous) = segments.next() {
            return previous;
        }
    }
    match GOPKG_SUFFIX.find(last) {
        Some(found) => &last[..found.start()],
        None => last,
    }
}

/// Matches `<namespace>/semconv/v<major>.<minor>.<patch>` import paths
#[derive(Debug, Clone)]
pub struct SemconvPathMatcher {
    prefix: String,
}

impl SemconvPathMatcher {
    pub fn new(namespace: &str) -> Self {
        Self {
            prefix: format!("{}/semconv/", namespace.trim_end_matches('/')),
        }
    }

    /// Version segment (`v1.30.0`) when `path` is a semconv package path
    pub fn version<'p>(&self, path: &'p str) -> Option<&'p str> {
        let version = path.strip_prefix(&self.prefix)?;
        SEMCONV_VERSION.is_match(version).then_some(version)
    }
}

/// A semantic-convention package a file imported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemconvImport {
    pub path: String,
    pub version: String,
}

/// Per-file mapping from local identifier to imported semconv package
#[derive(Debug, Default)]
pub struct ImportTable {
    entries: HashMap<String, SemconvImport>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, local_name: String, import: SemconvImport) {
        self.entries.insert(local_name, import);
    }

    pub fn get(&self, local_name: &str) -> Option<&SemconvImport> {
        self.entries.get(local_name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
