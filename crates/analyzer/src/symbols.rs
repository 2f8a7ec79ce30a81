//! Symbol tables of a semantic-convention package.
//!
//! Two passes run over the package's parsed files:
//!
//! 1. **Constants**: every package-level constant whose static type is the
//!    tracked attribute-key type and whose initializer is exactly
//!    `attribute.Key("<literal>")` maps to that literal.
//! 2. **Functions**: every top-level function whose body is a single
//!    `return <Const>.<anything>(...)` where `<Const>` came out of pass 1 maps to
//!    that constant's key.
//!
//! Anything else is skipped without guessing.

use crate::config::AnalyzerConfig;
use crate::error::{Result, SemconvError};
use crate::imports::file_imports;
use crate::language::{go_parser, parse_go};
use crate::loader::LoadedPackage;
use crate::syntax::{code_children, node_text, selector_parts, string_literal_value};
use std::collections::HashMap;
use tree_sitter::{Node, Tree};

/// Constant-name and function-name lookup tables for one package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSymbols {
    constants: HashMap<String, String>,
    functions: HashMap<String, String>,
}

impl PackageSymbols {
    /// Attribute key encoded by the constant `name`
    pub fn constant_key(&self, name: &str) -> Option<&str> {
        self.constants.get(name).map(String::as_str)
    }

    /// Attribute key produced by the function `name`
    pub fn function_key(&self, name: &str) -> Option<&str> {
        self.functions.get(name).map(String::as_str)
    }

    pub fn constants(&self) -> &HashMap<String, String> {
        &self.constants
    }

    pub fn functions(&self) -> &HashMap<String, String> {
        &self.functions
    }

    /// Parse `package` and derive both tables.
    ///
    /// A file that fails to parse makes the whole package unusable: its
    /// declarations cannot be trusted to be complete.
    pub fn analyze(package: &LoadedPackage, config: &AnalyzerConfig) -> Result<Self> {
        let mut parser = go_parser()?;
        let mut files = Vec::with_capacity(package.files.len());
        for file in &package.files {
            let tree = parse_go(&mut parser, &file.source, &file.path)
                .map_err(|e| SemconvError::package_load(&package.import_path, e))?;
            files.push(ParsedFile {
                imports: import_paths(&tree, &file.source),
                tree,
                source: &file.source,
            });
        }

        let scope = TypeScope {
            package_path: &package.import_path,
            key_type: config.attribute_key_type_path(),
            attribute_package: &config.attribute_package,
            key_constructor: &config.attribute_key_type,
        };

        let mut constants = HashMap::new();
        for file in &files {
            collect_constants(file, &scope, &mut constants);
        }

        let mut functions = HashMap::new();
        for file in &files {
            collect_functions(file, &constants, &mut functions);
        }

        log::debug!(
            "package {}: {} attribute constants, {} attribute functions",
            package.import_path,
            constants.len(),
            functions.len()
        );

        Ok(Self {
            constants,
            functions,
        })
    }
}

struct ParsedFile<'a> {
    tree: Tree,
    source: &'a str,
    /// local name → import path
    imports: HashMap<String, String>,
}

struct TypeScope<'a> {
    package_path: &'a str,
    key_type: String,
    attribute_package: &'a str,
    key_constructor: &'a str,
}

fn import_paths(tree: &Tree, source: &str) -> HashMap<String, String> {
    file_imports(tree.root_node(), source)
        .into_iter()
        .filter_map(|spec| spec.local_name().map(|name| (name, spec.path)))
        .collect()
}

/// A package-level constant with its static type
struct ConstDecl<'t> {
    name: String,
    static_type: Option<String>,
    initializer: Option<Node<'t>>,
}

fn collect_constants(file: &ParsedFile, scope: &TypeScope, out: &mut HashMap<String, String>) {
    for decl in package_consts(file, scope) {
        if decl.static_type.as_deref() != Some(scope.key_type.as_str()) {
            continue;
        }
        let Some(init) = decl.initializer else {
            continue;
        };
        if let Some(key) = key_literal(init, file, scope) {
            out.insert(decl.name, key);
        }
    }
}

/// `attribute.Key("<literal>")` → `<literal>`
fn key_literal(init: Node, file: &ParsedFile, scope: &TypeScope) -> Option<String> {
    if init.kind() != "call_expression" {
        return None;
    }
    let function = init.child_by_field_name("function")?;
    let (qualifier, member) = selector_parts(function, file.source)?;
    if member != scope.key_constructor
        || file.imports.get(qualifier).map(String::as_str) != Some(scope.attribute_package)
    {
        return None;
    }
    let arguments = code_children(init.child_by_field_name("arguments")?);
    match arguments.as_slice() {
        [literal] => string_literal_value(*literal, file.source),
        _ => None,
    }
}

fn package_consts<'t>(file: &'t ParsedFile, scope: &TypeScope) -> Vec<ConstDecl<'t>> {
    let root = file.tree.root_node();
    let mut decls = Vec::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if child.kind() != "const_declaration" {
            continue;
        }
        let mut inherited_type: Option<String> = None;
        for spec in const_specs(child) {
            let type_node = spec.child_by_field_name("type");
            let values = spec
                .child_by_field_name("value")
                .map(code_children)
                .unwrap_or_default();

            let explicit_type = type_node.and_then(|t| resolve_type(t, file, scope));
            if type_node.is_none() && values.is_empty() {
                // implicit repetition of the previous spec
                let mut name_cursor = spec.walk();
                for name in spec.children_by_field_name("name", &mut name_cursor) {
                    decls.push(ConstDecl {
                        name: node_text(name, file.source).to_string(),
                        static_type: inherited_type.clone(),
                        initializer: None,
                    });
                }
                continue;
            }

            let mut spec_type = None;
            let mut name_cursor = spec.walk();
            for (index, name) in spec
                .children_by_field_name("name", &mut name_cursor)
                .enumerate()
            {
                let initializer = values.get(index).copied();
                let static_type = if type_node.is_some() {
                    explicit_type.clone()
                } else {
                    initializer.and_then(|init| infer_type(init, file))
                };
                if index == 0 {
                    spec_type = static_type.clone();
                }
                decls.push(ConstDecl {
                    name: node_text(name, file.source).to_string(),
                    static_type,
                    initializer,
                });
            }
            inherited_type = spec_type;
        }
    }
    decls
}

fn const_specs(decl: Node) -> Vec<Node> {
    let mut specs = Vec::new();
    for child in code_children(decl) {
        match child.kind() {
            "const_spec" => specs.push(child),
            "const_spec_list" => specs.extend(
                code_children(child)
                    .into_iter()
                    .filter(|n| n.kind() == "const_spec"),
            ),
            _ => {}
        }
    }
    specs
}

/// Fully qualified name of a written type (`attribute.Key`, `Local`)
fn resolve_type(type_node: Node, file: &ParsedFile, scope: &TypeScope) -> Option<String> {
    match type_node.kind() {
        "qualified_type" => {
            let package = type_node.child_by_field_name("package")?;
            let name = type_node.child_by_field_name("name")?;
            let path = file.imports.get(node_text(package, file.source))?;
            Some(format!("{path}.{}", node_text(name, file.source)))
        }
        "type_identifier" => Some(format!(
            "{}.{}",
            scope.package_path,
            node_text(type_node, file.source)
        )),
        _ => None,
    }
}

/// Type of an untyped-declaration initializer: only conversions to a type of
/// an imported package (`q.T(...)`) are recognized.
fn infer_type(init: Node, file: &ParsedFile) -> Option<String> {
    if init.kind() != "call_expression" {
        return None;
    }
    let function = init.child_by_field_name("function")?;
    let (qualifier, member) = selector_parts(function, file.source)?;
    let path = file.imports.get(qualifier)?;
    Some(format!("{path}.{member}"))
}

fn collect_functions(
    file: &ParsedFile,
    constants: &HashMap<String, String>,
    out: &mut HashMap<String, String>,
) {
    let root = file.tree.root_node();
    let mut cursor = root.walk();
    for decl in root.named_children(&mut cursor) {
        if decl.kind() != "function_declaration" {
            continue;
        }
        let Some(name) = decl.child_by_field_name("name") else {
            continue;
        };
        let Some(body) = decl.child_by_field_name("body") else {
            continue;
        };
        let Some(constant) = single_return_receiver(body, file.source) else {
            continue;
        };
        if let Some(key) = constants.get(constant) {
            out.insert(node_text(name, file.source).to_string(), key.clone());
        }
    }
}

/// For a body `{ return X.m(...) }`, the identifier `X`.
fn single_return_receiver<'s>(body: Node, source: &'s str) -> Option<&'s str> {
    let statements = match code_children(body).as_slice() {
        [list] if list.kind() == "statement_list" => code_children(*list),
        other => other.to_vec(),
    };
    let [statement] = statements.as_slice() else {
        return None;
    };
    if statement.kind() != "return_statement" {
        return None;
    }

    let results = code_children(*statement);
    let [list] = results.as_slice() else {
        return None;
    };
    let expressions = if list.kind() == "expression_list" {
        code_children(*list)
    } else {
        vec![*list]
    };
    let [call] = expressions.as_slice() else {
        return None;
    };
    if call.kind() != "call_expression" {
        return None;
    }
    let function = call.child_by_field_name("function")?;
    selector_parts(function, source).map(|(receiver, _)| receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::PackageFile;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn package(files: &[(&str, &str)]) -> LoadedPackage {
        LoadedPackage {
            import_path: "go.opentelemetry.io/otel/semconv/v1.20.0".to_string(),
            name: Some("semconv".to_string()),
            dir: PathBuf::from("semconv/v1.20.0"),
            files: files
                .iter()
                .map(|(name, source)| PackageFile {
                    path: PathBuf::from(name),
                    source: source.to_string(),
                })
                .collect(),
            errors: Vec::new(),
        }
    }

    fn analyze(source: &str) -> PackageSymbols {
        PackageSymbols::analyze(&package(&[("a.go", source)]), &AnalyzerConfig::default())
            .expect("analysis should succeed")
    }

    #[test]
    fn constant_literal_is_extracted() {
        let symbols = analyze(
            r#"package semconv

import "go.opentelemetry.io/otel/attribute"

const (
	// HTTPMethodKey is the attribute Key conforming to the "http.method"
	// semantic conventions.
	HTTPMethodKey = attribute.Key("http.method")
	HTTPStatusCodeKey = attribute.Key(`http.status_code`)
)
"#,
        );
        assert_eq!(symbols.constant_key("HTTPMethodKey"), Some("http.method"));
        assert_eq!(
            symbols.constant_key("HTTPStatusCodeKey"),
            Some("http.status_code")
        );
        assert_eq!(symbols.constants().len(), 2);
        assert!(symbols.functions().is_empty());
    }

    #[test]
    fn constant_of_unrelated_type_is_ignored() {
        let symbols = analyze(
            r#"package semconv

import (
	"go.opentelemetry.io/otel/attribute"
	other "example.com/other"
)

const FooKey = other.Key("foo.bar")
const BarKey = "bar.baz"
const BazKey string = "baz.qux"
type Key string
const LocalKey Key = Key("local.key")
const RealKey = attribute.Key("real.key")
"#,
        );
        assert_eq!(symbols.constant_key("FooKey"), None);
        assert_eq!(symbols.constant_key("BarKey"), None);
        assert_eq!(symbols.constant_key("BazKey"), None);
        assert_eq!(symbols.constant_key("LocalKey"), None);
        assert_eq!(symbols.constant_key("RealKey"), Some("real.key"));
    }

    #[test]
    fn constant_shape_must_be_single_literal_argument() {
        let symbols = analyze(
            r#"package semconv

import "go.opentelemetry.io/otel/attribute"

const prefix = "http."
const (
	ConcatKey attribute.Key = attribute.Key(prefix + "route")
	TypedKey attribute.Key = attribute.Key("typed.key")
	AliasKey attribute.Key = TypedKey
)
"#,
        );
        assert_eq!(symbols.constant_key("ConcatKey"), None);
        assert_eq!(symbols.constant_key("TypedKey"), Some("typed.key"));
        assert_eq!(symbols.constant_key("AliasKey"), None);
    }

    #[test]
    fn aliased_attribute_import_is_resolved() {
        let symbols = analyze(
            r#"package semconv

import attr "go.opentelemetry.io/otel/attribute"

const ServiceNameKey = attr.Key("service.name")
"#,
        );
        assert_eq!(symbols.constant_key("ServiceNameKey"), Some("service.name"));
    }

    #[test]
    fn function_wrapper_maps_to_constant_key() {
        let symbols = analyze(
            r#"package semconv

import "go.opentelemetry.io/otel/attribute"

const HTTPStatusCodeKey = attribute.Key("http.status_code")

// HTTPStatusCode returns an attribute KeyValue conforming to the
// "http.status_code" semantic conventions.
func HTTPStatusCode(val int) attribute.KeyValue {
	// single statement
	return HTTPStatusCodeKey.Int(val)
}

func HTTPStatusCodeChecked(val int) attribute.KeyValue {
	if val < 0 {
		val = 0
	}
	return HTTPStatusCodeKey.Int(val)
}

func HTTPStatusCodeTwice(val int) (attribute.KeyValue, attribute.KeyValue) {
	return HTTPStatusCodeKey.Int(val), HTTPStatusCodeKey.Int(val)
}

func Unrelated() attribute.KeyValue {
	return attribute.Int("x", 1)
}

type holder struct{}

func (holder) HTTPStatusCode(val int) attribute.KeyValue {
	return HTTPStatusCodeKey.Int(val)
}
"#,
        );
        let mut functions: Vec<_> = symbols.functions().iter().collect();
        functions.sort();
        assert_eq!(
            functions,
            vec![(&"HTTPStatusCode".to_string(), &"http.status_code".to_string())]
        );
    }

    #[test]
    fn functions_may_reference_constants_from_other_files() {
        let pkg = package(&[
            (
                "attribute_group.go",
                r#"package semconv

import "go.opentelemetry.io/otel/attribute"

const UserAgentOriginalKey = attribute.Key("user_agent.original")
"#,
            ),
            (
                "helpers.go",
                r#"package semconv

import "go.opentelemetry.io/otel/attribute"

func UserAgentOriginal(val string) attribute.KeyValue {
	return UserAgentOriginalKey.String(val)
}
"#,
            ),
        ]);
        let symbols = PackageSymbols::analyze(&pkg, &AnalyzerConfig::default()).unwrap();
        assert_eq!(
            symbols.function_key("UserAgentOriginal"),
            Some("user_agent.original")
        );
    }

    #[test]
    fn unparsable_package_file_is_a_load_error() {
        let pkg = package(&[("broken.go", "package semconv\n\nconst (\n")]);
        let err = PackageSymbols::analyze(&pkg, &AnalyzerConfig::default()).unwrap_err();
        assert!(
            matches!(
                err,
                SemconvError::PackageLoad { ref package, .. }
                    if package == "go.opentelemetry.io/otel/semconv/v1.20.0"
            ),
            "{err:?}"
        );
    }
}
