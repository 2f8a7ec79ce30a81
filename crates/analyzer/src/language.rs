use crate::error::{Result, SemconvError};
use std::path::Path;
use tree_sitter::{Node, Parser, Tree};

/// Create a tree-sitter parser for Go sources
pub fn go_parser() -> Result<Parser> {
    let language: tree_sitter::Language = tree_sitter_go::LANGUAGE.into();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|e| SemconvError::Parser(format!("Failed to set language: {e}")))?;
    Ok(parser)
}

/// Parse a Go source file, rejecting trees that contain syntax errors.
pub fn parse_go(parser: &mut Parser, source: &str, path: &Path) -> Result<Tree> {
    let tree = parser.parse(source, None).ok_or_else(|| SemconvError::Parse {
        path: path.to_path_buf(),
        line: 1,
        column: 1,
        message: "parser produced no tree".to_string(),
    })?;

    let root = tree.root_node();
    if root.has_error() {
        let (node, message) = first_error(root)
            .map(|node| {
                let message = if node.is_missing() {
                    format!("missing {}", node.kind())
                } else {
                    "syntax error".to_string()
                };
                (node, message)
            })
            .unwrap_or((root, "syntax error".to_string()));
        let position = node.start_position();
        return Err(SemconvError::Parse {
            path: path.to_path_buf(),
            line: position.row + 1,
            column: position.column + 1,
            message,
        });
    }

    Ok(tree)
}

/// Whether `path` carries the configured source extension
pub fn has_source_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == extension)
}

/// First ERROR or MISSING node in document order, descending only into
/// subtrees that contain one.
fn first_error(root: Node) -> Option<Node> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_go() {
        let mut parser = go_parser().unwrap();
        let tree = parse_go(
            &mut parser,
            "package main\n\nfunc main() {}\n",
            Path::new("main.go"),
        )
        .unwrap();
        assert_eq!(tree.root_node().kind(), "source_file");
    }

    #[test]
    fn reports_position_of_syntax_error() {
        let mut parser = go_parser().unwrap();
        let err = parse_go(
            &mut parser,
            "package main\n\nfunc main() {\n\tx := \n}\n}\n",
            Path::new("broken.go"),
        )
        .unwrap_err();
        match err {
            SemconvError::Parse { path, line, .. } => {
                assert_eq!(path, Path::new("broken.go"));
                assert!(line >= 3, "unexpected line {line}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn error_after_deep_nesting_is_located_on_small_stack() {
        let mut source = String::from("package main\n\nvar x = \"a\"");
        for _ in 0..10_000 {
            source.push_str(" + \"a\"");
        }
        source.push_str("\n\nvar y = )\n");

        let err = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || {
                let mut parser = go_parser().unwrap();
                parse_go(&mut parser, &source, Path::new("gen.go")).unwrap_err()
            })
            .unwrap()
            .join()
            .expect("error search should not overflow");
        assert!(matches!(err, SemconvError::Parse { .. }), "{err:?}");
    }

    #[test]
    fn extension_check_is_exact() {
        assert!(has_source_extension(Path::new("a/b.go"), "go"));
        assert!(!has_source_extension(Path::new("a/b.gox"), "go"));
        assert!(!has_source_extension(Path::new("a/go"), "go"));
    }
}
