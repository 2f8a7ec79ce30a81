//! Small helpers over the tree-sitter Go syntax tree.

use tree_sitter::Node;

pub(crate) fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    let start = node.start_byte();
    let end = node.end_byte();
    &source[start..end]
}

/// Named children of `node`, skipping comments
pub(crate) fn code_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// `<identifier>.<member>` selector split into its two names.
///
/// Returns `None` when the operand is anything other than a bare identifier
/// (e.g. `a.b.c`, `f().x`).
pub(crate) fn selector_parts<'s>(node: Node, source: &'s str) -> Option<(&'s str, &'s str)> {
    if node.kind() != "selector_expression" {
        return None;
    }
    let operand = node.child_by_field_name("operand")?;
    if operand.kind() != "identifier" {
        return None;
    }
    let field = node.child_by_field_name("field")?;
    Some((node_text(operand, source), node_text(field, source)))
}

/// Value of a Go string literal node, or `None` for any other node kind.
pub(crate) fn string_literal_value(node: Node, source: &str) -> Option<String> {
    let raw = node_text(node, source);
    match node.kind() {
        "raw_string_literal" => raw
            .strip_prefix('`')
            .and_then(|s| s.strip_suffix('`'))
            .map(|s| s.replace('\r', "")),
        "interpreted_string_literal" => raw
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .and_then(unescape),
        _ => None,
    }
}

fn unescape(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next()?;
        let decoded = match escaped {
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0B}',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'x' => hex_char(&mut chars, 2)?,
            'u' => hex_char(&mut chars, 4)?,
            'U' => hex_char(&mut chars, 8)?,
            '0'..='7' => {
                let mut value = escaped.to_digit(8)?;
                for _ in 0..2 {
                    value = value * 8 + chars.next()?.to_digit(8)?;
                }
                char::from_u32(value)?
            }
            _ => return None,
        };
        out.push(decoded);
    }
    Some(out)
}

fn hex_char(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<char> {
    let mut value = 0u32;
    for _ in 0..digits {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    char::from_u32(value)
}
