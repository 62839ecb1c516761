//! Decoding syntax nodes into typed values
//!
//! Interprets raw devicetree syntax nodes as integers, strings, phandles and
//! arrays. Numeric expressions already present in the tree are evaluated, but
//! macros that haven't been expanded to numbers will fail to decode.

use tree_sitter::Node;

use super::error::ParseError;
use super::node::node_text;

/// Parse a node as a devicetree number, evaluating any expression.
pub fn parse_number(node: Node, source: &str) -> Result<i64, ParseError> {
    match node.kind() {
        "integer_literal" => parse_integer_literal(node, source),
        "unary_expression" => evaluate_unary_expression(node, source),
        "binary_expression" => evaluate_binary_expression(node, source),
        "parenthesized_expression" | "integer_cells" => {
            parse_number(first_cell(node)?, source)
        }
        kind => Err(ParseError::new(
            &node,
            format!(
                "Expected integer_literal | unary_expression | binary_expression | integer_cells but got {kind}"
            ),
        )),
    }
}

/// Parse a node as a string literal, stripping the surrounding quotes.
pub fn parse_string(node: Node, source: &str) -> Result<String, ParseError> {
    if node.kind() != "string_literal" {
        return Err(ParseError::new(
            &node,
            format!("Expected string_literal but got {}", node.kind()),
        ));
    }

    let text = node_text(node, source).trim();
    Ok(text[1..text.len() - 1].to_string())
}

/// Parse a node as a node reference, returning the referenced label.
pub fn parse_phandle(node: Node, source: &str) -> Result<String, ParseError> {
    match node.kind() {
        "integer_cells" => parse_phandle(first_cell(node)?, source),
        "reference" => {
            let label = node
                .child_by_field_name("label")
                .ok_or_else(|| ParseError::new(&node, "Expected a phandle"))?;
            Ok(node_text(label, source).to_string())
        }
        kind => Err(ParseError::new(
            &node,
            format!("Expected reference | integer_cells but got {kind}"),
        )),
    }
}

/// Parse a node as an array of numbers.
///
/// Sibling cell groups following the given one are flattened into the result;
/// this is how adjacent `<...>, <...>` groups concatenate in devicetree.
/// Traversal stops at the first sibling that is not a cell group.
pub fn parse_array(node: Option<Node>, source: &str) -> Result<Vec<i64>, ParseError> {
    let mut result = Vec::new();

    let mut current = node;
    while let Some(n) = current {
        match n.kind() {
            "integer_cells" => {
                for cell in cells(n) {
                    result.push(parse_number(cell, source)?);
                }
            }
            "comment" => {}
            _ => break,
        }

        current = n.next_named_sibling();
    }

    Ok(result)
}

/// Parse a node as an array of node references and/or numbers, using the same
/// traversal as [`parse_array`] but returning the raw cell nodes.
///
/// Phandle arrays interleave references and numbers positionally, so the
/// caller re-decodes each cell according to its schema.
pub fn parse_phandle_array<'t>(
    node: Option<Node<'t>>,
    _source: &str,
) -> Result<Vec<Node<'t>>, ParseError> {
    let mut result = Vec::new();

    let mut current = node;
    while let Some(n) = current {
        match n.kind() {
            "integer_cells" => result.extend(cells(n)),
            "comment" => {}
            _ => break,
        }

        current = n.next_named_sibling();
    }

    Ok(result)
}

/// The named children of a cell group, with comments skipped.
fn cells(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

fn first_cell(node: Node) -> Result<Node, ParseError> {
    let mut result = node.named_child(0);
    while let Some(n) = result {
        if n.kind() != "comment" {
            return Ok(n);
        }
        result = n.next_named_sibling();
    }
    Err(ParseError::new(&node, "Expected a value"))
}

fn parse_integer_literal(node: Node, source: &str) -> Result<i64, ParseError> {
    let text = node_text(node, source).trim();

    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else {
        text.parse::<i64>()
    };

    parsed.map_err(|_| ParseError::new(&node, format!("Invalid number \"{text}\"")))
}

fn evaluate_unary_expression(node: Node, source: &str) -> Result<i64, ParseError> {
    let (Some(operator), Some(argument)) = (
        node.child_by_field_name("operator"),
        node.child_by_field_name("argument"),
    ) else {
        return Err(ParseError::new(&node, "Invalid unary expression"));
    };

    let value = parse_number(argument, source)?;

    match node_text(operator, source) {
        "!" => Ok((value == 0) as i64),
        "~" => Ok(!value),
        "-" => Ok(value.wrapping_neg()),
        "+" => Ok(value),
        op => Err(ParseError::new(&node, format!("Invalid operator \"{op}\""))),
    }
}

fn evaluate_binary_expression(node: Node, source: &str) -> Result<i64, ParseError> {
    let (Some(operator), Some(left), Some(right)) = (
        node.child_by_field_name("operator"),
        node.child_by_field_name("left"),
        node.child_by_field_name("right"),
    ) else {
        return Err(ParseError::new(&node, "Invalid binary expression"));
    };

    let a = parse_number(left, source)?;
    let b = parse_number(right, source)?;

    match node_text(operator, source) {
        "+" => Ok(a.wrapping_add(b)),
        "-" => Ok(a.wrapping_sub(b)),
        "*" => Ok(a.wrapping_mul(b)),
        "/" => a
            .checked_div(b)
            .ok_or_else(|| ParseError::new(&node, "Division by zero")),
        "%" => a
            .checked_rem(b)
            .ok_or_else(|| ParseError::new(&node, "Division by zero")),
        "||" => Ok((a != 0 || b != 0) as i64),
        "&&" => Ok((a != 0 && b != 0) as i64),
        "|" => Ok(a | b),
        "^" => Ok(a ^ b),
        "&" => Ok(a & b),
        "==" => Ok((a == b) as i64),
        "!=" => Ok((a != b) as i64),
        ">" => Ok((a > b) as i64),
        ">=" => Ok((a >= b) as i64),
        "<=" => Ok((a <= b) as i64),
        "<" => Ok((a < b) as i64),
        "<<" => Ok(a.wrapping_shl(b as u32)),
        ">>" => Ok(a.wrapping_shr(b as u32)),
        op => Err(ParseError::new(&node, format!("Invalid operator \"{op}\""))),
    }
}
