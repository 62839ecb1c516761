//! Helpers for navigating devicetree syntax nodes
//!
//! These operate purely on the parsed tree; anything that needs a compiled
//! query lives on [`DtParser`](super::DtParser) instead.

use tree_sitter::Node;

/// Get the source text of a syntax node.
pub fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Get the devicetree node that contains the given syntax node.
///
/// Returns the node itself if it is already a devicetree node.
pub fn containing_node(node: Node) -> Option<Node> {
    let mut current = Some(node);
    while let Some(n) = current {
        if n.kind() == "node" {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

/// Get the child devicetree nodes of a devicetree node.
pub fn child_nodes(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|n| n.kind() == "node")
        .collect()
}

/// Get a devicetree node's name, or an empty string if it has none.
pub fn node_name<'s>(node: Node, source: &'s str) -> &'s str {
    node.child_by_field_name("name")
        .map(|n| node_text(n, source))
        .unwrap_or("")
}

/// Get a devicetree node's label, or an empty string if it has none.
pub fn node_label<'s>(node: Node, source: &'s str) -> &'s str {
    node.child_by_field_name("label")
        .map(|n| node_text(n, source))
        .unwrap_or("")
}

/// Get a devicetree node's full, slash-separated path.
pub fn node_path(node: Node, source: &str) -> String {
    let parts = node_path_parts(Some(node), source);

    match parts.len() {
        0 => String::new(),
        1 => parts.into_iter().next().unwrap_or_default(),
        _ => {
            let path = parts.join("/");

            // The top-level node is named "/", which is a special case since
            // the path should not start with "//".
            if parts[0] == "/" {
                path[1..].to_string()
            } else {
                path
            }
        }
    }
}

fn node_path_parts(node: Option<Node>, source: &str) -> Vec<String> {
    // There may be intermediate syntax nodes between devicetree nodes, such as
    // #if blocks, so traverse up the tree until we find a "node" node.
    let Some(dtnode) = node.and_then(containing_node) else {
        return Vec::new();
    };

    let mut parts = node_path_parts(dtnode.parent(), source);
    parts.push(node_name(dtnode, source).to_string());
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dts::DtParser;

    fn first_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
        if node.kind() == kind {
            return Some(node);
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.named_children(&mut cursor).collect();
        children.into_iter().find_map(|c| first_of_kind(c, kind))
    }

    #[test]
    fn test_node_path_nested() {
        let source = "/ { foo { bar { }; }; };";
        let mut parser = DtParser::new().unwrap();
        let tree = parser.parse(source).unwrap();

        let mut paths: Vec<String> = Vec::new();
        fn collect(node: Node, source: &str, out: &mut Vec<String>) {
            if node.kind() == "node" {
                out.push(node_path(node, source));
            }
            let mut cursor = node.walk();
            let children: Vec<_> = node.named_children(&mut cursor).collect();
            for child in children {
                collect(child, source, out);
            }
        }
        collect(tree.root_node(), source, &mut paths);

        assert_eq!(paths, vec!["/", "/foo", "/foo/bar"]);
    }

    #[test]
    fn test_node_label() {
        let source = "/ { foo: bar { }; };";
        let mut parser = DtParser::new().unwrap();
        let tree = parser.parse(source).unwrap();

        let inner = first_of_kind(tree.root_node(), "node")
            .and_then(|root| child_nodes(root).into_iter().next())
            .unwrap();

        assert_eq!(node_label(inner, source), "foo");
        assert_eq!(node_name(inner, source), "bar");
    }

    #[test]
    fn test_reference_node_path_uses_reference_text() {
        // A node that amends another by label has no path of its own; its
        // "name" is the reference itself.
        let source = "&foo { x = <1>; };";
        let mut parser = DtParser::new().unwrap();
        let tree = parser.parse(source).unwrap();

        let node = first_of_kind(tree.root_node(), "node").unwrap();
        assert_eq!(node_path(node, source), "&foo");
    }
}
