//! Path-addressed builder for the output tree

use super::node::{Formattable, Node};

/// Helper for building a representation of devicetree data.
///
/// Nodes are addressed by absolute path; intermediate nodes are created as
/// needed. A label is only ever attached to the terminal node of a path.
#[derive(Debug, Clone)]
pub struct Tree {
    pub root: Node,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            root: Node::new("/"),
        }
    }

    /// Get or create the node at the given path, applying `label` to it.
    pub fn add_node(&mut self, path: &str, label: &str) -> &mut Node {
        let mut current = &mut self.root;

        for name in path.split('/').skip(1).filter(|s| !s.is_empty()) {
            let index = match current.child_node_index(name) {
                Some(index) => index,
                None => {
                    current.add_child(Formattable::Node(Node::new(name)));
                    current.children.len() - 1
                }
            };

            current = match &mut current.children[index] {
                Formattable::Node(node) => node,
                _ => unreachable!("child_node_index only returns node children"),
            };
        }

        if !label.is_empty() {
            current.label = label.to_string();
        }

        current
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_node_creates_intermediate_nodes() {
        let mut tree = Tree::new();
        tree.add_node("/a/b/c", "leaf");

        let a = match &tree.root.children[0] {
            Formattable::Node(n) => n,
            other => panic!("expected node, got {other:?}"),
        };
        assert_eq!(a.name, "a");
        assert!(a.label.is_empty());

        let b = match &a.children[0] {
            Formattable::Node(n) => n,
            other => panic!("expected node, got {other:?}"),
        };
        let c = match &b.children[0] {
            Formattable::Node(n) => n,
            other => panic!("expected node, got {other:?}"),
        };
        assert_eq!(c.name, "c");
        assert_eq!(c.label, "leaf");
    }

    #[test]
    fn test_add_node_reuses_existing_nodes() {
        let mut tree = Tree::new();
        tree.add_node("/map/a", "");
        tree.add_node("/map/b", "");

        assert_eq!(tree.root.children.len(), 1);
        let map = match &tree.root.children[0] {
            Formattable::Node(n) => n,
            other => panic!("expected node, got {other:?}"),
        };
        // Two child nodes plus the spacer between them.
        assert_eq!(map.children.len(), 3);
    }

    #[test]
    fn test_add_node_root_path() {
        let mut tree = Tree::new();
        let node = tree.add_node("/", "");
        assert_eq!(node.name, "/");
    }
}
