//! Devicetree parser handle
//!
//! Owns a tree-sitter parser configured with the devicetree grammar plus the
//! compiled queries used to locate nodes and properties. Construct one per
//! host and pass it by reference into the extractor; there is no global
//! parser state.

use anyhow::Context;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor, Tree};

use super::error::{ParseError, Range};
use super::node::{containing_node, node_label, node_path, node_text};

const PROPERTY_QUERY: &str = "(property name: (identifier) @name) @prop";
const NODE_QUERY: &str = "(node) @node";
const REFERENCE_QUERY: &str =
    "(node name: (reference label: (identifier) @label)) @node";

pub struct DtParser {
    parser: Parser,
    property_query: Query,
    property_name_ix: u32,
    property_prop_ix: u32,
    node_query: Query,
    node_ix: u32,
    reference_query: Query,
    reference_label_ix: u32,
    reference_node_ix: u32,
}

impl DtParser {
    /// Create a parser with the devicetree language and compiled queries.
    pub fn new() -> anyhow::Result<Self> {
        let language = tree_sitter::Language::from(tree_sitter_devicetree::LANGUAGE);

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .context("Failed to load devicetree grammar")?;

        let property_query =
            Query::new(&language, PROPERTY_QUERY).context("Failed to compile property query")?;
        let node_query =
            Query::new(&language, NODE_QUERY).context("Failed to compile node query")?;
        let reference_query = Query::new(&language, REFERENCE_QUERY)
            .context("Failed to compile reference query")?;

        let capture = |query: &Query, name: &str| {
            query
                .capture_index_for_name(name)
                .with_context(|| format!("Missing @{name} capture"))
        };

        Ok(Self {
            property_name_ix: capture(&property_query, "name")?,
            property_prop_ix: capture(&property_query, "prop")?,
            node_ix: capture(&node_query, "node")?,
            reference_label_ix: capture(&reference_query, "label")?,
            reference_node_ix: capture(&reference_query, "node")?,
            parser,
            property_query,
            node_query,
            reference_query,
        })
    }

    /// Parse devicetree source text.
    pub fn parse(&mut self, text: &str) -> Result<Tree, ParseError> {
        self.parser.parse(text, None).ok_or_else(|| {
            ParseError::with_range(Range::default(), "Failed to parse devicetree source")
        })
    }

    /// Find devicetree nodes with the given "compatible" property.
    pub fn find_compatible<'t>(
        &self,
        root: Node<'t>,
        source: &str,
        compatible: &str,
    ) -> Vec<Node<'t>> {
        let quoted = format!("\"{compatible}\"");
        let mut result = Vec::new();

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.property_query, root, source.as_bytes());
        while let Some(m) = matches.next() {
            let Some(name) = self.capture_node(m.captures, self.property_name_ix) else {
                continue;
            };
            let Some(prop) = self.capture_node(m.captures, self.property_prop_ix) else {
                continue;
            };

            if node_text(name, source) != "compatible" {
                continue;
            }

            let value_matches = prop
                .child_by_field_name("value")
                .is_some_and(|v| v.kind() == "string_literal" && node_text(v, source) == quoted);
            if !value_matches {
                continue;
            }

            // The match may be nested inside the node body; resolve the
            // devicetree node that owns the property.
            if let Some(node) = containing_node(prop) {
                result.push(node);
            }
        }

        result
    }

    /// Find devicetree nodes with the given path.
    pub fn find_by_path<'t>(&self, root: Node<'t>, source: &str, path: &str) -> Vec<Node<'t>> {
        if path.is_empty() {
            return Vec::new();
        }

        let mut result = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.node_query, root, source.as_bytes());
        while let Some(m) = matches.next() {
            if let Some(node) = self.capture_node(m.captures, self.node_ix) {
                if node_path(node, source) == path {
                    result.push(node);
                }
            }
        }

        result
    }

    /// Find devicetree nodes which amend another node by referencing its label.
    pub fn find_by_reference<'t>(
        &self,
        root: Node<'t>,
        source: &str,
        label: &str,
    ) -> Vec<Node<'t>> {
        if label.is_empty() {
            return Vec::new();
        }

        let mut result = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.reference_query, root, source.as_bytes());
        while let Some(m) = matches.next() {
            let label_matches = self
                .capture_node(m.captures, self.reference_label_ix)
                .is_some_and(|n| node_text(n, source) == label);

            if label_matches {
                if let Some(node) = self.capture_node(m.captures, self.reference_node_ix) {
                    result.push(node);
                }
            }
        }

        result
    }

    /// Find all devicetree nodes that modify the same node, listed in the
    /// order they appear in the file. The input node is included.
    ///
    /// Devicetree allows a node to be amended in multiple fragments, either by
    /// repeating its path or by referencing its label.
    pub fn find_same_node<'t>(&self, root: Node<'t>, source: &str, node: Node<'t>) -> Vec<Node<'t>> {
        let path = node_path(node, source);
        let label = node_label(node, source);

        let mut nodes = self.find_by_path(root, source, &path);
        nodes.extend(self.find_by_reference(root, source, label));
        nodes.sort_by_key(|n| n.start_byte());
        nodes
    }

    /// Get a property of a devicetree node (or merged set of nodes describing
    /// the same node), or `None` if it isn't set.
    ///
    /// If the property appears multiple times, the last occurrence in source
    /// order wins. This does not account for /delete-property/.
    pub fn property<'t>(&self, nodes: &[Node<'t>], source: &str, name: &str) -> Option<Node<'t>> {
        nodes
            .iter()
            .filter_map(|n| self.node_property(*n, source, name))
            .last()
    }

    fn node_property<'t>(&self, node: Node<'t>, source: &str, name: &str) -> Option<Node<'t>> {
        let mut result: Option<Node<'t>> = None;

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.property_query, node, source.as_bytes());
        while let Some(m) = matches.next() {
            let name_matches = self
                .capture_node(m.captures, self.property_name_ix)
                .is_some_and(|n| node_text(n, source) == name);
            if !name_matches {
                continue;
            }

            let Some(prop) = self.capture_node(m.captures, self.property_prop_ix) else {
                continue;
            };

            // The query finds all descendants; keep only properties that
            // belong directly to the given devicetree node.
            if containing_node(prop) != Some(node) {
                continue;
            }

            if result.is_none_or(|prev| prop.start_byte() > prev.start_byte()) {
                result = Some(prop);
            }
        }

        result
    }

    fn capture_node<'t>(
        &self,
        captures: &[tree_sitter::QueryCapture<'t>],
        index: u32,
    ) -> Option<Node<'t>> {
        captures.iter().find(|c| c.index == index).map(|c| c.node)
    }
}
