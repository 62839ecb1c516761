//! Layout extraction from devicetree source
//!
//! Walks the parsed tree for nodes compatible with `zmk,physical-layout` and
//! `zmk,physical-layout-position-map` and builds the domain model. Any
//! decode failure aborts the whole extraction; there is no partial import.

use tree_sitter::Node;

use crate::dts::node::{child_nodes, node_label, node_path};
use crate::dts::{
    parse_array, parse_number, parse_phandle, parse_phandle_array, parse_string, DtParser,
    ParseError,
};
use crate::model::{KeyAttributes, NodeId, PhysicalLayout, PositionMap, PositionMapItem};

pub const PHYSICAL_LAYOUT_COMPATIBLE: &str = "zmk,physical-layout";
pub const POSITION_MAP_COMPATIBLE: &str = "zmk,physical-layout-position-map";

/// Number of cells describing one key in a `keys` property.
const KEY_ATTRS_SIZE: usize = 8;

/// The result of one import: the layouts found in the source and the position
/// map, if it defined one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLayouts {
    pub layouts: Vec<PhysicalLayout>,
    pub position_map: Option<PositionMap>,
}

/// Extract all physical layouts and the position map from devicetree source.
pub fn parse_layouts(parser: &mut DtParser, text: &str) -> Result<ParsedLayouts, ParseError> {
    let tree = parser.parse(text)?;
    let root = tree.root_node();

    let layout_nodes = parser.find_compatible(root, text, PHYSICAL_LAYOUT_COMPATIBLE);
    let map_nodes = parser.find_compatible(root, text, POSITION_MAP_COMPATIBLE);

    tracing::debug!(
        layouts = layout_nodes.len(),
        position_maps = map_nodes.len(),
        "matched compatible nodes"
    );

    let layouts = layout_nodes
        .iter()
        .map(|n| parse_physical_layout(parser, root, *n, text))
        .collect::<Result<Vec<_>, _>>()?;

    // A document should have at most one position map; take the first.
    let position_map = map_nodes
        .first()
        .map(|n| parse_position_map(parser, *n, text))
        .transpose()?;

    Ok(ParsedLayouts {
        layouts,
        position_map,
    })
}

/// Look up a property across a merged node set and return its value node.
fn prop_value<'t>(
    parser: &DtParser,
    nodes: &[Node<'t>],
    source: &str,
    name: &str,
) -> Option<Node<'t>> {
    parser
        .property(nodes, source, name)
        .and_then(|prop| prop.child_by_field_name("value"))
}

fn parse_physical_layout(
    parser: &DtParser,
    root: Node,
    node: Node,
    source: &str,
) -> Result<PhysicalLayout, ParseError> {
    // The same layout may be amended in multiple fragments; resolve
    // properties across all of them.
    let nodes = parser.find_same_node(root, source, node);

    let display_name = match prop_value(parser, &nodes, source, "display-name") {
        Some(value) => parse_string(value, source)?,
        None => String::new(),
    };

    let transform = match prop_value(parser, &nodes, source, "transform") {
        Some(value) => parse_phandle(value, source)?,
        None => String::new(),
    };

    let kscan = match prop_value(parser, &nodes, source, "kscan") {
        Some(value) => parse_phandle(value, source)?,
        None => String::new(),
    };

    let keys = parse_phandle_array(prop_value(parser, &nodes, source, "keys"), source)?;

    Ok(PhysicalLayout {
        id: NodeId::new(node_path(node, source), node_label(node, source)),
        display_name,
        keys: parse_key_attributes(&keys, source)?,
        transform,
        kscan,
    })
}

/// Decode a `keys` phandle array into key attributes.
///
/// Cells come in fixed groups of 8: `<&key_physical_attrs w h x y rot rx ry>`.
/// Numeric cells are hundredths.
fn parse_key_attributes(cells: &[Node], source: &str) -> Result<Vec<KeyAttributes>, ParseError> {
    if cells.len() % KEY_ATTRS_SIZE != 0 {
        // cells is non-empty here, so last() can't fail
        let last = cells[cells.len() - 1];
        return Err(ParseError::new(
            &last,
            format!("Expected {KEY_ATTRS_SIZE} cells per key"),
        ));
    }

    let hundredths = |node: &Node| -> Result<f64, ParseError> {
        Ok(parse_number(*node, source)? as f64 / 100.0)
    };

    let mut result = Vec::with_capacity(cells.len() / KEY_ATTRS_SIZE);

    for chunk in cells.chunks_exact(KEY_ATTRS_SIZE) {
        let [phandle, width, height, x, y, rot, rx, ry] = chunk else {
            unreachable!("chunks_exact yields slices of KEY_ATTRS_SIZE");
        };

        if parse_phandle(*phandle, source)? != "key_physical_attrs" {
            return Err(ParseError::new(phandle, "Expected &key_physical_attrs"));
        }

        result.push(KeyAttributes {
            position: (hundredths(x)?, hundredths(y)?),
            width: hundredths(width)?,
            height: hundredths(height)?,
            rotation: hundredths(rot)?,
            origin: (hundredths(rx)?, hundredths(ry)?),
        });
    }

    Ok(result)
}

fn parse_position_map(
    parser: &DtParser,
    node: Node,
    source: &str,
) -> Result<PositionMap, ParseError> {
    let nodes = [node];
    let complete = parser.property(&nodes, source, "complete").is_some();

    let children = child_nodes(node)
        .into_iter()
        .map(|child| parse_position_map_item(parser, child, source))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PositionMap {
        id: NodeId::new(node_path(node, source), node_label(node, source)),
        complete,
        children,
    })
}

fn parse_position_map_item(
    parser: &DtParser,
    node: Node,
    source: &str,
) -> Result<PositionMapItem, ParseError> {
    let nodes = [node];

    let physical_layout = match prop_value(parser, &nodes, source, "physical-layout") {
        Some(value) => parse_phandle(value, source)?,
        None => String::new(),
    };

    let positions = match prop_value(parser, &nodes, source, "positions") {
        Some(value) => parse_array(Some(value), source)?
            .into_iter()
            .map(|index| {
                u32::try_from(index)
                    .map(Some)
                    .map_err(|_| ParseError::new(&value, "Key positions must not be negative"))
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(PositionMapItem {
        id: NodeId::new(node_path(node, source), node_label(node, source)),
        physical_layout,
        positions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
/ {
    foo_layout: foo_layout {
        compatible = "zmk,physical-layout";
        display-name = "Foo";
        transform = <&foo_transform>;
        keys  //                     w   h    x    y     rot    rx    ry
            = <&key_physical_attrs 100 100    0    0       0     0     0>
            , <&key_physical_attrs 100 100  100    0       0     0     0>
            ;
    };

    bar_layout: bar_layout {
        compatible = "zmk,physical-layout";
        display-name = "Bar";
        keys
            = <&key_physical_attrs 150 100   25   50 (-3000)   600   600>
            ;
    };

    position_map {
        compatible = "zmk,physical-layout-position-map";
        complete;

        foo {
            physical-layout = <&foo_layout>;
            positions = <0 1>;
        };

        bar {
            physical-layout = <&bar_layout>;
            positions = <0>;
        };
    };
};
"#;

    fn extract(source: &str) -> Result<ParsedLayouts, ParseError> {
        let mut parser = DtParser::new().unwrap();
        parse_layouts(&mut parser, source)
    }

    #[test]
    fn test_extract_layouts() {
        let parsed = extract(SAMPLE).unwrap();

        assert_eq!(parsed.layouts.len(), 2);

        let foo = &parsed.layouts[0];
        assert_eq!(foo.id.path, "/foo_layout");
        assert_eq!(foo.id.label, "foo_layout");
        assert_eq!(foo.display_name, "Foo");
        assert_eq!(foo.transform, "foo_transform");
        assert_eq!(foo.kscan, "");
        assert_eq!(foo.keys.len(), 2);
        assert_eq!(foo.keys[1].position, (1.0, 0.0));
        assert_eq!(foo.keys[1].width, 1.0);

        let bar = &parsed.layouts[1];
        assert_eq!(bar.keys.len(), 1);
        assert_eq!(bar.keys[0].width, 1.5);
        assert_eq!(bar.keys[0].position, (0.25, 0.5));
        assert_eq!(bar.keys[0].rotation, -30.0);
        assert_eq!(bar.keys[0].origin, (6.0, 6.0));
    }

    #[test]
    fn test_extract_position_map() {
        let parsed = extract(SAMPLE).unwrap();
        let map = parsed.position_map.unwrap();

        assert_eq!(map.id.path, "/position_map");
        assert!(map.complete);
        assert_eq!(map.children.len(), 2);
        assert_eq!(map.children[0].physical_layout, "foo_layout");
        assert_eq!(map.children[0].positions, vec![Some(0), Some(1)]);
        assert_eq!(map.children[1].physical_layout, "bar_layout");
        assert_eq!(map.children[1].positions, vec![Some(0)]);
    }

    #[test]
    fn test_no_position_map() {
        let parsed = extract(
            r#"
/ {
    layout_0 {
        compatible = "zmk,physical-layout";
        display-name = "Test";
    };
};
"#,
        )
        .unwrap();

        assert_eq!(parsed.layouts.len(), 1);
        assert!(parsed.layouts[0].keys.is_empty());
        assert!(parsed.position_map.is_none());
    }

    #[test]
    fn test_overlay_fragments_merge_with_last_occurrence_winning() {
        let parsed = extract(
            r#"
/ {
    layout: layout_0 {
        compatible = "zmk,physical-layout";
        display-name = "Original";
    };
};

&layout {
    display-name = "Amended";
    transform = <&some_transform>;
};
"#,
        )
        .unwrap();

        assert_eq!(parsed.layouts.len(), 1);
        assert_eq!(parsed.layouts[0].display_name, "Amended");
        assert_eq!(parsed.layouts[0].transform, "some_transform");
    }

    #[test]
    fn test_short_keys_chunk_is_an_error() {
        // 15 cells: one complete key plus a truncated one.
        let err = extract(
            r#"
/ {
    layout_0 {
        compatible = "zmk,physical-layout";
        keys = <&key_physical_attrs 100 100 0 0 0 0 0>,
               <&key_physical_attrs 100 100 0 0 0 0>;
    };
};
"#,
        )
        .unwrap_err();

        assert!(err.message.contains("8 cells"));
        // Positioned at the last decoded cell, which is on the second row.
        assert_eq!(err.range.start.line, 6);
    }

    #[test]
    fn test_wrong_key_phandle_is_an_error() {
        let err = extract(
            r#"
/ {
    layout_0 {
        compatible = "zmk,physical-layout";
        keys = <&other_attrs 100 100 0 0 0 0 0>;
    };
};
"#,
        )
        .unwrap_err();

        assert_eq!(err.message, "Expected &key_physical_attrs");
    }

    #[test]
    fn test_negative_position_is_an_error() {
        let err = extract(
            r#"
/ {
    position_map {
        compatible = "zmk,physical-layout-position-map";
        foo {
            physical-layout = <&foo_layout>;
            positions = <(-1)>;
        };
    };
};
"#,
        )
        .unwrap_err();

        assert!(err.message.contains("negative"));
    }
}
