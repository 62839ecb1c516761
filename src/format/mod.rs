//! Deterministic devicetree formatting
//!
//! Serializes an [`EditState`] back into canonical devicetree text. Output
//! depends only on the state and options: node order follows layout order,
//! properties render in a fixed sequence, and arrays wrap at a fixed column
//! count, so formatting the same state twice is byte-for-byte identical.

pub mod node;
pub mod tree;

pub use node::{
    ArrayProperty, BooleanProperty, Formattable, KeyAttributesProperty, Node, PhandleProperty,
    StringProperty,
};
pub use tree::Tree;

use crate::extract::{PHYSICAL_LAYOUT_COMPATIBLE, POSITION_MAP_COMPATIBLE};
use crate::model::EditState;

/// Output options for [`format_layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Spaces per indentation level, clamped to 2-8.
    pub indent_width: usize,
    /// Values per row in `positions` arrays, clamped to at most 25.
    /// 0 means never wrap.
    pub position_map_columns: usize,
    /// Emit the physical layout nodes in addition to the position map.
    pub include_layouts: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_width: 4,
            position_map_columns: 16,
            include_layouts: false,
        }
    }
}

impl FormatOptions {
    fn indent_prefix(&self) -> String {
        " ".repeat(self.indent_width.clamp(2, 8))
    }

    fn columns(&self) -> usize {
        self.position_map_columns.min(25)
    }
}

/// Serialize the edit state as a devicetree fragment.
pub fn format_layout(state: &EditState, options: &FormatOptions) -> String {
    let mut tree = Tree::new();

    if options.include_layouts {
        for layout in &state.layouts {
            let node = tree.add_node(&layout.id.path, &layout.id.label);

            node.add_child(Formattable::String(StringProperty {
                name: "compatible".to_string(),
                value: PHYSICAL_LAYOUT_COMPATIBLE.to_string(),
            }));
            node.add_child(Formattable::String(StringProperty {
                name: "display-name".to_string(),
                value: layout.display_name.clone(),
            }));

            if !layout.kscan.is_empty() {
                node.add_child(Formattable::Phandle(PhandleProperty {
                    name: "kscan".to_string(),
                    label: layout.kscan.clone(),
                }));
            }

            if !layout.transform.is_empty() {
                node.add_child(Formattable::Phandle(PhandleProperty {
                    name: "transform".to_string(),
                    label: layout.transform.clone(),
                }));
            }

            node.add_spacer();
            node.add_child(Formattable::KeyAttributes(KeyAttributesProperty {
                keys: layout.keys.clone(),
            }));
        }
    }

    let map = tree.add_node(&state.position_map.id.path, &state.position_map.id.label);
    map.add_child(Formattable::String(StringProperty {
        name: "compatible".to_string(),
        value: POSITION_MAP_COMPATIBLE.to_string(),
    }));

    if state.position_map.complete {
        map.add_spacer();
        map.add_child(Formattable::Boolean(BooleanProperty {
            name: "complete".to_string(),
        }));
    }

    for item in &state.position_map.children {
        let node = tree.add_node(&item.id.path, &item.id.label);
        node.add_child(Formattable::Phandle(PhandleProperty {
            name: "physical-layout".to_string(),
            label: item.physical_layout.clone(),
        }));

        // Unassigned slots are omitted from the output array.
        node.add_child(Formattable::Array(ArrayProperty {
            name: "positions".to_string(),
            values: item.positions.iter().flatten().map(|&v| v as i64).collect(),
            columns: options.columns(),
        }));
    }

    tree.root.render(&options.indent_prefix())
}
