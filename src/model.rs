//! Domain model for physical layouts and position maps
//!
//! These types are the common target of every importer (devicetree, KLE,
//! QMK) and the input to the formatter. [`EditState`] is the single value a
//! host mutates between import and export.

use serde::{Deserialize, Serialize};

use crate::extract::ParsedLayouts;

/// Identity of a devicetree node: an absolute slash-separated path plus an
/// optional label used for reference-style formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeId {
    pub path: String,
    pub label: String,
}

impl NodeId {
    pub fn new(path: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
        }
    }
}

/// Geometry of one physical key, in grid units.
///
/// Devicetree stores these as hundredths; they are divided by 100 at decode
/// time and multiplied back on export, so anything beyond two decimal digits
/// is lost by design.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyAttributes {
    pub position: (f64, f64),
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Rotation pivot.
    pub origin: (f64, f64),
}

/// A named set of physical key positions for one unit of a keyboard.
///
/// Key order is semantic: the index of a key is its logical key index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalLayout {
    #[serde(flatten)]
    pub id: NodeId,
    pub display_name: String,
    pub keys: Vec<KeyAttributes>,
    /// Matrix transform phandle label, or empty.
    pub transform: String,
    /// Kscan phandle label, or empty.
    pub kscan: String,
}

/// One row of a position map: for a single layout, maps map slots to
/// physical key indices.
///
/// `positions[slot]` holds the key index assigned to that slot, or `None`
/// when the slot is unassigned. A concrete key index appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionMapItem {
    #[serde(flatten)]
    pub id: NodeId,
    /// Label of the physical layout this item maps.
    pub physical_layout: String,
    pub positions: Vec<Option<u32>>,
}

/// Aligns multiple physical layouts to one logical keymap.
///
/// Items are parallel: slot `i` across all children represents one group
/// entry. After normalization there is exactly one child per known layout,
/// in layout order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionMap {
    #[serde(flatten)]
    pub id: NodeId,
    /// Disables best-effort fallback matching in downstream consumers.
    pub complete: bool,
    pub children: Vec<PositionMapItem>,
}

/// The complete editable state, rebuilt once per successful import and then
/// mutated only through the position-map editor operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditState {
    pub layouts: Vec<PhysicalLayout>,
    pub position_map: PositionMap,
    /// Upper bound on logical key indices considered real. Only affects which
    /// unused slots a UI exposes, not storage.
    pub key_count: u32,
}

impl EditState {
    /// Build a normalized edit state from an import result.
    ///
    /// Ensures every layout has a label, synthesizes a position map if none
    /// was imported, and aligns the map's children with the layouts (one item
    /// per layout, in layout order, keyed by the layout label).
    pub fn new(layouts: Vec<PhysicalLayout>, position_map: Option<PositionMap>) -> Self {
        // Layouts must have labels: they are addressed by label everywhere
        // else, so default from the path tail or synthesize one.
        let layouts: Vec<PhysicalLayout> = layouts
            .into_iter()
            .enumerate()
            .map(|(i, mut layout)| {
                if layout.id.label.is_empty() {
                    layout.id.label = layout
                        .id
                        .path
                        .rsplit('/')
                        .next()
                        .filter(|tail| !tail.is_empty())
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("layout_{i}"));
                }
                layout
            })
            .collect();

        let mut map = PositionMap {
            id: match &position_map {
                Some(m) => m.id.clone(),
                None => NodeId::new("/position_map", ""),
            },
            complete: position_map.as_ref().is_some_and(|m| m.complete),
            children: Vec::with_capacity(layouts.len()),
        };

        for layout in &layouts {
            let existing = position_map
                .as_ref()
                .and_then(|m| {
                    m.children
                        .iter()
                        .find(|item| item.physical_layout == layout.id.label)
                })
                .cloned();

            map.children.push(existing.unwrap_or_else(|| PositionMapItem {
                id: NodeId::new(format!("{}/{}", map.id.path, layout.id.label), ""),
                physical_layout: layout.id.label.clone(),
                positions: Vec::new(),
            }));
        }

        let key_count = min_key_count(&layouts, &map);

        Self {
            layouts,
            position_map: map,
            key_count,
        }
    }
}

impl Default for EditState {
    fn default() -> Self {
        Self::new(Vec::new(), None)
    }
}

impl From<ParsedLayouts> for EditState {
    fn from(parsed: ParsedLayouts) -> Self {
        Self::new(parsed.layouts, parsed.position_map)
    }
}

/// The smallest key count consistent with the imported data: at least the
/// size of the largest layout and larger than any key index referenced in
/// the position map.
pub fn min_key_count(layouts: &[PhysicalLayout], map: &PositionMap) -> u32 {
    let max_keys = layouts.iter().map(|l| l.keys.len()).max().unwrap_or(0) as u32;

    let max_mapped = map
        .children
        .iter()
        .flat_map(|item| item.positions.iter().flatten())
        .max()
        .map(|&index| index + 1)
        .unwrap_or(0);

    max_keys.max(max_mapped)
}
