//! QMK info.json import
//!
//! Converts the `layouts` table of a QMK `info.json` into one
//! [`PhysicalLayout`] per entry, in the order they appear in the file.

use serde::Deserialize;
use serde_json::Value;

use crate::dts::ParseError;
use crate::extract::ParsedLayouts;
use crate::kle::{json_error, value_error};
use crate::model::{KeyAttributes, NodeId, PhysicalLayout};

#[derive(Debug, Clone, Deserialize)]
pub struct QmkKey {
    pub x: f64,
    pub y: f64,
    pub w: Option<f64>,
    pub h: Option<f64>,
    pub r: Option<f64>,
    pub rx: Option<f64>,
    pub ry: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QmkLayout {
    pub layout: Vec<QmkKey>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QmkInfo {
    #[serde(default)]
    pub layouts: serde_json::Map<String, Value>,
}

/// Parse a QMK info.json into layouts for the common edit state.
pub fn parse_layouts(text: &str) -> Result<ParsedLayouts, ParseError> {
    let info: QmkInfo = serde_json::from_str(text).map_err(json_error)?;

    let mut layouts = Vec::with_capacity(info.layouts.len());
    for (key, value) in &info.layouts {
        let layout: QmkLayout = serde_json::from_value(value.clone())
            .map_err(|err| value_error(format!("Invalid layout \"{key}\": {err}")))?;

        let name = layout_node_name(key);

        layouts.push(PhysicalLayout {
            id: NodeId::new(format!("/{name}"), ""),
            display_name: layout_display_name(key),
            keys: layout.layout.iter().map(key_attributes).collect(),
            transform: String::new(),
            kscan: String::new(),
        });
    }

    Ok(ParsedLayouts {
        layouts,
        position_map: None,
    })
}

fn key_attributes(key: &QmkKey) -> KeyAttributes {
    KeyAttributes {
        position: (key.x, key.y),
        width: key.w.unwrap_or(1.0),
        height: key.h.unwrap_or(1.0),
        rotation: key.r.unwrap_or(0.0),
        origin: (key.rx.unwrap_or(0.0), key.ry.unwrap_or(0.0)),
    }
}

/// Devicetree node name for a QMK layout key.
pub fn layout_node_name(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Human-readable name for a QMK layout key.
pub fn layout_display_name(key: &str) -> String {
    let name = key.strip_prefix("LAYOUT_").unwrap_or(key);
    name.replace('_', " ").trim().to_string()
}
