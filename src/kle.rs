//! keyboard-layout-editor.com JSON import
//!
//! Parses KLE keyboard data into the same [`PhysicalLayout`] model the
//! devicetree importer produces. KLE serializes a keyboard as an array of
//! rows, optionally preceded by a metadata object; key properties are a
//! running state that applies to every following key in the row.
//!
//! Multiple keyboards may be supplied as concatenated top-level arrays.

use serde_json::{Map, Value};

use crate::dts::error::{ParseError, Position, Range};
use crate::extract::ParsedLayouts;
use crate::model::{KeyAttributes, NodeId, PhysicalLayout};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KleKeyboard {
    pub name: String,
    pub keys: Vec<KeyAttributes>,
}

/// Parse KLE JSON into layouts for the common edit state.
pub fn parse_layouts(text: &str) -> Result<ParsedLayouts, ParseError> {
    let keyboards = parse_kle(text)?;

    let layouts = keyboards
        .into_iter()
        .enumerate()
        .map(|(i, keyboard)| {
            let name = if keyboard.name.is_empty() {
                format!("layout_{i}")
            } else {
                node_name(&keyboard.name)
            };

            PhysicalLayout {
                id: NodeId::new(format!("/{name}"), ""),
                display_name: keyboard.name,
                keys: keyboard.keys,
                transform: String::new(),
                kscan: String::new(),
            }
        })
        .collect();

    Ok(ParsedLayouts {
        layouts,
        position_map: None,
    })
}

/// Parse one or more KLE keyboards from JSON text.
pub fn parse_kle(text: &str) -> Result<Vec<KleKeyboard>, ParseError> {
    let mut result = Vec::new();

    for value in serde_json::Deserializer::from_str(text).into_iter::<Value>() {
        let value = value.map_err(json_error)?;
        if let Value::Array(rows) = value {
            result.push(parse_kle_keyboard(rows)?);
        }
    }

    Ok(result)
}

/// Running key state while walking rows. Width and height reset to 1 after
/// each key; rotation state persists until changed.
#[derive(Debug, Clone, Copy)]
struct KeyCursor {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    r: f64,
    rx: f64,
    ry: f64,
}

fn parse_kle_keyboard(mut rows: Vec<Value>) -> Result<KleKeyboard, ParseError> {
    let mut keyboard = KleKeyboard::default();
    let mut cursor = KeyCursor {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
        r: 0.0,
        rx: 0.0,
        ry: 0.0,
    };

    // A leading non-array element is keyboard metadata.
    if rows.first().is_some_and(|v| !v.is_array()) {
        let meta = rows.remove(0);
        if let Some(name) = meta.get("name").and_then(Value::as_str) {
            keyboard.name = name.to_string();
        }
    }

    for row in rows {
        let Value::Array(row) = row else {
            return Err(value_error(format!("Expected an array but got {row}")));
        };

        for item in row {
            match item {
                // A string is a key's legend; emit a key at the cursor.
                Value::String(_) => {
                    keyboard.keys.push(KeyAttributes {
                        position: (cursor.x, cursor.y),
                        width: cursor.w,
                        height: cursor.h,
                        rotation: cursor.r,
                        origin: (cursor.rx, cursor.ry),
                    });

                    cursor.x += cursor.w;
                    cursor.w = 1.0;
                    cursor.h = 1.0;
                }
                Value::Object(props) => {
                    if let Some(r) = number(&props, "r")? {
                        cursor.r = r;
                    }
                    if let Some(rx) = number(&props, "rx")? {
                        cursor.rx = rx;
                        cursor.x = rx;
                        cursor.y = cursor.ry;
                    }
                    if let Some(ry) = number(&props, "ry")? {
                        cursor.y = ry;
                        cursor.ry = ry;
                    }

                    cursor.x += number(&props, "x")?.unwrap_or(0.0);
                    cursor.y += number(&props, "y")?.unwrap_or(0.0);
                    cursor.w = number(&props, "w")?.unwrap_or(1.0);
                    cursor.h = number(&props, "h")?.unwrap_or(1.0);
                }
                other => {
                    return Err(value_error(format!("Expected key object but got {other}")));
                }
            }
        }

        cursor.y += 1.0;
        cursor.x = cursor.rx;
    }

    Ok(keyboard)
}

fn number(props: &Map<String, Value>, key: &str) -> Result<Option<f64>, ParseError> {
    match props.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| value_error(format!("Expected a number for \"{key}\" but got {value}"))),
    }
}

/// A devicetree-safe node name derived from a keyboard name.
fn node_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

pub(crate) fn json_error(err: serde_json::Error) -> ParseError {
    let position = Position {
        line: err.line().max(1),
        column: err.column().max(1),
    };

    ParseError::with_range(
        Range {
            start: position,
            end: position,
        },
        err.to_string(),
    )
}

pub(crate) fn value_error(message: String) -> ParseError {
    ParseError::with_range(Range::default(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_rows() {
        let keyboards = parse_kle(r#"[["a", "b"], ["c"]]"#).unwrap();
        assert_eq!(keyboards.len(), 1);

        let keys = &keyboards[0].keys;
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0].position, (0.0, 0.0));
        assert_eq!(keys[1].position, (1.0, 0.0));
        assert_eq!(keys[2].position, (0.0, 1.0));
        assert_eq!(keys[0].width, 1.0);
    }

    #[test]
    fn test_metadata_name() {
        let keyboards = parse_kle(r#"[{"name": "My Board"}, ["a"]]"#).unwrap();
        assert_eq!(keyboards[0].name, "My Board");
        assert_eq!(keyboards[0].keys.len(), 1);
    }

    #[test]
    fn test_width_applies_to_next_key_only() {
        let keyboards = parse_kle(r#"[[{"w": 2}, "a", "b"]]"#).unwrap();

        let keys = &keyboards[0].keys;
        assert_eq!(keys[0].width, 2.0);
        assert_eq!(keys[1].width, 1.0);
        // The wide key advances the cursor by its width.
        assert_eq!(keys[1].position.0, 2.0);
    }

    #[test]
    fn test_offsets_accumulate() {
        let keyboards = parse_kle(r#"[[{"x": 0.5}, "a"], [{"y": 0.25}, "b"]]"#).unwrap();

        let keys = &keyboards[0].keys;
        assert_eq!(keys[0].position, (0.5, 0.0));
        assert_eq!(keys[1].position, (0.0, 1.25));
    }

    #[test]
    fn test_rotation_origin_moves_cursor() {
        let keyboards = parse_kle(r#"[[{"r": 15, "rx": 3, "ry": 2}, "a"]]"#).unwrap();

        let key = keyboards[0].keys[0];
        assert_eq!(key.rotation, 15.0);
        assert_eq!(key.origin, (3.0, 2.0));
        assert_eq!(key.position, (3.0, 2.0));
    }

    #[test]
    fn test_non_array_row_is_an_error() {
        assert!(parse_kle(r#"[["a"], 5]"#).is_err());
    }

    #[test]
    fn test_invalid_json_reports_position() {
        let err = parse_kle("[[\"a\",\n  oops]]").unwrap_err();
        assert_eq!(err.range.start.line, 2);
    }

    #[test]
    fn test_layouts_get_paths_from_names() {
        let parsed = parse_layouts(r#"[{"name": "My Board"}, ["a"]]"#).unwrap();
        assert_eq!(parsed.layouts.len(), 1);
        assert_eq!(parsed.layouts[0].id.path, "/my_board");
        assert_eq!(parsed.layouts[0].display_name, "My Board");
        assert!(parsed.position_map.is_none());
    }
}
