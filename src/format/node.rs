//! Formattable output nodes
//!
//! A closed set of variants describing everything the formatter can emit:
//! nodes, blank spacer lines, and the property flavors used by layouts and
//! position maps. Each variant renders itself; [`Node`] renders its children
//! recursively with one extra level of indentation.

use crate::model::KeyAttributes;
use crate::util::{dtnum, indent, max_digits};

/// Phandle target for one key's attributes in a `keys` property.
pub const KEY_ATTRS_PHANDLE: &str = "key_physical_attrs";

/// Column widths for the `keys` property: w, h, x, y, rot, rx, ry.
const KEY_ATTRS_WIDTHS: [usize; 7] = [3, 3, 4, 4, 7, 6, 6];

/// Column header comment aligned with [`KEY_ATTRS_WIDTHS`].
const KEY_ATTRS_HEADER: &str =
    "keys  //                     w   h    x    y     rot     rx     ry";

#[derive(Debug, Clone)]
pub enum Formattable {
    Node(Node),
    /// A blank separator line.
    Spacer,
    Boolean(BooleanProperty),
    String(StringProperty),
    Phandle(PhandleProperty),
    Array(ArrayProperty),
    KeyAttributes(KeyAttributesProperty),
}

impl Formattable {
    pub fn render(&self, prefix: &str) -> String {
        match self {
            Formattable::Node(node) => node.render(prefix),
            Formattable::Spacer => String::new(),
            Formattable::Boolean(prop) => format!("{};", prop.name),
            Formattable::String(prop) => format!("{} = \"{}\";", prop.name, prop.value),
            Formattable::Phandle(prop) => format!("{} = <&{}>;", prop.name, prop.label),
            Formattable::Array(prop) => prop.render(prefix),
            Formattable::KeyAttributes(prop) => prop.render(prefix),
        }
    }
}

/// A devicetree node with an ordered list of formattable children.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub label: String,
    pub(crate) children: Vec<Formattable>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            children: Vec::new(),
        }
    }

    /// Add a child, inserting a blank line before nested nodes so sibling
    /// nodes are visually separated. Properties never get separators.
    pub fn add_child(&mut self, child: Formattable) {
        if matches!(child, Formattable::Node(_)) && !self.children.is_empty() {
            self.add_spacer();
        }

        self.children.push(child);
    }

    pub fn add_spacer(&mut self) {
        self.children.push(Formattable::Spacer);
    }

    pub(crate) fn child_node_index(&self, name: &str) -> Option<usize> {
        self.children.iter().position(|c| match c {
            Formattable::Node(n) => n.name == name,
            _ => false,
        })
    }

    pub fn render(&self, prefix: &str) -> String {
        let identifier = if self.label.is_empty() {
            self.name.clone()
        } else {
            format!("{}: {}", self.label, self.name)
        };

        let contents = self
            .children
            .iter()
            .map(|c| c.render(prefix))
            .collect::<Vec<_>>()
            .join("\n");

        format!("{identifier} {{\n{}\n}};", indent(&contents, prefix))
    }
}

#[derive(Debug, Clone)]
pub struct BooleanProperty {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct StringProperty {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct PhandleProperty {
    pub name: String,
    pub label: String,
}

/// Devicetree number array property.
///
/// Fits on one line when the value count is at most `columns` (or always,
/// when `columns` is 0):
///
/// ```text
/// name = <1 2 3 4 5 6 7 8 9 10 11 12>;
/// ```
///
/// Otherwise wraps into aligned rows of `columns` values:
///
/// ```text
/// name
///     = < 1  2  3  4>
///     , < 5  6  7  8>
///     , < 9 10 11 12>
///     ;
/// ```
#[derive(Debug, Clone)]
pub struct ArrayProperty {
    pub name: String,
    pub values: Vec<i64>,
    pub columns: usize,
}

impl ArrayProperty {
    fn render(&self, prefix: &str) -> String {
        let digits = if self.columns > 0 {
            max_digits(&self.values)
        } else {
            0
        };

        if self.columns == 0 || self.values.len() <= self.columns {
            return format!("{} = {};", self.name, format_row(&self.values, digits));
        }

        let rows = self
            .values
            .chunks(self.columns)
            .map(|row| format_row(row, digits))
            .collect::<Vec<_>>()
            .join(&format!("\n{prefix}, "));

        format!("{}\n{prefix}= {rows}\n{prefix};", self.name)
    }
}

fn format_row(row: &[i64], digits: usize) -> String {
    let values = row
        .iter()
        .map(|&x| dtnum(x, digits))
        .collect::<Vec<_>>()
        .join(" ");

    format!("<{values}>")
}

/// The `keys` property of a physical layout: one 8-cell row per key, with a
/// fixed-width column header comment.
///
/// Each numeric field is re-multiplied by 100 and rounded, inverting the
/// hundredths decoding done on import.
#[derive(Debug, Clone)]
pub struct KeyAttributesProperty {
    pub keys: Vec<KeyAttributes>,
}

impl KeyAttributesProperty {
    fn render(&self, prefix: &str) -> String {
        let items = self
            .keys
            .iter()
            .map(key_row)
            .collect::<Vec<_>>()
            .join(&format!("\n{prefix}, "));

        format!("{KEY_ATTRS_HEADER}\n{prefix}= {items}\n{prefix};")
    }
}

fn key_row(key: &KeyAttributes) -> String {
    let fields = [
        key.width,
        key.height,
        key.position.0,
        key.position.1,
        key.rotation,
        key.origin.0,
        key.origin.1,
    ];

    let mut row = format!("<&{KEY_ATTRS_PHANDLE}");
    for (value, width) in fields.iter().zip(KEY_ATTRS_WIDTHS) {
        let encoded = (value * 100.0).round() as i64;
        row.push(' ');
        row.push_str(&dtnum(encoded, width));
    }
    row.push('>');
    row
}
