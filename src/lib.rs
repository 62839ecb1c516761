//! ZMK physical layout import/edit/export pipeline
//!
//! This crate turns a devicetree source fragment describing keyboard
//! physical layouts (and an optional position map) into an editable domain
//! model, provides pure editing operations over the position map, and
//! serializes the model back into canonical devicetree text.
//!
//! The pipeline is synchronous end to end:
//!
//! ```text
//! source text -> DtParser -> extract -> EditState -> posmap edits -> format
//! ```
//!
//! KLE and QMK JSON importers feed the same model, bypassing the devicetree
//! extractor.

pub mod dts;
pub mod extract;
pub mod format;
pub mod kle;
pub mod model;
pub mod posmap;
pub mod qmk;
pub mod tracing;
pub mod util;

// Re-export commonly used types
pub use dts::{DtParser, ParseError};
pub use extract::{parse_layouts, ParsedLayouts};
pub use format::{format_layout, FormatOptions};
pub use model::{
    EditState, KeyAttributes, NodeId, PhysicalLayout, PositionMap, PositionMapItem,
};
