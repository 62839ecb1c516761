//! Devicetree syntax layer
//!
//! Wraps the tree-sitter devicetree grammar with node queries ([`parser`],
//! [`node`]) and typed value decoding ([`decode`]). All decode failures are
//! reported as a [`ParseError`] carrying the offending source span.

pub mod decode;
pub mod error;
pub mod node;
pub mod parser;

pub use decode::{parse_array, parse_number, parse_phandle, parse_phandle_array, parse_string};
pub use error::{ParseError, Position, Range};
pub use parser::DtParser;
