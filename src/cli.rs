//! Command-line argument parsing

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Import a keyboard layout description and re-export it as a canonical
/// devicetree fragment.
#[derive(Parser, Debug)]
#[command(name = "zmk-layout-helper", version, about)]
pub struct CliArgs {
    /// Input file (reads stdin if omitted)
    pub input: Option<PathBuf>,

    /// Input format
    #[arg(short, long, value_enum, default_value_t = ImportFormat::Devicetree)]
    pub format: ImportFormat,

    /// Indentation width in spaces (2-8)
    #[arg(long, default_value_t = 4)]
    pub indent: usize,

    /// Values per row in position arrays before wrapping (0 = never wrap)
    #[arg(long, default_value_t = 16)]
    pub columns: usize,

    /// Also emit the physical layout nodes, not just the position map
    #[arg(short = 'l', long)]
    pub include_layouts: bool,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportFormat {
    /// Devicetree source with zmk,physical-layout nodes
    Devicetree,
    /// keyboard-layout-editor.com JSON
    Kle,
    /// QMK info.json
    Qmk,
}
