mod cli;

use std::fs;
use std::io::Read;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{CliArgs, ImportFormat};
use zmk_layout_helper::{extract, format_layout, kle, qmk, DtParser, EditState, FormatOptions};

fn main() -> Result<()> {
    zmk_layout_helper::tracing::init();

    let args = CliArgs::parse();

    let source = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let parsed = match args.format {
        ImportFormat::Devicetree => {
            let mut parser = DtParser::new()?;
            extract::parse_layouts(&mut parser, &source)?
        }
        ImportFormat::Kle => kle::parse_layouts(&source)?,
        ImportFormat::Qmk => qmk::parse_layouts(&source)?,
    };

    let state = EditState::from(parsed);
    if state.layouts.is_empty() {
        tracing::warn!("no physical layouts found in the input");
    }

    let options = FormatOptions {
        indent_width: args.indent,
        position_map_columns: args.columns,
        include_layouts: args.include_layouts,
    };

    let output = format_layout(&state, &options);

    match &args.output {
        Some(path) => fs::write(path, output + "\n")
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{output}"),
    }

    Ok(())
}
