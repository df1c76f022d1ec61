//! Parse schema files and print the definitions we found.

use std::path::PathBuf;

use clap::Parser;
use tracing::instrument;

use crate::{errors::Result, known_files::KnownFiles};

use super::load_schemas;

/// Parse schema files and print their definitions.
#[derive(Debug, Parser)]
pub struct ParseOpt {
    /// Schema files, or directories containing `*.asn1` files.
    #[clap(required = true)]
    paths: Vec<PathBuf>,
}

/// Print every definition, indented by nesting depth.
#[instrument(skip(files, opt))]
pub fn cmd_parse(files: &mut KnownFiles, opt: &ParseOpt) -> Result<()> {
    let tree = load_schemas(files, &opt.paths)?;

    let mut current_module = None;
    for (id, def) in tree.iter() {
        if current_module != Some(def.module) {
            let module = tree.module(def.module);
            println!("{} ({})", module.name, module.source_file.display());
            current_module = Some(def.module);
        }

        let indent = 2 * (tree.depth(id) + 1);
        let mut line = format!("{:indent$}{} {}", "", def.identifier, def.kind);
        if def.anonymous {
            line.push_str(" (anonymous)");
        }
        if !def.named_values.is_empty() {
            line.push_str(&format!(" {{ {} }}", def.named_values.join(", ")));
        }
        println!("{} at line {}", line, def.line);
    }

    println!("Parsed {} definitions", tree.len());
    Ok(())
}
