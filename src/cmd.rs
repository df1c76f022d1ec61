//! Our command-line subcommands.

use std::path::PathBuf;

use tracing::debug;

use crate::{
    ast::parse_schema,
    collect::collect_definitions,
    errors::{format_err, Context, Error, Result},
    known_files::KnownFiles,
    schema::DefinitionTree,
};

pub mod names;
pub mod parse;

/// Parse every schema in `paths` into a single [`DefinitionTree`], in
/// command-line order. Directories are searched for `*.asn1` files.
pub fn load_schemas(files: &mut KnownFiles, paths: &[PathBuf]) -> Result<DefinitionTree> {
    let mut tree = DefinitionTree::new();
    for path in schema_files(paths)? {
        let file_id = files.add(&path)?;
        let modules = parse_schema(files, file_id)?;
        debug!(path = %path.display(), modules = modules.len(), "parsed schema");
        collect_definitions(&mut tree, files, file_id, &modules)?;
    }
    Ok(tree)
}

/// Expand directories in `paths` into the schema files they contain.
fn schema_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut schema_files = vec![];
    for path in paths {
        if !path.is_dir() {
            schema_files.push(path.clone());
            continue;
        }

        // Read directory using `glob`, which returns paths in sorted order.
        let pattern = format!("{}/**/*.asn1", path.display());
        let before = schema_files.len();
        for entry in glob::glob(&pattern).context("Failed to read schema directory")? {
            schema_files.push(entry.context("Failed to read schema file")?);
        }
        if schema_files.len() == before {
            return Err(format_err!(
                "no *.asn1 files found in {}",
                path.display()
            ));
        }
    }
    Ok(schema_files)
}
