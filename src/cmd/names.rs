//! Generate C names for every definition in a set of schemas.

use std::{iter, path::PathBuf};

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    errors::{Context, Result},
    known_files::KnownFiles,
    naming::{NameBundle, Namer, NamingOptions, DEFAULT_MAX_CLASHES},
    sanitize::CSanitizer,
    schema::{DefId, DefKind, Definition, DefinitionTree},
};

use super::load_schemas;

/// How to print the generated names.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per line, per definition.
    Json,
}

/// Generate C names for schema definitions and check them for clashes.
#[derive(Debug, Parser)]
pub struct NamesOpt {
    /// Schema files, or directories containing `*.asn1` files.
    #[clap(required = true)]
    paths: Vec<PathBuf>,

    /// Give nested types with named members hierarchical names, like
    /// `Outer__inner`.
    #[clap(long)]
    compound_names: bool,

    /// The maximum number of name clashes to report.
    #[clap(long, default_value_t = DEFAULT_MAX_CLASHES)]
    max_clashes: usize,

    /// Output format.
    #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Everything we generated for one definition.
#[derive(Debug, Serialize)]
struct DefinitionNames<'a> {
    module: &'a str,
    identifier: &'a str,
    kind: DefKind,
    line: usize,
    #[serde(flatten)]
    names: NameBundle,
    /// Field names of the members of a constructed type.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    member_fields: Vec<String>,
    /// Presence values of a `CHOICE`, starting with the "nothing" value.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    presence_values: Vec<String>,
}

/// Name every definition, print the names, and fail if any of them clash.
#[instrument(skip(files, opt))]
pub fn cmd_names(files: &mut KnownFiles, opt: &NamesOpt) -> Result<()> {
    let tree = load_schemas(files, &opt.paths)?;

    let sanitizer = CSanitizer;
    let options = NamingOptions {
        compound_names: opt.compound_names,
    };
    let mut namer = Namer::new(&tree, &sanitizer, options);

    for (id, def) in tree.iter() {
        // Leaf members don't get a type of their own. They only show up as
        // member fields of their container.
        if def.parent.is_some() && !declares_type(def) {
            continue;
        }
        let names = definition_names(&tree, &mut namer, id);
        match opt.format {
            OutputFormat::Text => print_text(&names),
            OutputFormat::Json => {
                let json =
                    serde_json::to_string(&names).context("could not serialize names")?;
                println!("{}", json);
            }
        }
    }

    info!(
        definitions = tree.len(),
        names = namer.registry().len(),
        clashes = namer.registry().clash_count(),
        "naming finished"
    );
    namer
        .registry()
        .report_clashes(&tree, files, opt.max_clashes)
}

/// Generate all the names for `id`. Top-level definitions are named as
/// declarations; nested ones as members of their container.
fn definition_names<'a>(
    tree: &'a DefinitionTree,
    namer: &mut Namer<'_>,
    id: DefId,
) -> DefinitionNames<'a> {
    let def = tree.get(id);
    let names = if def.parent.is_none() {
        namer.generate_names(id)
    } else {
        namer.generate_embedded_names(id)
    };

    let member_fields = if def.kind.is_constructed() {
        def.children
            .iter()
            .map(|&child| namer.member_field_name(id, &tree.get(child).identifier))
            .collect()
    } else {
        vec![]
    };

    let presence_values = if def.kind.has_presence() {
        iter::once(None)
            .chain(def.children.iter().copied().map(Some))
            .map(|child| namer.presence_value_name(id, child))
            .collect()
    } else {
        vec![]
    };

    DefinitionNames {
        module: &tree.module_of(id).name,
        identifier: &def.identifier,
        kind: def.kind,
        line: def.line,
        names,
        member_fields,
        presence_values,
    }
}

/// Does `def` need a C declaration of its own when nested: a `struct` for
/// constructed types, or an `enum` for named values?
fn declares_type(def: &Definition) -> bool {
    def.kind.is_constructed() || !def.named_values.is_empty()
}

fn print_text(names: &DefinitionNames<'_>) {
    println!(
        "{}.{} ({}, line {})",
        names.module, names.identifier, names.kind, names.line
    );
    let bundle = &names.names;
    for (label, value) in [
        ("base_name", &bundle.base_name),
        ("short_name", &bundle.short_name),
        ("full_name", &bundle.full_name),
        ("as_member_name", &bundle.as_member_name),
        ("presence_enum_type", &bundle.presence_enum_type),
        ("presence_enum_prefix", &bundle.presence_enum_prefix),
        ("members_enum_type", &bundle.members_enum_type),
        ("members_enum_prefix", &bundle.members_enum_prefix),
    ] {
        println!("  {:<20} {}", label, value);
    }
    if !names.member_fields.is_empty() {
        println!("  {:<20} {}", "member_fields", names.member_fields.join(" "));
    }
    if !names.presence_values.is_empty() {
        println!(
            "  {:<20} {}",
            "presence_values",
            names.presence_values.join(" ")
        );
    }
}
