use std::process::exit;

use clap::Parser;

mod ast;
mod cmd;
mod collect;
mod errors;
mod known_files;
mod naming;
mod sanitize;
mod schema;
mod util;

use cmd::{
    names::{cmd_names, NamesOpt},
    parse::{cmd_parse, ParseOpt},
};
use known_files::KnownFiles;
use tracing::info_span;

#[derive(Debug, Parser)]
#[clap(version, about = "Generate C identifiers for ASN.1 definitions")]
enum Opt {
    /// Parse ASN.1 schema files and print their definitions.
    Parse(ParseOpt),
    /// Generate C names for ASN.1 definitions, and report name clashes.
    Names(NamesOpt),
}

fn main() {
    // Configure tracing.
    tracing_subscriber::fmt::init();
    let _span = info_span!("asn1-names").entered();

    // One `KnownFiles` per run, shared by every schema we parse.
    let mut files = KnownFiles::new();

    let opt = Opt::parse();
    let result = match &opt {
        Opt::Parse(parse_opt) => cmd_parse(&mut files, parse_opt),
        Opt::Names(names_opt) => cmd_names(&mut files, names_opt),
    };
    if let Err(e) = result {
        e.emit(&files);
        exit(1);
    }
}
