use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde_json::Value;

use sanitizing_gateway::sanitize::{
    strip_markup, strip_operator_keys, SanitizeOptions, SanitizeReport, DEFAULT_MAX_DEPTH,
    DEFAULT_OPERATOR_PREFIX,
};

#[derive(Parser)]
#[command(name = "sanitize-cli")]
#[command(about = "Run the gateway's sanitizer over a JSON document", long_about = None)]
struct Cli {
    /// JSON file to sanitize. Reads stdin when omitted.
    input: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Stage::All)]
    stage: Stage,

    /// Leave arrays untouched, as the old sanitizer did
    #[arg(long)]
    legacy_arrays: bool,

    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    #[arg(long, default_value_t = DEFAULT_OPERATOR_PREFIX)]
    prefix: char,

    /// Print what was changed to stderr
    #[arg(long)]
    report: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Stage {
    /// Operator keys only
    Nosql,
    /// Markup only
    Xss,
    All,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let text = match &cli.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let mut document: Value = serde_json::from_str(&text)?;

    let options = SanitizeOptions {
        operator_prefix: cli.prefix,
        descend_into_arrays: !cli.legacy_arrays,
        max_depth: cli.max_depth,
    };

    let mut report = SanitizeReport::default();
    if cli.stage != Stage::Xss {
        report.absorb(strip_operator_keys(&mut document, &options));
    }
    if cli.stage != Stage::Nosql {
        report.absorb(strip_markup(&mut document, &options));
    }

    println!("{}", serde_json::to_string_pretty(&document)?);
    if cli.report {
        eprintln!(
            "keys removed: {}, strings rewritten: {}, subtrees truncated: {}",
            report.keys_removed, report.strings_rewritten, report.subtrees_truncated
        );
    }
    Ok(())
}
