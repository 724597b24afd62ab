//! confnorm CLI
//!
//! Entry point for the `confnorm` command-line tool.

use clap::Parser;
use confnorm::{
    pipeline, EnvSnapshot, OutputTarget, PipelineOptions, Schema, Source, UnknownKeyPolicy,
};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "confnorm")]
#[command(about = "Normalize a configuration source into canonical JSON", version)]
struct Cli {
    /// Input path ("-" or omitted reads standard input)
    input: Option<PathBuf>,

    /// Output path (default: standard output)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Reject keys the schema does not declare instead of dropping them
    #[arg(long)]
    deny_unknown: bool,

    /// Report stage progress and the input digest on stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let source = match cli.input {
        Some(path) if path != Path::new("-") => Source::Path(path),
        _ => Source::Stdin,
    };

    let target = match cli.output {
        Some(path) => OutputTarget::Path(path),
        None => OutputTarget::Stdout,
    };

    let opts = PipelineOptions {
        unknown_keys: if cli.deny_unknown {
            UnknownKeyPolicy::Deny
        } else {
            UnknownKeyPolicy::Ignore
        },
        verbose: cli.verbose,
    };

    // The only environment read in the whole run.
    let env = EnvSnapshot::from_process();

    if let Err(e) = pipeline::run(&source, &target, &Schema::builtin(), &env, &opts) {
        eprintln!("error: {}", e);
        process::exit(e.exit_code());
    }
}
