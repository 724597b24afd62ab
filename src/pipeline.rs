//! Pipeline orchestration
//!
//! Runs the four stages strictly forward: Load → Validate → Resolve →
//! Serialize. The first failing stage aborts the run; nothing is retried
//! and no output is written on failure.

use crate::error::PipelineResult;
use crate::loader::{self, Source};
use crate::resolver::{self, EnvSnapshot};
use crate::schema::Schema;
use crate::serializer::{self, CanonicalOutput, OutputTarget};
use crate::validator::{self, UnknownKeyPolicy};

/// Per-run options
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Policy for input keys the schema does not declare
    pub unknown_keys: UnknownKeyPolicy,

    /// Report stage progress and the input digest on stderr
    pub verbose: bool,
}

/// Run the pipeline and return the canonical document without writing it.
pub fn run_to_output(
    source: &Source,
    schema: &Schema,
    env: &EnvSnapshot,
    opts: &PipelineOptions,
) -> PipelineResult<CanonicalOutput> {
    let raw = loader::load(source)?;
    if opts.verbose {
        eprintln!(
            "loaded {} ({} bytes, sha256 {})",
            raw.origin,
            raw.text.len(),
            raw.digest
        );
    }

    let tree = validator::parse(&raw)?;
    let validated = validator::validate(tree, schema, opts.unknown_keys)?;
    if opts.verbose {
        eprintln!("validated against {} declared fields", schema.fields().len());
    }

    let resolved = resolver::resolve(validated, schema, env)?;
    let output = serializer::serialize(&resolved)?;
    if opts.verbose {
        eprintln!("canonical output: {} bytes", output.text.len());
    }

    Ok(output)
}

/// Run the pipeline end to end, writing the canonical document.
pub fn run(
    source: &Source,
    target: &OutputTarget,
    schema: &Schema,
    env: &EnvSnapshot,
    opts: &PipelineOptions,
) -> PipelineResult<()> {
    let output = run_to_output(source, schema, env, opts)?;
    serializer::write(&output, target)?;
    Ok(())
}
