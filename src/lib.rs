//! confnorm - one-shot configuration canonicalizer
//!
//! Reads a raw configuration source (TOML or JSON, from a file or stdin),
//! validates it against the build-time schema, resolves `${VAR}` placeholders
//! and defaults from an environment snapshot, and emits one canonical JSON
//! document. Built to run once as a container entrypoint; every failure is
//! fatal with an error-class-specific exit code.

pub mod error;
pub mod loader;
pub mod pipeline;
pub mod resolver;
pub mod schema;
pub mod serializer;
pub mod validator;

pub use error::{PipelineError, PipelineResult};
pub use loader::{LoadError, RawDocument, Source, SourceFormat};
pub use pipeline::{run, run_to_output, PipelineOptions};
pub use resolver::{EnvSnapshot, ResolutionError, ResolvedDocument};
pub use schema::{FieldSpec, Kind, Schema};
pub use serializer::{CanonicalOutput, OutputTarget, WriteError};
pub use validator::{
    ParseError, UnknownKeyPolicy, ValidatedDocument, ValidationError, Violation,
};
