//! Pipeline error taxonomy
//!
//! Every stage failure is fatal; the wrapper maps each error class to a
//! distinct exit code so callers can tell failure classes apart without
//! parsing stderr.

use crate::loader::LoadError;
use crate::resolver::ResolutionError;
use crate::serializer::WriteError;
use crate::validator::{ParseError, ValidationError};

/// Top-level pipeline error
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("write error: {0}")]
    Write(#[from] WriteError),
}

impl PipelineError {
    /// Exit code for this error class
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Load(_) => 10,
            PipelineError::Parse(_) => 20,
            PipelineError::Validation(_) => 30,
            PipelineError::Resolution(_) => 40,
            PipelineError::Write(_) => 50,
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_class() {
        let load = PipelineError::Load(LoadError::Empty("x".to_string()));
        let parse = PipelineError::Parse(ParseError::Other("bad".to_string()));
        let write = PipelineError::Write(WriteError::Serialize("bad".to_string()));

        assert_eq!(load.exit_code(), 10);
        assert_eq!(parse.exit_code(), 20);
        assert_eq!(write.exit_code(), 50);
    }

    #[test]
    fn test_messages_carry_class_prefix() {
        let err = PipelineError::Load(LoadError::NotFound("cfg.toml".to_string()));
        assert_eq!(err.to_string(), "load error: source not found: cfg.toml");
    }
}
