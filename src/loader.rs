//! Configuration source loading
//!
//! Reads the raw configuration text from a file path or standard input,
//! detects the input format, and digests the raw bytes so verbose runs can
//! report exactly which input produced the output.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

/// Where the raw configuration comes from
#[derive(Debug, Clone)]
pub enum Source {
    Stdin,
    Path(PathBuf),
}

impl Source {
    /// Human-readable origin for reports
    pub fn describe(&self) -> String {
        match self {
            Source::Stdin => "stdin".to_string(),
            Source::Path(p) => p.display().to_string(),
        }
    }
}

/// Input syntax, declared by file extension or inferred from content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Toml,
    Json,
}

/// The unparsed input, consumed immediately by the validator
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Raw configuration text
    pub text: String,

    /// Detected input format
    pub format: SourceFormat,

    /// SHA-256 digest of the raw bytes
    pub digest: String,

    /// Where the text came from
    pub origin: String,
}

/// Errors accessing the configuration source
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("source not found: {0}")]
    NotFound(String),

    #[error("source unreadable: {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("source is empty: {0}")]
    Empty(String),
}

/// Read the source into a `RawDocument`.
pub fn load(source: &Source) -> Result<RawDocument, LoadError> {
    let origin = source.describe();

    let bytes = match source {
        Source::Stdin => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .map_err(|e| LoadError::Unreadable {
                    path: origin.clone(),
                    reason: e.to_string(),
                })?;
            buf
        }
        Source::Path(path) => fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(origin.clone()),
            _ => LoadError::Unreadable {
                path: origin.clone(),
                reason: e.to_string(),
            },
        })?,
    };

    let digest = hex::encode(Sha256::digest(&bytes));

    let text = String::from_utf8(bytes).map_err(|e| LoadError::Unreadable {
        path: origin.clone(),
        reason: format!("invalid UTF-8: {}", e),
    })?;

    if text.trim().is_empty() {
        return Err(LoadError::Empty(origin));
    }

    let format = detect_format(source, &text);

    Ok(RawDocument {
        text,
        format,
        digest,
        origin,
    })
}

/// File extension wins; anything else is sniffed from the first
/// non-whitespace character.
fn detect_format(source: &Source, text: &str) -> SourceFormat {
    if let Source::Path(path) = source {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => return SourceFormat::Json,
            Some("toml") => return SourceFormat::Toml,
            _ => {}
        }
    }
    sniff_format(text)
}

fn sniff_format(text: &str) -> SourceFormat {
    match text.trim_start().chars().next() {
        Some('{') | Some('[') => SourceFormat::Json,
        _ => SourceFormat::Toml,
    }
}
