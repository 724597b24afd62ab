//! Canonical output rendering
//!
//! Renders the resolved tree as RFC 8785 canonical JSON (JCS): keys sorted
//! lexicographically, minimal number and boolean formatting, no comments or
//! input formatting carried over. The document is rendered fully before a
//! single write, so a failing run never leaves partial output behind.

use serde_json_canonicalizer as jcs;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::resolver::ResolvedDocument;

/// Where the canonical document goes
#[derive(Debug, Clone)]
pub enum OutputTarget {
    Stdout,
    Path(PathBuf),
}

/// The rendered canonical document
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalOutput {
    /// Canonical JSON plus a trailing newline
    pub text: String,
}

/// Errors producing or writing the output
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("serialization failed: {0}")]
    Serialize(String),

    #[error("failed to write {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Render the canonical form.
pub fn serialize(doc: &ResolvedDocument) -> Result<CanonicalOutput, WriteError> {
    let bytes = jcs::to_vec(&doc.tree).map_err(|e| WriteError::Serialize(e.to_string()))?;
    let mut text =
        String::from_utf8(bytes).map_err(|e| WriteError::Serialize(e.to_string()))?;
    text.push('\n');
    Ok(CanonicalOutput { text })
}

/// Write the rendered document in one shot.
pub fn write(output: &CanonicalOutput, target: &OutputTarget) -> Result<(), WriteError> {
    match target {
        OutputTarget::Stdout => {
            let mut stdout = io::stdout();
            stdout
                .write_all(output.text.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|e| WriteError::Io {
                    path: "stdout".to_string(),
                    reason: e.to_string(),
                })
        }
        OutputTarget::Path(path) => {
            fs::write(path, &output.text).map_err(|e| WriteError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        }
    }
}
