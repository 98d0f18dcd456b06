//! Error types for TPM loading, querying and partition analysis.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, reducing or analyzing a TPM.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// without breaking changes.
///
/// Row-level problems during loading are not errors: malformed lines are
/// skipped, logged and listed in the [`LoadReport`](crate::engine::tpm::LoadReport).
/// Only an input with no usable rows at all fails the load.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ExecError {
    /// The source matrix has no valid rows or disagrees with the node count.
    #[error("data format error: {0}")]
    DataFormat(String),

    /// A subsystem specification string does not follow its grammar.
    #[error("subsystem specification error: {0}")]
    SpecFormat(String),

    /// A node letter is not part of the alphabet in scope.
    #[error("node '{node}' is not in alphabet '{alphabet}'")]
    NodeAlphabet { node: char, alphabet: String },

    /// Invalid analyzer input or configuration value.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Numerical stability error (NaN/Inf, shape mismatch in numeric kernels).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// The source file could not be read.
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExecError {
    /// Shorthand for an unknown node in a given alphabet.
    pub fn unknown_node(node: char, alphabet: impl Into<String>) -> Self {
        ExecError::NodeAlphabet {
            node,
            alphabet: alphabet.into(),
        }
    }
}
