//! Crate-level error types for shortclean diagnostics.

use std::path::PathBuf;

/// All errors in shortclean carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, document, or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No document with this id exists in the store.
    #[error("document not found: {id}")]
    DocumentNotFound {
        /// Requested document id.
        id: String,
    },

    /// A document id escapes the corpus root or is otherwise unusable.
    #[error("invalid document id: `{id}`")]
    InvalidDocumentId {
        /// The rejected id.
        id: String,
    },

    /// A front matter block exists but is not valid TOML.
    #[error("invalid front matter in {}: {reason}", path.display())]
    InvalidFrontMatter {
        /// File carrying the front matter.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// A single-directive operation was invoked without a directive name.
    #[error("no shortcode provided")]
    MissingDirectiveName,

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),
}
