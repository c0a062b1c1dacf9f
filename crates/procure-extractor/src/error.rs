//! Error types for the Extractor

use thiserror::Error;

/// Errors that abort extraction of a document
///
/// Recoverable conditions (unmatched composite rows, malformed committee
/// blocks, missing dates) are not errors; they surface as
/// [`ExtractionWarning`](procure_domain::ExtractionWarning)s on the bundle.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Identity markers or the root table are absent or empty
    #[error("Missing identity: {0}")]
    MissingIdentity(String),

    /// A money or integer cell did not hold a number
    #[error("Malformed numeric value for '{field}': '{value}'")]
    MalformedNumeric {
        /// Output field being built
        field: String,
        /// Raw cell text
        value: String,
    },

    /// A CSS selector in the registry failed to parse
    #[error("Invalid selector '{0}'")]
    Selector(String),

    /// Reading a stored document failed
    #[error("I/O error: {0}")]
    Io(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Background task failed to complete
    #[error("Task error: {0}")]
    Task(String),
}

impl ExtractorError {
    /// True for errors that mean "this document cannot be read as a notice"
    /// rather than an environment or setup problem
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            ExtractorError::MissingIdentity(_) | ExtractorError::MalformedNumeric { .. }
        )
    }
}
