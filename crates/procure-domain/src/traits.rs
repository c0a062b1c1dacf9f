//! Trait definitions for external interactions
//!
//! These traits define the boundaries between extraction and persistence.
//! Implementations live in other crates.

use crate::ExtractionBundle;

/// Trait for turning one stored document into an [`ExtractionBundle`]
///
/// Implemented by the application layer (procure-extractor)
pub trait NoticeExtractor {
    /// Error type for extraction operations
    type Error;

    /// Extract every section of a document
    fn extract_document(&self, html: &str) -> Result<ExtractionBundle, Self::Error>;
}

/// Trait for persisting extracted bundles
///
/// Implemented by the infrastructure layer (procure-store)
pub trait BundleStore {
    /// Error type for store operations
    type Error;

    /// Insert or update every record of a bundle, keyed by its identity
    ///
    /// Fields absent from a record must leave the stored column untouched.
    fn upsert_bundle(&mut self, bundle: &ExtractionBundle) -> Result<UpsertSummary, Self::Error>;
}

/// Outcome of a single [`BundleStore::upsert_bundle`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Number of upsert statements executed
    pub rows_written: usize,

    /// Tables touched, in write order
    pub tables: Vec<&'static str>,
}
