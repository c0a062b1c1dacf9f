//! Procure Extractor
//!
//! Reads Taiwanese government e-procurement notices (award and tender
//! declaration pages) into typed, relationally shaped records.
//!
//! # Overview
//!
//! A notice is one HTML table of label/value rows, tagged by section
//! class. The extractor locates the document's identity, then walks every
//! section with a declarative field registry: flat sections become one
//! record, tenderer blocks become ordinal-keyed groups, award items become
//! item/vendor sub-groups with carried-forward item fields, and the
//! evaluation committee is read as fixed-width cell groups.
//!
//! # Architecture
//!
//! ```text
//! HTML → Navigator (identity, root) → Walker + Registry + Resolvers → ExtractionBundle
//! ```
//!
//! # Key Features
//!
//! - **Typed conversions**: ROC calendar dates, money, yes/no flags, phone numbers
//! - **Declarative registry**: one table per section, tagged direct/composite rules
//! - **Two variants**: award notices and tender declarations, auto-detected
//! - **Recoverable warnings**: malformed groups and unmatched composites never abort
//! - **Batch processing**: bounded concurrent extraction over a directory
//!
//! # Example Usage
//!
//! ```no_run
//! use procure_extractor::{BatchExtractor, Extractor, ExtractorConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = Extractor::new(ExtractorConfig::default())?;
//!
//! // One document
//! let html = std::fs::read_to_string("bid_detail/51759078_IEB048.txt")?;
//! let bundle = extractor.extract(&html)?;
//! println!("{}: {} records", bundle.identity, bundle.record_count());
//!
//! // A directory of documents
//! let batch = BatchExtractor::new(extractor);
//! let report = batch.extract_dir("bid_detail".as_ref()).await?;
//! println!("{}", report.metrics.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod config;
pub mod convert;
mod document;
pub mod registry;
pub mod navigator;
pub mod resolvers;
pub mod walker;
mod extractor;
mod metrics;
mod batch;


pub use error::ExtractorError;
pub use config::{ExtractorConfig, PriceConversion};
pub use convert::{Conversion, ConversionError};
pub use registry::{FieldRule, RegistrySet, ResolverId, SectionLayout, SectionSpec};
pub use extractor::Extractor;
pub use metrics::BatchMetrics;
pub use batch::{BatchExtractor, BatchReport, DocumentFailure};
