//! Procure Domain Layer
//!
//! Core value types shared by the extractor, the store and the CLI.
//! Nothing in here knows about HTML or SQL; it only describes what an
//! extracted procurement notice looks like.
//!
//! ## Key Concepts
//!
//! - **Value**: a typed cell value (text, integer, boolean, date, date-time)
//! - **Record**: an insertion-ordered mapping of output field → `Value`.
//!   Absent fields are simply not present.
//! - **IdentityKey**: the key that names one procurement case, either the
//!   `(case_id, case_number)` pair or a single primary key
//! - **ExtractionBundle**: everything extracted from one document, handed
//!   to persistence as a unit
//!
//! ## Architecture
//!
//! - Pure data, no I/O
//! - Trait definitions for the extraction and persistence boundaries live in
//!   [`traits`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bundle;
pub mod identity;
pub mod record;
pub mod section;
pub mod traits;
pub mod value;

// Re-exports for convenience
pub use bundle::{ExtractionBundle, ExtractionWarning};
pub use identity::{DocumentVariant, IdentityKey};
pub use record::Record;
pub use section::Section;
pub use value::Value;
