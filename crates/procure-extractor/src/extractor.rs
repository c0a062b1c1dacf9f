//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::navigator::{detect_variant, locate};
use crate::registry::RegistrySet;
use crate::walker::{walk_section, ExtractionContext, SectionOutput};
use procure_domain::traits::NoticeExtractor;
use procure_domain::{DocumentVariant, ExtractionBundle, Section};
use scraper::Html;
use tracing::{debug, info, warn};

/// The Extractor turns procurement notice documents into typed records
///
/// Holds the configuration and both registry sets; it has no per-document
/// state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct Extractor {
    config: ExtractorConfig,
    award: RegistrySet,
    declaration: RegistrySet,
}

impl Extractor {
    /// Create a new Extractor
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            award: RegistrySet::award(&config)?,
            declaration: RegistrySet::declaration()?,
            config,
        })
    }

    /// Create an Extractor with the default configuration
    pub fn with_defaults() -> Result<Self, ExtractorError> {
        Self::new(ExtractorConfig::default())
    }

    /// Configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Registry set used for a variant
    pub fn registry(&self, variant: DocumentVariant) -> &RegistrySet {
        match variant {
            DocumentVariant::Award => &self.award,
            DocumentVariant::Declaration => &self.declaration,
        }
    }

    /// Extract a document, picking the variant from its identity markers
    pub fn extract(&self, html: &str) -> Result<ExtractionBundle, ExtractorError> {
        let document = Html::parse_document(html);
        let variant = detect_variant(&document);
        debug!("Detected {} notice", variant.as_str());
        self.extract_parsed(&document, variant)
    }

    /// Extract a document as a specific variant
    pub fn extract_as(
        &self,
        html: &str,
        variant: DocumentVariant,
    ) -> Result<ExtractionBundle, ExtractorError> {
        let document = Html::parse_document(html);
        self.extract_parsed(&document, variant)
    }

    /// Extract an already parsed document
    ///
    /// Every section of the variant's registry is walked in order. A
    /// fatal error in any section discards the whole bundle.
    pub fn extract_parsed(
        &self,
        document: &Html,
        variant: DocumentVariant,
    ) -> Result<ExtractionBundle, ExtractorError> {
        let located = locate(document, variant)?;
        let registry = self.registry(variant);
        let ctx = ExtractionContext {
            identity: &located.identity,
            root: located.root,
            registry,
        };

        let mut bundle = ExtractionBundle::new(located.identity.clone(), variant);
        let mut warnings = Vec::new();

        for spec in &registry.sections {
            let output = walk_section(&ctx, spec, &mut warnings).map_err(|e| {
                warn!("Aborting extraction of {}: {}", ctx.identity, e);
                e
            })?;
            place(&mut bundle, spec.section, output);
        }

        for warning in &warnings {
            warn!("{}: {}", ctx.identity, warning);
        }
        bundle.warnings = warnings;

        info!(
            "Extracted {} records from {} notice {}",
            bundle.record_count(),
            variant.as_str(),
            bundle.identity
        );
        Ok(bundle)
    }
}

fn place(bundle: &mut ExtractionBundle, section: Section, output: SectionOutput) {
    match output {
        SectionOutput::Flat(record) => {
            if let Some(slot) = bundle.flat_slot_mut(section) {
                *slot = record;
            }
        }
        SectionOutput::Groups(groups) => bundle.tenderers = groups,
        SectionOutput::Nested(items) => bundle.award_items = items,
        SectionOutput::List(members) => bundle.committee_members = members,
    }
}

impl NoticeExtractor for Extractor {
    type Error = ExtractorError;

    fn extract_document(&self, html: &str) -> Result<ExtractionBundle, Self::Error> {
        self.extract(html)
    }
}
