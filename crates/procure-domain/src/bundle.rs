//! Extraction bundle - everything taken from one document

use crate::{DocumentVariant, IdentityKey, Record, Section};
use std::fmt;

/// A recoverable problem met while walking a document
///
/// Warnings never abort extraction; the affected field or section is left
/// out of the bundle and the warning is recorded here so callers can report
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionWarning {
    /// A flat-list section did not satisfy its grouping invariant
    MalformedGrouping {
        /// Section that was dropped
        section: Section,
        /// Number of cells found
        cells: usize,
        /// Required group width
        width: usize,
    },

    /// A composite row was present but its pattern did not match
    UnmatchedComposite {
        /// Section the row belongs to
        section: Section,
        /// Row label
        label: String,
    },

    /// A row or group marker appeared outside any enclosing group
    OrphanGroup {
        /// Section the row belongs to
        section: Section,
        /// Row label
        label: String,
    },
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionWarning::MalformedGrouping { section, cells, width } => write!(
                f,
                "{}: {} cells is not a positive multiple of {}, section dropped",
                section, cells, width
            ),
            ExtractionWarning::UnmatchedComposite { section, label } => {
                write!(f, "{}: composite row '{}' did not match, fields omitted", section, label)
            }
            ExtractionWarning::OrphanGroup { section, label } => {
                write!(f, "{}: row '{}' has no enclosing group, ignored", section, label)
            }
        }
    }
}

/// All records extracted from a single document
///
/// Built once per extraction call and handed to persistence keyed by
/// `identity`. Sections that do not exist in the document's variant stay
/// `None` or empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionBundle {
    /// Document identity every record is attached to
    pub identity: IdentityKey,

    /// Registry set the document was read with
    pub variant: DocumentVariant,

    /// Contracting organization
    pub organization_info: Option<Record>,

    /// Procurement case header
    pub procurement_info: Option<Record>,

    /// Tenderers as `(tenderer_sequence, record)`, ordered by sequence
    pub tenderers: Vec<(u32, Record)>,

    /// Award items as `(item_sequence, tenderer_sequence, record)`, ordered
    pub award_items: Vec<(u32, u32, Record)>,

    /// Evaluation committee members, possibly empty
    pub committee_members: Vec<Record>,

    /// Award / settlement block
    pub award_info: Option<Record>,

    /// Declaration details (declaration variant)
    pub declaration_info: Option<Record>,

    /// Tender attendance details (declaration variant)
    pub attendance_info: Option<Record>,

    /// Miscellaneous terms (declaration variant)
    pub other_info: Option<Record>,

    /// Recoverable problems met during extraction
    pub warnings: Vec<ExtractionWarning>,
}

impl ExtractionBundle {
    /// Create an empty bundle for a document
    pub fn new(identity: IdentityKey, variant: DocumentVariant) -> Self {
        Self {
            identity,
            variant,
            organization_info: None,
            procurement_info: None,
            tenderers: Vec::new(),
            award_items: Vec::new(),
            committee_members: Vec::new(),
            award_info: None,
            declaration_info: None,
            attendance_info: None,
            other_info: None,
            warnings: Vec::new(),
        }
    }

    /// Mutable slot for a single-record section, `None` for grouped ones
    pub fn flat_slot_mut(&mut self, section: Section) -> Option<&mut Option<Record>> {
        match section {
            Section::Organization => Some(&mut self.organization_info),
            Section::Procurement => Some(&mut self.procurement_info),
            Section::Award => Some(&mut self.award_info),
            Section::Declaration => Some(&mut self.declaration_info),
            Section::Attendance => Some(&mut self.attendance_info),
            Section::Other => Some(&mut self.other_info),
            Section::Tenderer | Section::AwardItem | Section::Committee => None,
        }
    }

    /// Single-record sections that are present, in document order
    pub fn flat_sections(&self) -> Vec<(Section, &Record)> {
        [
            (Section::Organization, &self.organization_info),
            (Section::Procurement, &self.procurement_info),
            (Section::Declaration, &self.declaration_info),
            (Section::Attendance, &self.attendance_info),
            (Section::Other, &self.other_info),
            (Section::Award, &self.award_info),
        ]
        .into_iter()
        .filter_map(|(section, slot)| slot.as_ref().map(|r| (section, r)))
        .collect()
    }

    /// Total number of records in the bundle
    pub fn record_count(&self) -> usize {
        self.flat_sections().len()
            + self.tenderers.len()
            + self.award_items.len()
            + self.committee_members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bundle_is_empty() {
        let bundle = ExtractionBundle::new(IdentityKey::primary("k"), DocumentVariant::Declaration);
        assert_eq!(bundle.record_count(), 0);
        assert!(bundle.flat_sections().is_empty());
    }

    #[test]
    fn test_flat_slot_routing() {
        let mut bundle = ExtractionBundle::new(IdentityKey::pair("1", "A"), DocumentVariant::Award);
        *bundle.flat_slot_mut(Section::Award).unwrap() = Some(Record::new().with("award_date", "x"));
        assert!(bundle.flat_slot_mut(Section::Tenderer).is_none());

        bundle.tenderers.push((1, Record::new()));
        assert_eq!(bundle.record_count(), 2);
        assert_eq!(bundle.flat_sections()[0].0, Section::Award);
    }

    #[test]
    fn test_warning_display() {
        let w = ExtractionWarning::MalformedGrouping {
            section: Section::Committee,
            cells: 11,
            width: 4,
        };
        assert_eq!(
            w.to_string(),
            "committee: 11 cells is not a positive multiple of 4, section dropped"
        );
    }
}
