//! Logical sections of a procurement notice

use std::fmt;

/// A physically distinct row class in the source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    /// Contracting organization
    Organization,
    /// Procurement case header
    Procurement,
    /// Tenderer block (one group per tenderer)
    Tenderer,
    /// Award item block (items, each with awarded vendors)
    AwardItem,
    /// Evaluation committee roster
    Committee,
    /// Award / settlement block
    Award,
    /// Declaration details (declaration variant)
    Declaration,
    /// Tender attendance details (declaration variant)
    Attendance,
    /// Miscellaneous terms (declaration variant)
    Other,
}

impl Section {
    /// Get the section name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Organization => "organization",
            Section::Procurement => "procurement",
            Section::Tenderer => "tenderer",
            Section::AwardItem => "award_item",
            Section::Committee => "committee",
            Section::Award => "award",
            Section::Declaration => "declaration",
            Section::Attendance => "attendance",
            Section::Other => "other",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
