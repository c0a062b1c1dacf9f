//! Document identity and variant

use std::fmt;

/// The key that uniquely names one procurement case document
///
/// Award notices carry a two-part key; tender declarations carry a single
/// primary key. Every record produced from a document is attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    /// `(case_id, case_number)` pair used by award notices
    Pair {
        /// Internal case id (`pkAtmMain` on the source site)
        case_id: String,
        /// Published case number (`tenderCaseNo` on the source site)
        case_number: String,
    },

    /// Single primary key used by tender declarations
    Primary(String),
}

impl IdentityKey {
    /// Build a pair key
    pub fn pair(case_id: impl Into<String>, case_number: impl Into<String>) -> Self {
        IdentityKey::Pair {
            case_id: case_id.into(),
            case_number: case_number.into(),
        }
    }

    /// Build a primary key
    pub fn primary(key: impl Into<String>) -> Self {
        IdentityKey::Primary(key.into())
    }

    /// Key columns and their values, in persistence order
    pub fn columns(&self) -> Vec<(&'static str, &str)> {
        match self {
            IdentityKey::Pair { case_id, case_number } => {
                vec![("case_id", case_id.as_str()), ("case_number", case_number.as_str())]
            }
            IdentityKey::Primary(key) => vec![("primary_key", key.as_str())],
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Pair { case_id, case_number } => {
                write!(f, "case_id={}, case_number={}", case_id, case_number)
            }
            IdentityKey::Primary(key) => write!(f, "primary_key={}", key),
        }
    }
}

/// Which family of document is being extracted
///
/// The walker is the same for both; only the active registry set differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentVariant {
    /// Award notice: pair identity, tenderers, award items, committee
    Award,

    /// Tender declaration: primary-key identity, flat sections only
    Declaration,
}

impl DocumentVariant {
    /// Get the variant name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentVariant::Award => "award",
            DocumentVariant::Declaration => "declaration",
        }
    }

    /// Parse a variant from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "award" => Some(DocumentVariant::Award),
            "declaration" => Some(DocumentVariant::Declaration),
            _ => None,
        }
    }
}

impl std::str::FromStr for DocumentVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid document variant: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_columns() {
        let key = IdentityKey::pair("51759078", "MOTC-IOT-104-IEB048");
        assert_eq!(
            key.columns(),
            vec![("case_id", "51759078"), ("case_number", "MOTC-IOT-104-IEB048")]
        );
        assert_eq!(key.to_string(), "case_id=51759078, case_number=MOTC-IOT-104-IEB048");
    }

    #[test]
    fn test_primary_columns() {
        let key = IdentityKey::primary("NjE2NDA2MDY=");
        assert_eq!(key.columns(), vec![("primary_key", "NjE2NDA2MDY=")]);
    }

    #[test]
    fn test_variant_parse() {
        assert_eq!(DocumentVariant::parse("Award"), Some(DocumentVariant::Award));
        assert_eq!("declaration".parse::<DocumentVariant>(), Ok(DocumentVariant::Declaration));
        assert!("other".parse::<DocumentVariant>().is_err());
    }
}
