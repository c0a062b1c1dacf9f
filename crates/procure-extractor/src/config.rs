//! Configuration for the Extractor

use crate::convert::Conversion;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the award block's total award price cell is converted
///
/// One historical extractor ran this field through the date converter
/// while every other price used the money converter. The choice is kept
/// explicit instead of silently picking one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceConversion {
    /// Parse as a money amount (integer)
    #[default]
    Money,
    /// Parse as an ROC calendar date (legacy behavior)
    Date,
}

impl PriceConversion {
    /// The cell conversion this choice maps to
    pub fn conversion(self) -> Conversion {
        match self {
            PriceConversion::Money => Conversion::Money,
            PriceConversion::Date => Conversion::Date,
        }
    }
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Converter used for the total award price field
    pub total_award_price_conversion: PriceConversion,

    /// Maximum documents extracted at once by the batch driver
    pub concurrency: usize,

    /// File extensions picked up when scanning a directory
    pub file_extensions: Vec<String>,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }
        if self.file_extensions.is_empty() {
            return Err("file_extensions must not be empty".to_string());
        }
        if self.file_extensions.iter().any(|e| e.is_empty() || e.starts_with('.')) {
            return Err("file_extensions must be bare extensions like \"html\"".to_string());
        }
        Ok(())
    }

    /// Whether a path has one of the configured extensions
    pub fn accepts_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.file_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Single-document-at-a-time preset, useful for debugging
    pub fn sequential() -> Self {
        Self {
            concurrency: 1,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            total_award_price_conversion: PriceConversion::Money,
            concurrency: 8,
            file_extensions: vec!["txt".to_string(), "html".to_string(), "htm".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ExtractorConfig::default().validate().is_ok());
        assert!(ExtractorConfig::sequential().validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = ExtractorConfig::default();
        config.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dotted_extension_rejected() {
        let mut config = ExtractorConfig::default();
        config.file_extensions = vec![".html".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_accepts_path() {
        let config = ExtractorConfig::default();
        assert!(config.accepts_path(Path::new("bid_detail/51759078_A-1.txt")));
        assert!(config.accepts_path(Path::new("x/notice.HTML")));
        assert!(!config.accepts_path(Path::new("x/notice.json")));
        assert!(!config.accepts_path(Path::new("x/noext")));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ExtractorConfig::from_toml("total_award_price_conversion = \"date\"").unwrap();
        assert_eq!(config.total_award_price_conversion, PriceConversion::Date);
        assert_eq!(config.concurrency, 8);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }
}
