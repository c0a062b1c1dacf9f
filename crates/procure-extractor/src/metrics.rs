//! Metrics collected during batch extraction

use procure_domain::ExtractionBundle;
use std::collections::BTreeMap;
use std::time::Duration;

/// Metrics collected during a batch run
///
/// Tracks documents seen, extracted and skipped, records per kind, and
/// recoverable warnings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchMetrics {
    /// Documents attempted
    pub documents_seen: usize,

    /// Documents extracted into a bundle
    pub documents_succeeded: usize,

    /// Documents skipped after a fatal error
    pub documents_failed: usize,

    /// Records produced per kind
    pub records: BTreeMap<&'static str, usize>,

    /// Recoverable warnings across all bundles
    pub warnings: usize,

    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl BatchMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully extracted bundle
    pub fn record_success(&mut self, bundle: &ExtractionBundle) {
        self.documents_seen += 1;
        self.documents_succeeded += 1;
        self.warnings += bundle.warnings.len();

        for (section, _) in bundle.flat_sections() {
            *self.records.entry(section.as_str()).or_insert(0) += 1;
        }
        self.add_records("tenderer", bundle.tenderers.len());
        self.add_records("award_item", bundle.award_items.len());
        self.add_records("committee", bundle.committee_members.len());
    }

    /// Record a skipped document
    pub fn record_failure(&mut self) {
        self.documents_seen += 1;
        self.documents_failed += 1;
    }

    fn add_records(&mut self, kind: &'static str, count: usize) {
        if count > 0 {
            *self.records.entry(kind).or_insert(0) += count;
        }
    }

    /// Total records across kinds
    pub fn total_records(&self) -> usize {
        self.records.values().sum()
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Batch Extraction Summary".to_string(),
            "========================".to_string(),
            format!("Documents: {}", self.documents_seen),
            format!("  Extracted: {}", self.documents_succeeded),
            format!("  Skipped: {}", self.documents_failed),
            format!("Warnings: {}", self.warnings),
            format!("Elapsed: {:.2}s", self.elapsed.as_secs_f64()),
        ];

        if !self.records.is_empty() {
            lines.push(String::new());
            lines.push("Records by kind:".to_string());
            for (kind, count) in &self.records {
                lines.push(format!("  {}: {}", kind, count));
            }
            lines.push(format!("  Total: {}", self.total_records()));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procure_domain::{DocumentVariant, IdentityKey, Record};

    fn bundle() -> ExtractionBundle {
        let mut bundle = ExtractionBundle::new(IdentityKey::pair("1", "A"), DocumentVariant::Award);
        bundle.organization_info = Some(Record::new().with("org_id", "3.1"));
        bundle.tenderers = vec![(1, Record::new()), (2, Record::new())];
        bundle
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = BatchMetrics::new();
        assert_eq!(metrics.documents_seen, 0);
        assert_eq!(metrics.total_records(), 0);
    }

    #[test]
    fn test_record_success_and_failure() {
        let mut metrics = BatchMetrics::new();
        metrics.record_success(&bundle());
        metrics.record_success(&bundle());
        metrics.record_failure();

        assert_eq!(metrics.documents_seen, 3);
        assert_eq!(metrics.documents_succeeded, 2);
        assert_eq!(metrics.documents_failed, 1);
        assert_eq!(metrics.records.get("organization"), Some(&2));
        assert_eq!(metrics.records.get("tenderer"), Some(&4));
        assert!(!metrics.records.contains_key("committee"));
        assert_eq!(metrics.total_records(), 6);
    }

    #[test]
    fn test_summary() {
        let mut metrics = BatchMetrics::new();
        metrics.record_success(&bundle());
        let summary = metrics.summary();
        assert!(summary.contains("Documents: 1"));
        assert!(summary.contains("tenderer: 2"));
        assert!(summary.contains("Total: 3"));
    }
}
