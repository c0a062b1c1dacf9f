//! Output formatting for the CLI.

use crate::commands::load::LoadOutcome;
use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use procure_domain::{ExtractionBundle, Record, Value};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format one extracted bundle.
    pub fn format_bundle(&self, bundle: &ExtractionBundle) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&bundle_json(bundle))?),
            OutputFormat::Table => Ok(self.format_bundle_table(bundle)),
            OutputFormat::Quiet => Ok(bundle.identity.to_string()),
        }
    }

    /// Format the result of a load run.
    pub fn format_load(&self, outcome: &LoadOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&load_json(outcome))?),
            OutputFormat::Table => Ok(self.format_load_table(outcome)),
            OutputFormat::Quiet => Ok(outcome
                .stored
                .iter()
                .map(|(_, identity)| identity.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    fn format_bundle_table(&self, bundle: &ExtractionBundle) -> String {
        let mut out = vec![self.info(&format!(
            "{} notice ({})",
            bundle.variant.as_str(),
            bundle.identity
        ))];

        for (section, record) in bundle.flat_sections() {
            out.push(self.heading(section.as_str()));
            out.push(record_table(record));
        }
        for (sequence, record) in &bundle.tenderers {
            out.push(self.heading(&format!("tenderer #{}", sequence)));
            out.push(record_table(record));
        }
        for (item, tenderer, record) in &bundle.award_items {
            out.push(self.heading(&format!("award item #{} / tenderer #{}", item, tenderer)));
            out.push(record_table(record));
        }
        if !bundle.committee_members.is_empty() {
            out.push(self.heading("committee"));
            out.push(records_table(&bundle.committee_members));
        }

        if bundle.record_count() == 0 {
            out.push(self.colorize("No records found.", "yellow"));
        }
        for warning in &bundle.warnings {
            out.push(self.warning(&warning.to_string()));
        }
        out.join("\n")
    }

    fn format_load_table(&self, outcome: &LoadOutcome) -> String {
        let mut out = vec![outcome.metrics.summary()];

        if !outcome.failures.is_empty() {
            let mut builder = Builder::default();
            builder.push_record(["Path", "Error"]);
            for (path, error) in &outcome.failures {
                builder.push_record([path.display().to_string(), error.clone()]);
            }
            out.push(String::new());
            out.push(styled(builder));
        }

        out.push(String::new());
        out.push(self.success(&format!(
            "Stored {} row(s) from {} document(s) in {}",
            outcome.rows_written,
            outcome.stored.len(),
            outcome.database.display()
        )));
        out.join("\n")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn heading(&self, title: &str) -> String {
        self.colorize(title, "cyan")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn styled(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

/// Two-column field/value table for one record.
fn record_table(record: &Record) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (field, value) in record.iter() {
        builder.push_record([field.to_string(), value.to_string()]);
    }
    styled(builder)
}

/// One row per record, columns from the first record's fields.
fn records_table(records: &[Record]) -> String {
    let columns: Vec<&str> = records.first().map(|r| r.keys().collect()).unwrap_or_default();
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.to_string()));
    for record in records {
        builder.push_record(
            columns
                .iter()
                .map(|c| record.get(c).map(ToString::to_string).unwrap_or_default()),
        );
    }
    styled(builder)
}

fn value_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Integer(n) => serde_json::Value::from(*n),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Date(_) | Value::DateTime(_) => serde_json::Value::String(value.to_string()),
    }
}

fn record_json(record: &Record) -> serde_json::Value {
    let map = record
        .iter()
        .map(|(field, value)| (field.to_string(), value_json(value)))
        .collect::<serde_json::Map<_, _>>();
    serde_json::Value::Object(map)
}

fn optional_json(record: &Option<Record>) -> serde_json::Value {
    record.as_ref().map(record_json).unwrap_or(serde_json::Value::Null)
}

/// JSON representation of a bundle.
pub fn bundle_json(bundle: &ExtractionBundle) -> serde_json::Value {
    let identity = bundle
        .identity
        .columns()
        .into_iter()
        .map(|(column, value)| (column.to_string(), serde_json::Value::from(value)))
        .collect::<serde_json::Map<_, _>>();

    serde_json::json!({
        "identity": identity,
        "variant": bundle.variant.as_str(),
        "organization_info": optional_json(&bundle.organization_info),
        "procurement_info": optional_json(&bundle.procurement_info),
        "tenderers": bundle.tenderers.iter().map(|(_, r)| record_json(r)).collect::<Vec<_>>(),
        "award_items": bundle.award_items.iter().map(|(_, _, r)| record_json(r)).collect::<Vec<_>>(),
        "committee_members": bundle.committee_members.iter().map(record_json).collect::<Vec<_>>(),
        "award_info": optional_json(&bundle.award_info),
        "declaration_info": optional_json(&bundle.declaration_info),
        "attendance_info": optional_json(&bundle.attendance_info),
        "other_info": optional_json(&bundle.other_info),
        "warnings": bundle.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

fn load_json(outcome: &LoadOutcome) -> serde_json::Value {
    let metrics = &outcome.metrics;
    serde_json::json!({
        "database": outcome.database.display().to_string(),
        "rows_written": outcome.rows_written,
        "documents": {
            "seen": metrics.documents_seen,
            "succeeded": metrics.documents_succeeded,
            "failed": metrics.documents_failed,
            "stored": outcome.stored.len(),
        },
        "records": metrics.records,
        "warnings": metrics.warnings,
        "elapsed_secs": metrics.elapsed.as_secs_f64(),
        "failures": outcome
            .failures
            .iter()
            .map(|(path, error)| serde_json::json!({
                "path": path.display().to_string(),
                "error": error,
            }))
            .collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use procure_domain::{DocumentVariant, ExtractionWarning, IdentityKey, Section};
    use procure_extractor::BatchMetrics;
    use std::path::PathBuf;

    fn create_test_bundle() -> ExtractionBundle {
        let mut bundle =
            ExtractionBundle::new(IdentityKey::pair("51759078", "IEB048"), DocumentVariant::Award);
        bundle.organization_info = Some(
            Record::new()
                .with("org_name", "交通部運輸研究所")
                .with("phone", "02-23496789"),
        );
        bundle.tenderers.push((
            1,
            Record::new()
                .with("tenderer_sequence", 1i64)
                .with("is_awarded", true)
                .with("award_price", 4_380_000i64),
        ));
        bundle.committee_members.push(
            Record::new()
                .with("sequence", 1i64)
                .with("attended", "是")
                .with("name", "王小明"),
        );
        bundle.warnings.push(ExtractionWarning::UnmatchedComposite {
            section: Section::Award,
            label: "履約執行機關".to_string(),
        });
        bundle
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_bundle(&create_test_bundle()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["identity"]["case_id"], "51759078");
        assert_eq!(parsed["variant"], "award");
        assert_eq!(parsed["tenderers"][0]["is_awarded"], true);
        assert_eq!(parsed["tenderers"][0]["award_price"], 4_380_000);
        assert!(parsed["award_info"].is_null());
        assert_eq!(parsed["warnings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_bundle(&create_test_bundle()).unwrap();
        assert_eq!(output, "case_id=51759078, case_number=IEB048");
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_bundle(&create_test_bundle()).unwrap();
        assert!(output.contains("organization"));
        assert!(output.contains("tenderer #1"));
        assert!(output.contains("交通部運輸研究所"));
        assert!(output.contains("attended"));
        assert!(output.contains("⚠ award: composite row '履約執行機關' did not match"));
    }

    #[test]
    fn test_empty_bundle() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let bundle = ExtractionBundle::new(IdentityKey::primary("k"), DocumentVariant::Declaration);
        let output = formatter.format_bundle(&bundle).unwrap();
        assert!(output.contains("No records found"));
    }

    #[test]
    fn test_load_formats() {
        let mut metrics = BatchMetrics::new();
        metrics.record_success(&create_test_bundle());
        metrics.record_failure();
        let outcome = LoadOutcome {
            database: PathBuf::from("procure.db"),
            rows_written: 3,
            stored: vec![(PathBuf::from("a.txt"), IdentityKey::primary("k1"))],
            failures: vec![(PathBuf::from("b.txt"), "Missing identity: primaryKey".to_string())],
            metrics,
        };

        let table = Formatter::new(OutputFormat::Table, false).format_load(&outcome).unwrap();
        assert!(table.contains("Batch Extraction Summary"));
        assert!(table.contains("b.txt"));
        assert!(table.contains("✓ Stored 3 row(s) from 1 document(s) in procure.db"));

        let json = Formatter::new(OutputFormat::Json, false).format_load(&outcome).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["documents"]["failed"], 1);
        assert_eq!(parsed["failures"][0]["path"], "b.txt");

        let quiet = Formatter::new(OutputFormat::Quiet, false).format_load(&outcome).unwrap();
        assert_eq!(quiet, "primary_key=k1");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.error("test"), "✗ test");
    }
}
