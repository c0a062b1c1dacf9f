//! Procure Storage Layer
//!
//! Implements the BundleStore trait on SQLite.
//!
//! # Architecture
//!
//! - One table per record kind, keyed by the document identity plus any
//!   group ordinals
//! - Records become `INSERT … ON CONFLICT … DO UPDATE` statements over the
//!   columns they carry; omitted fields leave stored columns untouched
//! - One transaction per bundle
//!
//! # Examples
//!
//! ```no_run
//! use procure_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for bundles
//! ```

#![warn(missing_docs)]

mod upsert;

pub use upsert::{build_upsert, to_sql, Upsert};

use procure_domain::traits::{BundleStore, UpsertSummary};
use procure_domain::{DocumentVariant, ExtractionBundle, Record, Section};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Transaction};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A record could not be turned into a row
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// No table holds this section for this variant
    #[error("No table for {section} in {variant} notices")]
    UnknownTable {
        /// Section being written
        section: Section,
        /// Document variant
        variant: &'static str,
    },
}

/// Table holding a section's records for a variant
pub fn table_for(variant: DocumentVariant, section: Section) -> Option<&'static str> {
    use DocumentVariant::{Award, Declaration};
    match (variant, section) {
        (Award, Section::Organization) => Some("organization_info"),
        (Award, Section::Procurement) => Some("procurement_info"),
        (Award, Section::Tenderer) => Some("tender_info"),
        (Award, Section::AwardItem) => Some("tender_award_item"),
        (Award, Section::Committee) => Some("evaluation_committee_info"),
        (Award, Section::Award) => Some("award_info"),
        (Declaration, Section::Organization) => Some("declaration_organization_info"),
        (Declaration, Section::Procurement) => Some("declaration_procurement_info"),
        (Declaration, Section::Declaration) => Some("declaration_info"),
        (Declaration, Section::Attendance) => Some("attend_info"),
        (Declaration, Section::Other) => Some("other_info"),
        _ => None,
    }
}

/// SQLite-based implementation of BundleStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own SqliteStore instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Number of rows in a table
    pub fn count_rows(&self, table: &str) -> Result<usize, StoreError> {
        let table = self.known_table(table)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Column names of a table, in schema order
    pub fn columns(&self, table: &str) -> Result<Vec<String>, StoreError> {
        let table = self.known_table(table)?;
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    /// Non-null columns of the row matching `filter`, if any
    pub fn row(
        &self,
        table: &str,
        filter: &[(&str, SqlValue)],
    ) -> Result<Option<Vec<(String, SqlValue)>>, StoreError> {
        let table = self.known_table(table)?;
        let columns = self.columns(table)?;
        for (column, _) in filter {
            if !columns.iter().any(|c| c == column) {
                return Err(StoreError::InvalidData(format!("no column {} in {}", column, table)));
            }
        }

        let condition = filter
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
            .collect::<Vec<_>>()
            .join(" AND ");
        let where_clause = if condition.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", condition)
        };
        let sql = format!("SELECT {} FROM {}{} LIMIT 1", columns.join(", "), table, where_clause);

        let row = self
            .conn
            .query_row(&sql, params_from_iter(filter.iter().map(|(_, v)| v)), |row| {
                let mut values = Vec::new();
                for (i, column) in columns.iter().enumerate() {
                    let value: SqlValue = row.get(i)?;
                    if value != SqlValue::Null {
                        values.push((column.clone(), value));
                    }
                }
                Ok(values)
            })
            .optional()?;
        Ok(row)
    }

    /// Table names from the schema, rejecting anything else
    fn known_table<'t>(&self, table: &'t str) -> Result<&'t str, StoreError> {
        let exists: bool = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if exists {
            Ok(table)
        } else {
            Err(StoreError::InvalidData(format!("unknown table {}", table)))
        }
    }
}

/// Identity key columns with their bound values
fn identity_keys(bundle: &ExtractionBundle) -> Vec<(&'static str, SqlValue)> {
    bundle
        .identity
        .columns()
        .into_iter()
        .map(|(column, value)| (column, SqlValue::Text(value.to_string())))
        .collect()
}

fn resolve_table(variant: DocumentVariant, section: Section) -> Result<&'static str, StoreError> {
    table_for(variant, section).ok_or(StoreError::UnknownTable {
        section,
        variant: variant.as_str(),
    })
}

fn execute(
    tx: &Transaction<'_>,
    table: &'static str,
    keys: &[(&str, SqlValue)],
    record: &Record,
    summary: &mut UpsertSummary,
) -> Result<(), StoreError> {
    let upsert = build_upsert(table, keys, record)?;
    debug!("{}", upsert.sql);
    tx.execute(&upsert.sql, params_from_iter(upsert.params.iter()))?;
    summary.rows_written += 1;
    if !summary.tables.contains(&table) {
        summary.tables.push(table);
    }
    Ok(())
}

impl BundleStore for SqliteStore {
    type Error = StoreError;

    fn upsert_bundle(&mut self, bundle: &ExtractionBundle) -> Result<UpsertSummary, Self::Error> {
        let variant = bundle.variant;
        let identity = identity_keys(bundle);
        let mut summary = UpsertSummary::default();
        let tx = self.conn.transaction()?;

        for (section, record) in bundle.flat_sections() {
            execute(&tx, resolve_table(variant, section)?, &identity, record, &mut summary)?;
        }

        if !bundle.tenderers.is_empty() {
            let table = resolve_table(variant, Section::Tenderer)?;
            for (sequence, record) in &bundle.tenderers {
                let mut keys = identity.clone();
                keys.push(("tenderer_sequence", SqlValue::Integer(i64::from(*sequence))));
                execute(&tx, table, &keys, record, &mut summary)?;
            }
        }

        if !bundle.award_items.is_empty() {
            let table = resolve_table(variant, Section::AwardItem)?;
            for (item, tenderer, record) in &bundle.award_items {
                let mut keys = identity.clone();
                keys.push(("item_sequence", SqlValue::Integer(i64::from(*item))));
                keys.push(("tenderer_sequence", SqlValue::Integer(i64::from(*tenderer))));
                execute(&tx, table, &keys, record, &mut summary)?;
            }
        }

        if !bundle.committee_members.is_empty() {
            let table = resolve_table(variant, Section::Committee)?;
            for record in &bundle.committee_members {
                let sequence = record
                    .get("sequence")
                    .and_then(|v| v.as_integer())
                    .ok_or_else(|| {
                        StoreError::InvalidData(format!(
                            "committee member without sequence in {}",
                            bundle.identity
                        ))
                    })?;
                let mut keys = identity.clone();
                keys.push(("sequence", SqlValue::Integer(sequence)));
                execute(&tx, table, &keys, record, &mut summary)?;
            }
        }

        tx.commit()?;
        info!(
            "Stored {} rows for {} across {} tables",
            summary.rows_written,
            bundle.identity,
            summary.tables.len()
        );
        Ok(summary)
    }
}
