//! Upsert statement generation
//!
//! A record becomes one `INSERT … ON CONFLICT … DO UPDATE` over exactly
//! the columns it carries, so a field absent from the record never
//! overwrites a stored column.

use crate::StoreError;
use procure_domain::{Record, Value};
use rusqlite::types::Value as SqlValue;
use tracing::debug;

/// A parameterized statement ready to execute
#[derive(Debug, Clone, PartialEq)]
pub struct Upsert {
    /// SQL text with `?N` placeholders
    pub sql: String,
    /// Bound values, in placeholder order
    pub params: Vec<SqlValue>,
}

/// Bind a record value by its tag
///
/// Booleans are stored as 0/1, dates as `YYYY-MM-DD` and date-times as
/// `YYYY-MM-DD HH:MM:SS` text.
pub fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Integer(n) => SqlValue::Integer(*n),
        Value::Boolean(b) => SqlValue::Integer(i64::from(*b)),
        Value::Date(_) | Value::DateTime(_) => SqlValue::Text(value.to_string()),
    }
}

/// Build the upsert for one record
///
/// `keys` are the conflict target columns with their values; they take
/// precedence over a record field of the same name.
pub fn build_upsert(
    table: &str,
    keys: &[(&str, SqlValue)],
    record: &Record,
) -> Result<Upsert, StoreError> {
    check_identifier(table)?;
    if keys.is_empty() {
        return Err(StoreError::InvalidData(format!("no key columns for {}", table)));
    }

    let mut columns: Vec<&str> = Vec::with_capacity(keys.len() + record.len());
    let mut params: Vec<SqlValue> = Vec::with_capacity(keys.len() + record.len());

    for (column, value) in keys {
        check_identifier(column)?;
        columns.push(*column);
        params.push(value.clone());
    }

    let mut updates = Vec::new();
    for (column, value) in record.iter() {
        if keys.iter().any(|(key, _)| *key == column) {
            debug!("{}: key column {} taken from identity, record value skipped", table, column);
            continue;
        }
        check_identifier(column)?;
        columns.push(column);
        params.push(to_sql(value));
        updates.push(format!("{0} = excluded.{0}", column));
    }

    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    let conflict = keys.iter().map(|(k, _)| *k).collect::<Vec<_>>().join(", ");
    let action = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({}) {}",
        table,
        columns.join(", "),
        placeholders.join(", "),
        conflict,
        action
    );
    Ok(Upsert { sql, params })
}

/// Column and table names are interpolated, so only plain identifiers pass
fn check_identifier(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidData(format!("invalid identifier '{}'", name)))
    }
}
