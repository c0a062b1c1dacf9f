//! Row walker: turns a section's label/value rows into records
//!
//! One function per [`SectionLayout`]. All per-document state lives in
//! the [`ExtractionContext`] passed in and the locals of each walk, so a
//! walk can run on any thread against any document.

use crate::convert::Conversion;
use crate::document::{cell_text, inner_table, row_label, row_value, section_rows};
use crate::error::ExtractorError;
use crate::registry::{FieldRule, RegistrySet, SectionLayout, SectionSpec};
use crate::resolvers::{self, Grouping, SubTable};
use procure_domain::{ExtractionWarning, IdentityKey, Record};
use regex::Regex;
use scraper::ElementRef;
use std::collections::BTreeMap;
use tracing::debug;

/// Per-document state shared by every section walk
#[derive(Debug, Clone, Copy)]
pub struct ExtractionContext<'a> {
    /// Identity of the document being read
    pub identity: &'a IdentityKey,
    /// Root content table
    pub root: ElementRef<'a>,
    /// Registry set for the document's variant
    pub registry: &'a RegistrySet,
}

/// Records produced by one section walk
#[derive(Debug, Clone, PartialEq)]
pub enum SectionOutput {
    /// Single record, `None` if no field mapped
    Flat(Option<Record>),
    /// `(sequence, record)` sorted by sequence
    Groups(Vec<(u32, Record)>),
    /// `(item, vendor, record)` sorted by item then vendor
    Nested(Vec<(u32, u32, Record)>),
    /// Positional records in document order
    List(Vec<Record>),
}

/// Walk one section of the document
pub fn walk_section(
    ctx: &ExtractionContext<'_>,
    spec: &SectionSpec,
    warnings: &mut Vec<ExtractionWarning>,
) -> Result<SectionOutput, ExtractorError> {
    match spec.layout {
        SectionLayout::Flat => walk_flat(ctx, spec, warnings).map(SectionOutput::Flat),
        SectionLayout::Grouped {
            marker,
            sequence_key,
        } => walk_grouped(ctx, spec, marker, sequence_key, warnings).map(SectionOutput::Groups),
        SectionLayout::Nested {
            item_marker,
            vendor_marker,
            item_key,
            vendor_key,
            ..
        } => walk_nested(ctx, spec, (item_marker, vendor_marker), (item_key, vendor_key), warnings)
            .map(SectionOutput::Nested),
        SectionLayout::FlatList { width } => {
            walk_flat_list(ctx, spec, width, warnings).map(SectionOutput::List)
        }
    }
}

fn walk_flat(
    ctx: &ExtractionContext<'_>,
    spec: &SectionSpec,
    warnings: &mut Vec<ExtractionWarning>,
) -> Result<Option<Record>, ExtractorError> {
    let mut record = Record::new();

    for row in ctx.root.select(&spec.selector) {
        let Some(label) = row_label(row) else { continue };
        let Some(rule) = spec.rule(&label) else {
            debug!("{}: ignoring unmapped label '{}'", spec.section, label);
            continue;
        };
        let Some(value) = row_value(row) else { continue };
        apply_rule(spec, &label, rule, value, &mut record, warnings)?;
    }

    Ok((!record.is_empty()).then_some(record))
}

fn walk_grouped(
    ctx: &ExtractionContext<'_>,
    spec: &SectionSpec,
    marker: &Regex,
    sequence_key: &str,
    warnings: &mut Vec<ExtractionWarning>,
) -> Result<Vec<(u32, Record)>, ExtractorError> {
    let mut groups: BTreeMap<u32, Record> = BTreeMap::new();

    for element in ctx.root.select(&spec.selector) {
        // Groups never span section rows
        let mut current: Option<u32> = None;
        for row in section_rows(element) {
            let Some(label) = row_label(row) else { continue };

            if let Some(n) = ordinal(marker, &label) {
                if groups.contains_key(&n) {
                    debug!("{}: group {} repeated, restarting it", spec.section, n);
                }
                groups.insert(n, Record::new().with(sequence_key, i64::from(n)));
                current = Some(n);
                continue;
            }

            let Some(rule) = spec.rule(&label) else {
                debug!("{}: ignoring unmapped label '{}'", spec.section, label);
                continue;
            };
            let Some(record) = current.and_then(|n| groups.get_mut(&n)) else {
                warnings.push(ExtractionWarning::OrphanGroup {
                    section: spec.section,
                    label,
                });
                continue;
            };
            let Some(value) = row_value(row) else { continue };
            apply_rule(spec, &label, rule, value, record, warnings)?;
        }
    }

    Ok(groups.into_iter().collect())
}

fn walk_nested(
    ctx: &ExtractionContext<'_>,
    spec: &SectionSpec,
    (item_marker, vendor_marker): (&Regex, &Regex),
    (item_key, vendor_key): (&str, &str),
    warnings: &mut Vec<ExtractionWarning>,
) -> Result<Vec<(u32, u32, Record)>, ExtractorError> {
    let mut groups: BTreeMap<(u32, u32), Record> = BTreeMap::new();

    for element in ctx.root.select(&spec.selector) {
        let mut item = 0u32;
        let mut vendor = 0u32;
        let mut carry = Record::new();
        for row in section_rows(element) {
            let Some(label) = row_label(row) else { continue };

            if let Some(n) = ordinal(item_marker, &label) {
                item = n;
                vendor = 0;
                carry = Record::new();
                continue;
            }

            if let Some(n) = ordinal(vendor_marker, &label) {
                if item == 0 {
                    warnings.push(ExtractionWarning::OrphanGroup {
                        section: spec.section,
                        label,
                    });
                    vendor = 0;
                    continue;
                }
                vendor = n;
                let mut record = Record::new()
                    .with(item_key, i64::from(item))
                    .with(vendor_key, i64::from(vendor));
                record.merge(&carry);
                groups.insert((item, vendor), record);
                continue;
            }

            let Some(rule) = spec.rule(&label) else {
                debug!("{}: ignoring unmapped label '{}'", spec.section, label);
                continue;
            };
            let Some(value) = row_value(row) else { continue };

            let carried = matches!(rule, FieldRule::Direct { key, .. } if spec.is_carry(key));
            let target = if carried && item != 0 {
                Some(&mut carry)
            } else if vendor != 0 {
                groups.get_mut(&(item, vendor))
            } else {
                None
            };

            match target {
                Some(record) => apply_rule(spec, &label, rule, value, record, warnings)?,
                None => warnings.push(ExtractionWarning::OrphanGroup {
                    section: spec.section,
                    label,
                }),
            }
        }
    }

    Ok(groups
        .into_iter()
        .map(|((item, vendor), record)| (item, vendor, record))
        .collect())
}

fn walk_flat_list(
    ctx: &ExtractionContext<'_>,
    spec: &SectionSpec,
    width: usize,
    warnings: &mut Vec<ExtractionWarning>,
) -> Result<Vec<Record>, ExtractorError> {
    let Some(container) = ctx.root.select(&spec.selector).next() else {
        return Ok(Vec::new());
    };
    let cells: Vec<String> = container
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td" && *el != container)
        .map(cell_text)
        .collect();

    let groups = match resolvers::group_cells(&cells, width) {
        Grouping::Empty => return Ok(Vec::new()),
        Grouping::Malformed => {
            warnings.push(ExtractionWarning::MalformedGrouping {
                section: spec.section,
                cells: cells.len(),
                width,
            });
            return Ok(Vec::new());
        }
        Grouping::Groups(groups) => groups,
    };

    let mut records = Vec::new();
    for group in groups {
        let mut record = Record::new();
        for (cell, (label, rule)) in group.iter().zip(spec.fields()) {
            if let FieldRule::Direct { key, conversion } = rule {
                convert_into(&mut record, key, *conversion, cell)?;
            } else {
                debug!("{}: composite column '{}' skipped", spec.section, label);
            }
        }
        records.push(record);
    }
    Ok(records)
}

/// Map one labeled value cell into a record
fn apply_rule(
    spec: &SectionSpec,
    label: &str,
    rule: &FieldRule,
    value: ElementRef<'_>,
    record: &mut Record,
    warnings: &mut Vec<ExtractionWarning>,
) -> Result<(), ExtractorError> {
    match rule {
        FieldRule::Direct { key, conversion } => {
            if let Some(table) = inner_table(value) {
                if apply_sub_table(spec, table, record)? > 0 {
                    return Ok(());
                }
            }
            convert_into(record, key, *conversion, &cell_text(value))
        }
        FieldRule::Composite(id) => {
            match resolvers::resolve(*id, &cell_text(value)) {
                Some(fields) => {
                    for (key, v) in fields {
                        debug!("{}: {} = {}", spec.section, key, v);
                        record.insert(key, v);
                    }
                }
                None => warnings.push(ExtractionWarning::UnmatchedComposite {
                    section: spec.section,
                    label: label.to_string(),
                }),
            }
            Ok(())
        }
    }
}

/// Map a nested table through the section's rules
///
/// Column-shaped tables map header labels onto the first data row;
/// row-shaped tables map each row's label onto its value. Returns the
/// number of fields written; zero means no label was known and the caller
/// falls back to the cell text.
fn apply_sub_table(
    spec: &SectionSpec,
    table: ElementRef<'_>,
    record: &mut Record,
) -> Result<usize, ExtractorError> {
    let pairs: Vec<(String, String)> = match resolvers::read_sub_table(table) {
        None => return Ok(0),
        Some(SubTable::Rows(pairs)) => pairs,
        Some(SubTable::Columns {
            headers,
            first_row,
            extra_rows,
        }) => {
            if extra_rows > 0 {
                debug!(
                    "{}: sub-table has {} extra rows, using the first",
                    spec.section, extra_rows
                );
            }
            headers.into_iter().zip(first_row).collect()
        }
    };

    let mut written = 0;
    for (label, cell) in &pairs {
        match spec.rule(label) {
            Some(FieldRule::Direct { key, conversion }) => {
                convert_into(record, key, *conversion, cell)?;
                written += 1;
            }
            _ => debug!("{}: ignoring sub-table label '{}'", spec.section, label),
        }
    }
    Ok(written)
}

fn convert_into(
    record: &mut Record,
    key: &str,
    conversion: Conversion,
    raw: &str,
) -> Result<(), ExtractorError> {
    let converted = conversion
        .apply(raw)
        .map_err(|_| ExtractorError::MalformedNumeric {
            field: key.to_string(),
            value: raw.trim().to_string(),
        })?;
    match converted {
        Some(value) => {
            debug!("{} = {}", key, value);
            record.insert(key, value);
        }
        None => debug!("{}: no value in '{}'", key, raw.trim()),
    }
    Ok(())
}

fn ordinal(marker: &Regex, label: &str) -> Option<u32> {
    marker.captures(label)?.get(1)?.as_str().parse().ok()
}
