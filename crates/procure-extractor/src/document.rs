//! Small helpers over the parsed HTML tree
//!
//! Notices are tables of label/value rows. These helpers read a row's
//! label (`th`) and value (`td`) cells without descending into nested
//! tables, which carry their own rows.

use crate::convert::remove_space;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());

/// All text under an element, concatenated
pub fn cell_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Direct element children with the given tag name
pub fn children_named<'a>(
    element: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

/// Rows of a table, looking through `thead`/`tbody`/`tfoot` wrappers
///
/// Rows of nested tables are not included.
pub fn direct_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(children_named(child, "tr")),
            _ => {}
        }
    }
    rows
}

/// The row's label with all whitespace removed, if it has a `th`
pub fn row_label(row: ElementRef<'_>) -> Option<String> {
    children_named(row, "th")
        .next()
        .map(|th| remove_space(&cell_text(th)))
}

/// The row's first value cell
pub fn row_value(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    children_named(row, "td").next()
}

/// First table nested anywhere under an element
pub fn inner_table(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.select(&TABLE).next()
}

/// Rows walked for a grouped section element
///
/// Grouped sections wrap their rows in an inner table; a section row
/// without one is walked as a single row.
pub fn section_rows(element: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    match inner_table(element) {
        Some(table) => direct_rows(table),
        None => vec![element],
    }
}
