//! Composite field resolvers
//!
//! Rows that encode more than one output field: the treaty trio and the
//! executing organization pair are decoded from one value cell by a single
//! pattern; committee members come from a flat run of cells; origin
//! country details come from a table nested in a value cell.

use crate::convert::{remove_space, yes_no};
use crate::document::{cell_text, children_named, direct_rows};
use crate::registry::ResolverId;
use procure_domain::Value;
use regex::Regex;
use scraper::ElementRef;
use std::slice::Chunks;
use std::sync::LazyLock;

static TREATY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(GPA\)：(?P<gpa>[是否]).*\(ANZTEC\)：(?P<anztec>[是否]).*\(ASTEP\)：(?P<astep>[是否])")
        .unwrap()
});
static EXECUTING_ORG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"機關代碼：(?P<id>[0-9.]+).*機關名稱：(?P<name>.+)").unwrap()
});

/// Fields produced by a composite row
pub type Resolved = Vec<(&'static str, Value)>;

/// Run a resolver over a value cell's text
///
/// `None` means the pattern did not match; no field is written in that
/// case, never a subset.
pub fn resolve(id: ResolverId, text: &str) -> Option<Resolved> {
    match id {
        ResolverId::TreatyTrio => treaty_trio(text),
        ResolverId::ExecutingOrganization => executing_organization(text),
    }
}

/// `…(GPA)：是…(ANZTEC)：否…(ASTEP)：是…` → three booleans
pub fn treaty_trio(text: &str) -> Option<Resolved> {
    let compact = remove_space(text);
    let caps = TREATY.captures(&compact)?;
    let [gpa, anztec, astep] = ["gpa", "anztec", "astep"].map(|name| yes_no(&caps[name]));
    let keys = ResolverId::TreatyTrio.output_keys();
    Some(vec![
        (keys[0], Value::Boolean(gpa)),
        (keys[1], Value::Boolean(anztec)),
        (keys[2], Value::Boolean(astep)),
    ])
}

/// `機關代碼：<id>…機關名稱：<name>` → id and name
pub fn executing_organization(text: &str) -> Option<Resolved> {
    let compact = remove_space(text);
    let caps = EXECUTING_ORG.captures(&compact)?;
    let keys = ResolverId::ExecutingOrganization.output_keys();
    Some(vec![
        (keys[0], Value::Text(caps["id"].to_string())),
        (keys[1], Value::Text(caps["name"].to_string())),
    ])
}

/// Outcome of splitting a flat cell run into fixed-width records
#[derive(Debug)]
pub enum Grouping<'c> {
    /// No cells at all
    Empty,
    /// Cell count is not a multiple of the width
    Malformed,
    /// Complete groups, in order
    Groups(Chunks<'c, String>),
}

/// Split cells into groups of `width`, refusing any remainder
pub fn group_cells(cells: &[String], width: usize) -> Grouping<'_> {
    if cells.is_empty() {
        Grouping::Empty
    } else if width == 0 || cells.len() % width != 0 {
        Grouping::Malformed
    } else {
        Grouping::Groups(cells.chunks(width))
    }
}

/// A table nested in a value cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubTable {
    /// A header row of labels followed by data rows
    Columns {
        /// Whitespace-free header labels
        headers: Vec<String>,
        /// Cells of the first data row
        first_row: Vec<String>,
        /// Data rows after the first, not mapped
        extra_rows: usize,
    },
    /// One `th` label and `td` value per row
    Rows(Vec<(String, String)>),
}

/// Read a nested table in either of its two shapes
///
/// When every non-empty row pairs a `th` label with a `td` value the table
/// is read row-wise. Otherwise the first row with `th` cells is the header
/// and the first row with `td` cells is the data. Returns `None` when
/// neither shape yields a label and a value.
pub fn read_sub_table(table: ElementRef<'_>) -> Option<SubTable> {
    let rows = direct_rows(table);
    let cells: Vec<(Vec<String>, Vec<String>)> = rows
        .iter()
        .map(|row| {
            let labels = children_named(*row, "th")
                .map(|th| remove_space(&cell_text(th)))
                .collect::<Vec<_>>();
            let values = children_named(*row, "td").map(cell_text).collect::<Vec<_>>();
            (labels, values)
        })
        .filter(|(labels, values)| !labels.is_empty() || !values.is_empty())
        .collect();

    let row_wise = !cells.is_empty()
        && cells
            .iter()
            .all(|(labels, values)| !labels.is_empty() && !values.is_empty());
    if row_wise {
        let pairs = cells
            .into_iter()
            .filter_map(|(labels, values)| {
                Some((labels.into_iter().next()?, values.into_iter().next()?))
            })
            .collect();
        return Some(SubTable::Rows(pairs));
    }

    let headers = cells
        .iter()
        .map(|(labels, _)| labels)
        .find(|labels| !labels.is_empty())?
        .clone();
    let mut data = cells
        .into_iter()
        .map(|(_, values)| values)
        .filter(|values| !values.is_empty());
    let first_row = data.next()?;
    let extra_rows = data.count();

    Some(SubTable::Columns {
        headers,
        first_row,
        extra_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn test_treaty_trio_all_present() {
        let text = "是否適用WTO政府採購協定(GPA)：是 \n 是否適用臺紐經濟合作協定(ANZTEC)：否 \
                    是否適用臺星經濟夥伴協定(ASTEP)：是";
        let resolved = treaty_trio(text).unwrap();
        assert_eq!(
            resolved,
            vec![
                ("is_gpa", Value::Boolean(true)),
                ("is_anztec", Value::Boolean(false)),
                ("is_astep", Value::Boolean(true)),
            ]
        );
    }

    #[test]
    fn test_treaty_trio_missing_anchor_is_all_absent() {
        let text = "(GPA)：是 (ANZTEC)：否";
        assert_eq!(treaty_trio(text), None);
        assert_eq!(resolve(ResolverId::TreatyTrio, ""), None);
    }

    #[test]
    fn test_executing_organization() {
        let text = "機關代碼： 3.13.1 \n 機關名稱： 交通部 運輸研究所";
        let resolved = executing_organization(text).unwrap();
        assert_eq!(resolved[0], ("executing_org_id", Value::from("3.13.1")));
        assert_eq!(resolved[1], ("executing_org_name", Value::from("交通部運輸研究所")));
        assert_eq!(executing_organization("機關名稱：交通部"), None);
    }

    #[test]
    fn test_group_cells() {
        let cells: Vec<String> = (0..8).map(|i| i.to_string()).collect();
        match group_cells(&cells, 4) {
            Grouping::Groups(groups) => assert_eq!(groups.count(), 2),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(group_cells(&cells[..7], 4), Grouping::Malformed));
        assert!(matches!(group_cells(&[], 4), Grouping::Empty));
    }

    #[test]
    fn test_eleven_cells_are_malformed() {
        let cells: Vec<String> = (0..11).map(|i| i.to_string()).collect();
        assert!(matches!(group_cells(&cells, 4), Grouping::Malformed));
    }

    #[test]
    fn test_read_sub_table() {
        let doc = Html::parse_document(
            "<table><tr><th>原產地 國別</th><th>原產地國別得標金額</th></tr>\
             <tr><td>本國</td><td>$1,000</td></tr>\
             <tr><td>日本</td><td>$2,000</td></tr></table>",
        );
        let table = doc.select(&Selector::parse("table").unwrap()).next().unwrap();
        assert_eq!(
            read_sub_table(table),
            Some(SubTable::Columns {
                headers: vec!["原產地國別".to_string(), "原產地國別得標金額".to_string()],
                first_row: vec!["本國".to_string(), "$1,000".to_string()],
                extra_rows: 1,
            })
        );
    }

    #[test]
    fn test_read_sub_table_row_pairs() {
        let doc = Html::parse_document(
            "<table><tr><th>原產地國別</th><td>中華民國</td></tr>\
             <tr><th>原產地國別 得標金額</th><td>$4,000,000元</td></tr></table>",
        );
        let table = doc.select(&Selector::parse("table").unwrap()).next().unwrap();
        assert_eq!(
            read_sub_table(table),
            Some(SubTable::Rows(vec![
                ("原產地國別".to_string(), "中華民國".to_string()),
                ("原產地國別得標金額".to_string(), "$4,000,000元".to_string()),
            ]))
        );
    }

    #[test]
    fn test_sub_table_without_data() {
        let doc = Html::parse_document("<table><tr><th>a</th></tr></table>");
        let table = doc.select(&Selector::parse("table").unwrap()).next().unwrap();
        assert_eq!(read_sub_table(table), None);
    }
}
