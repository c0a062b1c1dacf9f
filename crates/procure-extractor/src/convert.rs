//! Cell conversions: raw cell text → typed [`Value`]

use chrono::NaiveDate;
use procure_domain::Value;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Years in notices are ROC calendar years; Gregorian = ROC + 1911
pub const ROC_ERA_OFFSET: i32 = 1911;

/// The affirmative character in yes/no cells
const AFFIRMATIVE: char = '是';

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)/(\d+)/(\d+)(?:\s*(\d+):(\d+))?").unwrap()
});
static MONEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$?(-?)([0-9,]+)").unwrap()
});
static INTEGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?)([0-9,]+)").unwrap()
});
static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\((?P<area>\d+)\))?\s*(?P<number>\**\d+[\d*]*)(?:\s*分機\s*(?P<ext>\**\d+[\d*]*))?").unwrap()
});

/// A conversion that could not produce a value and must not be swallowed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// Money/integer content without a leading number
    #[error("not a number: '{0}'")]
    MalformedNumeric(String),
}

/// The conversion applied to a mapped cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Trim surrounding whitespace
    Strip,
    /// Delete every whitespace run
    RemoveSpace,
    /// [`RemoveSpace`](Self::RemoveSpace), then decode `&lt;` / `&gt;`
    Unescape,
    /// True iff the text contains the affirmative character
    YesNo,
    /// Signed integer with thousands separators
    Integer,
    /// Money amount: optional `$`, optional `-`, thousands separators
    Money,
    /// ROC calendar date, optionally with `H:M`
    Date,
    /// Phone/fax number with optional area code and extension
    Phone,
}

impl Conversion {
    /// Convert a raw cell
    ///
    /// `Ok(None)` means the field is legitimately absent (an unparseable
    /// date, a blank phone cell); only numeric conversions can fail.
    pub fn apply(self, raw: &str) -> Result<Option<Value>, ConversionError> {
        let value = match self {
            Conversion::Strip => Value::Text(strip(raw)),
            Conversion::RemoveSpace => Value::Text(remove_space(raw)),
            Conversion::Unescape => Value::Text(unescape(raw)),
            Conversion::YesNo => Value::Boolean(yes_no(raw)),
            Conversion::Integer => Value::Integer(integer(raw)?),
            Conversion::Money => Value::Integer(money(raw)?),
            Conversion::Date => return Ok(date(raw)),
            Conversion::Phone => match phone(raw) {
                number if number.is_empty() => return Ok(None),
                number => Value::Text(number),
            },
        };
        Ok(Some(value))
    }
}

/// Trim surrounding whitespace
pub fn strip(raw: &str) -> String {
    raw.trim().to_string()
}

/// Delete all whitespace, including ideographic spaces
pub fn remove_space(raw: &str) -> String {
    raw.split_whitespace().collect()
}

/// Collapse whitespace and decode the two entities notices double-escape
pub fn unescape(raw: &str) -> String {
    remove_space(raw).replace("&lt;", "<").replace("&gt;", ">")
}

/// Substring match on the affirmative character, not equality
pub fn yes_no(raw: &str) -> bool {
    raw.contains(AFFIRMATIVE)
}

/// ROC `Y/M/D[ H:M]` → Gregorian date or date-time
///
/// Returns `None` when the pattern does not match or the date does not
/// exist on the calendar.
pub fn date(raw: &str) -> Option<Value> {
    let caps = DATE.captures(raw.trim())?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year.checked_add(ROC_ERA_OFFSET)?, month, day)?;

    match (caps.get(4), caps.get(5)) {
        (Some(h), Some(m)) => {
            let hour: u32 = h.as_str().parse().ok()?;
            let minute: u32 = m.as_str().parse().ok()?;
            date.and_hms_opt(hour, minute, 0).map(Value::DateTime)
        }
        _ => Some(Value::Date(date)),
    }
}

/// Money amount → integer
///
/// Whitespace is removed first. Trailing text after the digit run (a
/// currency suffix or a fractional part) is ignored; no digit run at the
/// start is an error.
pub fn money(raw: &str) -> Result<i64, ConversionError> {
    leading_number(&MONEY, raw)
}

/// Integer count → integer, same rules as [`money`] without the `$`
pub fn integer(raw: &str) -> Result<i64, ConversionError> {
    leading_number(&INTEGER, raw)
}

fn leading_number(pattern: &Regex, raw: &str) -> Result<i64, ConversionError> {
    let compact = remove_space(raw);
    let malformed = || ConversionError::MalformedNumeric(raw.trim().to_string());

    let caps = pattern.captures(&compact).ok_or_else(malformed)?;
    let digits: String = caps[2].chars().filter(|c| *c != ',').collect();
    if digits.is_empty() {
        return Err(malformed());
    }
    let magnitude: i64 = digits.parse().map_err(|_| malformed())?;
    Ok(if &caps[1] == "-" { -magnitude } else { magnitude })
}

/// `(area)number 分機 ext` → `area-number ext ext`
///
/// A cell with no digit run (`無`, `同上`) is returned trimmed.
pub fn phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(caps) = PHONE.captures(trimmed) else {
        return trimmed.to_string();
    };

    let mut out = String::new();
    if let Some(area) = caps.name("area") {
        out.push_str(area.as_str());
        out.push('-');
    }
    if let Some(number) = caps.name("number") {
        out.push_str(number.as_str());
    }
    if let Some(ext) = caps.name("ext") {
        out.push_str(" ext ");
        out.push_str(ext.as_str());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_without_time() {
        let v = date("113/05/20").unwrap();
        assert_eq!(v, Value::Date(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()));
    }

    #[test]
    fn test_date_with_time() {
        let v = date("113/05/20 14:30").unwrap();
        let dt = v.as_datetime().unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 5, 20).unwrap());
        assert_eq!(dt.format("%H:%M").to_string(), "14:30");
    }

    #[test]
    fn test_date_with_surrounding_whitespace() {
        assert!(date("\n   104/12/01   \n").is_some());
    }

    #[test]
    fn test_date_absent_is_none() {
        assert_eq!(date(""), None);
        assert_eq!(date("未定"), None);
        assert_eq!(date("113/13/01"), None);
        assert_eq!(date("113/02/30"), None);
    }

    #[test]
    fn test_date_conversion_never_fails() {
        assert_eq!(Conversion::Date.apply("none"), Ok(None));
    }

    #[test]
    fn test_money_parsing() {
        assert_eq!(money("$1,234,567"), Ok(1_234_567));
        assert_eq!(money("-500"), Ok(-500));
        assert_eq!(money("$-500"), Ok(-500));
        assert_eq!(money(" 1, 234 元"), Ok(1234));
        assert_eq!(money("4,530,000.00"), Ok(4_530_000));
    }

    #[test]
    fn test_money_rejects_non_numeric() {
        assert_eq!(
            money("abc"),
            Err(ConversionError::MalformedNumeric("abc".to_string()))
        );
        assert!(money("").is_err());
        assert!(money(",,").is_err());
        assert!(money("99999999999999999999").is_err());
    }

    #[test]
    fn test_integer_parsing() {
        assert_eq!(integer("12"), Ok(12));
        assert_eq!(integer(" 1,024 "), Ok(1024));
        assert!(integer("$12").is_err());
        assert!(Conversion::Integer.apply("n/a").is_err());
    }

    #[test]
    fn test_yes_no_is_substring_match() {
        assert!(yes_no("是"));
        assert!(yes_no("部分是"));
        assert!(!yes_no("否"));
        assert!(!yes_no(""));
    }

    #[test]
    fn test_phone_formats() {
        assert_eq!(phone("(02)23456789"), "02-23456789");
        assert_eq!(phone(" (049) 2222106 分機 123 "), "049-2222106 ext 123");
        assert_eq!(phone("23456789"), "23456789");
        assert_eq!(phone("(02)2345****"), "02-2345****");
        assert_eq!(phone("(02)****5678"), "02-****5678");
    }

    #[test]
    fn test_phone_without_number_keeps_text() {
        assert_eq!(phone(" 無 "), "無");
        assert_eq!(phone("同上"), "同上");
        assert_eq!(phone(""), "");
        assert_eq!(Conversion::Phone.apply("無"), Ok(Some(Value::from("無"))));
        assert_eq!(Conversion::Phone.apply("  "), Ok(None));
    }

    #[test]
    fn test_text_conversions() {
        assert_eq!(strip("  a b  "), "a b");
        assert_eq!(remove_space(" a \u{3000}b\n c "), "abc");
        assert_eq!(unescape("&lt;財物類&gt; 3 8 1"), "<財物類>381");
    }

    #[test]
    fn test_apply_tags_values() {
        assert_eq!(Conversion::YesNo.apply("是"), Ok(Some(Value::Boolean(true))));
        assert_eq!(Conversion::Money.apply("$10"), Ok(Some(Value::Integer(10))));
        assert_eq!(Conversion::Strip.apply(" x "), Ok(Some(Value::from("x"))));
    }
}
