// Small helpers shared by the loader, the aggregations and the console output.
//
// Everything here is total: no helper panics or returns NaN on odd input.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Separator between the two halves of a composite bucket key.
pub const KEY_SEPARATOR: char = '\u{1F}';

/// First 7 characters of a `YYYY-MM-DD...` date, i.e. the month.
///
/// Counts characters rather than bytes so a malformed cell with multi-byte
/// text never splits a code point.
pub fn month_of(date: &str) -> &str {
    match date.char_indices().nth(7) {
        Some((idx, _)) => &date[..idx],
        None => date,
    }
}

/// Parse the leading `YYYY-MM-DD` of a session date.
pub fn parse_date_safe(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let head = match s.char_indices().nth(10) {
        Some((idx, _)) => &s[..idx],
        None => s,
    };
    if head.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Whether `s` is a `YYYY-MM` naming a real calendar month.
pub fn is_valid_month(s: &str) -> bool {
    s.len() == 7 && NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").is_ok()
}

/// Unambiguous key for a pair of dimension values.
///
/// The first value is prefixed with its byte length, so no two distinct
/// pairs can encode to the same string even if a value contains the
/// separator or is empty.
pub fn composite_key(a: &str, b: &str) -> String {
    format!("{}:{}{}{}", a.len(), a, KEY_SEPARATOR, b)
}

/// `num / den`, defined as 0 when `den` is 0.
pub fn ratio(num: u32, den: u32) -> f64 {
    if den == 0 {
        return 0.0;
    }
    num as f64 / den as f64
}

/// Percentage rounded to one decimal place; 0 when `den` is 0.
pub fn percent_1dp(num: u32, den: u32) -> f64 {
    round_1dp(ratio(num, den) * 100.0)
}

pub fn round_1dp(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
