//! Turns raw sheet text into a grid of string cells.
//!
//! Line-oriented splitting only: a quoted field that contains the delimiter or
//! a line break is split like any other text. Published sheet exports of the
//! tracker never carry such values.
use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_DELIMITER: char = ',';

/// Split `text` into rows of trimmed cells.
///
/// Empty or all-whitespace input yields no rows.
pub fn parse(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    text.lines()
        .map(|line| line.split(delimiter).map(clean_cell).collect())
        .collect()
}

/// Trim a cell and drop one pair of enclosing double quotes, collapsing the
/// doubled quotes inside.
fn clean_cell(raw: &str) -> String {
    let cell = raw.trim();
    if cell.len() >= 2 && cell.starts_with('"') && cell.ends_with('"') {
        cell[1..cell.len() - 1].replace("\"\"", "\"")
    } else {
        cell.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Read a `{"values": [[...], ...]}` grid, as returned by a spreadsheet values API.
///
/// Strings are taken as-is (trimmed); other scalars are rendered with their
/// JSON text and `null` becomes an empty cell.
pub fn parse_values_json(text: &str) -> Result<Vec<Vec<String>>> {
    let resp: ValuesResponse = serde_json::from_str(text)?;
    let rows = resp
        .values
        .into_iter()
        .map(|row| row.into_iter().map(json_cell).collect())
        .collect();
    Ok(rows)
}

fn json_cell(v: serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_lines_and_cells() {
        let rows = parse("a,b,c\n1, 2 ,3\n", ',');
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn handles_crlf_and_missing_trailing_newline() {
        let rows = parse("a,b\r\nx,y", ',');
        assert_eq!(rows, vec![vec!["a", "b"], vec!["x", "y"]]);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(parse("", ',').is_empty());
        assert!(parse("  \n\t ", ',').is_empty());
    }

    #[test]
    fn custom_delimiter() {
        let rows = parse("a;b\n1;2", ';');
        assert_eq!(rows[1], vec!["1", "2"]);
    }

    #[test]
    fn unwraps_simple_quoted_cells() {
        let rows = parse(r#""a","say ""hi""",plain"#, ',');
        assert_eq!(rows[0], vec!["a", r#"say "hi""#, "plain"]);
    }

    #[test]
    fn quoted_delimiter_is_not_supported() {
        let rows = parse(r#""Lincoln, HS",Maths"#, ',');
        assert_eq!(rows[0], vec!["\"Lincoln", "HS\"", "Maths"]);
    }

    #[test]
    fn values_json_grid() {
        let text = r#"{"range":"Import!A1:C3","values":[["a","b","c"],["x",3,null],["y"]]}"#;
        let rows = parse_values_json(text).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["x", "3", ""]);
        assert_eq!(rows[2], vec!["y"]);
    }

    #[test]
    fn values_json_without_values_is_empty() {
        assert!(parse_values_json(r#"{"range":"Import"}"#).unwrap().is_empty());
    }

    #[test]
    fn values_json_rejects_garbage() {
        assert!(parse_values_json("not json").is_err());
    }
}
