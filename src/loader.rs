use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, TrackerError};
use crate::parser;
use crate::types::{
    Dataset, Record, COL_CHAPTER_STATUS, COL_SCHOOL, COL_SESSION_DATE, COL_SESSION_TYPE,
    COL_SUBJECT, KNOWN_COLUMNS,
};
use crate::util::parse_date_safe;

/// How the input text is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InputFormat {
    /// JSON for `.json` files, CSV otherwise.
    #[default]
    Auto,
    Csv,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Data rows seen after the header.
    pub total_rows: usize,
    pub loaded_records: usize,
    /// Rows with fewer cells than headers (padded with empty strings).
    pub short_rows: usize,
    /// Cells beyond the last header, dropped.
    pub overflow_cells: usize,
    pub unknown_columns: Vec<String>,
    pub missing_columns: Vec<String>,
    /// Records whose session date does not start with a valid `YYYY-MM-DD`.
    pub unparsed_dates: usize,
}

/// Map a header row plus data rows onto typed records.
pub fn normalize(rows: Vec<Vec<String>>) -> Result<Dataset> {
    normalize_with_report(rows).map(|(dataset, _)| dataset)
}

pub fn normalize_with_report(rows: Vec<Vec<String>>) -> Result<(Dataset, LoadReport)> {
    let mut rows = rows.into_iter();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| TrackerError::MalformedInput("no header row".to_string()))?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut report = LoadReport {
        unknown_columns: headers
            .iter()
            .filter(|h| !h.is_empty() && !KNOWN_COLUMNS.contains(&h.as_str()))
            .cloned()
            .collect(),
        missing_columns: KNOWN_COLUMNS
            .iter()
            .filter(|c| !headers.iter().any(|h| h == *c))
            .map(|c| c.to_string())
            .collect(),
        ..LoadReport::default()
    };

    let mut records = Vec::new();
    for row in rows {
        report.total_rows += 1;
        if row.len() < headers.len() {
            report.short_rows += 1;
        }
        report.overflow_cells += row.len().saturating_sub(headers.len());

        let mut cells = row.into_iter();
        let mut record = Record::default();
        for header in &headers {
            let value = cells.next().unwrap_or_default();
            if header.is_empty() {
                continue;
            }
            match header.as_str() {
                COL_SCHOOL => record.school_name = value,
                COL_SUBJECT => record.subject = value,
                COL_SESSION_TYPE => record.session_type = value,
                COL_CHAPTER_STATUS => record.chapter_status = value,
                COL_SESSION_DATE => record.session_date = value,
                other => {
                    record.extra.insert(other.to_string(), value);
                }
            }
        }
        record.subject = canonical_subject(record.subject);
        if parse_date_safe(&record.session_date).is_none() {
            report.unparsed_dates += 1;
        }
        records.push(record);
    }

    report.loaded_records = records.len();
    Ok((Dataset::new(headers, records), report))
}

/// "Maths" in any casing is the same subject as "Mathematics".
pub fn canonical_subject(subject: String) -> String {
    if subject.trim().eq_ignore_ascii_case("maths") {
        "Mathematics".to_string()
    } else {
        subject
    }
}

/// Read `source` (a path, or `-` for stdin), parse it and normalize it.
pub fn load_dataset(
    source: &str,
    format: InputFormat,
    delimiter: char,
) -> Result<(Dataset, LoadReport)> {
    let text = read_source(source)?;
    let format = match format {
        InputFormat::Auto => detect_format(source),
        f => f,
    };
    tracing::debug!("Parsing {} bytes from {} as {:?}", text.len(), source, format);

    let rows = match format {
        InputFormat::Json => parser::parse_values_json(&text)?,
        _ => parser::parse(&text, delimiter),
    };
    let (dataset, report) = normalize_with_report(rows)?;

    tracing::info!(
        "Loaded {} records from {} ({} data rows)",
        report.loaded_records,
        source,
        report.total_rows
    );
    if !report.missing_columns.is_empty() {
        tracing::warn!("Missing expected columns: {}", report.missing_columns.join(", "));
    }
    if report.short_rows > 0 || report.overflow_cells > 0 {
        tracing::warn!(
            "{} short rows padded, {} overflow cells dropped",
            report.short_rows,
            report.overflow_cells
        );
    }
    Ok((dataset, report))
}

fn detect_format(source: &str) -> InputFormat {
    let is_json = Path::new(source)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        InputFormat::Json
    } else {
        InputFormat::Csv
    }
}

fn read_source(source: &str) -> Result<String> {
    let fetch_failure = |e: std::io::Error| TrackerError::FetchFailure {
        source_name: source.to_string(),
        source: e,
    };
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(fetch_failure)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(source).map_err(fetch_failure)
    }
}
