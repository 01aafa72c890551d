use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tabled::Tabled;

pub const COL_SCHOOL: &str = "batch_or_school_name";
pub const COL_SUBJECT: &str = "subject";
pub const COL_SESSION_TYPE: &str = "session_type";
pub const COL_CHAPTER_STATUS: &str = "chapter_status";
pub const COL_SESSION_DATE: &str = "session_date";

pub const KNOWN_COLUMNS: [&str; 5] = [
    COL_SCHOOL,
    COL_SUBJECT,
    COL_SESSION_TYPE,
    COL_CHAPTER_STATUS,
    COL_SESSION_DATE,
];

pub const SESSION_CLASS: &str = "Class";
pub const SESSION_TEST: &str = "Test";
pub const STATUS_COMPLETED: &str = "Completed";

/// One tracked session, as normalized from a sheet row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Record {
    pub school_name: String,
    pub subject: String,
    pub session_type: String,
    pub chapter_status: String,
    pub session_date: String,
    /// Columns the tracker does not interpret, keyed by header name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Record {
    /// `YYYY-MM` part of the session date (shorter if the date is short).
    pub fn month(&self) -> &str {
        crate::util::month_of(&self.session_date)
    }

    pub fn is_class(&self) -> bool {
        self.session_type == SESSION_CLASS
    }

    pub fn is_test(&self) -> bool {
        self.session_type == SESSION_TEST
    }

    pub fn is_completed(&self) -> bool {
        self.chapter_status == STATUS_COMPLETED
    }

    /// Value of a column by its sheet header name. Unknown names give `""`.
    pub fn field(&self, name: &str) -> &str {
        match name {
            COL_SCHOOL => &self.school_name,
            COL_SUBJECT => &self.subject,
            COL_SESSION_TYPE => &self.session_type,
            COL_CHAPTER_STATUS => &self.chapter_status,
            COL_SESSION_DATE => &self.session_date,
            other => self.extra.get(other).map(String::as_str).unwrap_or(""),
        }
    }
}

/// The loaded sheet: header order plus records in source row order.
///
/// Built once by the loader and then only ever borrowed by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    headers: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, records: Vec<Record>) -> Self {
        Self { headers, records }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Session-type scope of the table view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
pub enum SessionTab {
    #[default]
    All,
    Class,
    Test,
}

impl SessionTab {
    pub fn includes(self, record: &Record) -> bool {
        match self {
            SessionTab::All => true,
            SessionTab::Class => record.is_class(),
            SessionTab::Test => record.is_test(),
        }
    }
}

impl fmt::Display for SessionTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionTab::All => "all",
            SessionTab::Class => "class",
            SessionTab::Test => "test",
        };
        f.write_str(s)
    }
}

/// Accumulator for one (dimension, subject) pair.
///
/// `dimension` is the school name for school×subject buckets and the
/// `YYYY-MM` month for month×subject buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub key: String,
    pub dimension: String,
    pub subject: String,
    pub total: u32,
    pub completed: u32,
}

impl Bucket {
    pub fn new(dimension: &str, subject: &str) -> Self {
        Self {
            key: crate::util::composite_key(dimension, subject),
            dimension: dimension.to_string(),
            subject: subject.to_string(),
            total: 0,
            completed: 0,
        }
    }

    /// `completed / total`, or 0 when nothing was in scope.
    pub fn completion_ratio(&self) -> f64 {
        crate::util::ratio(self.completed, self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Completion {
    pub done: u32,
    pub total: u32,
    pub pct: f64,
}

impl Completion {
    pub fn new(done: u32, total: u32) -> Self {
        Self {
            done,
            total,
            pct: crate::util::percent_1dp(done, total),
        }
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({:.1}%)", self.done, self.total, self.pct)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Summary {
    pub distinct_schools: usize,
    pub distinct_subjects: usize,
    pub class_completion: Completion,
    pub test_completion: Completion,
}

impl Summary {
    /// The one-line completion status shown under the summary cards.
    pub fn status_line(&self) -> String {
        format!(
            "Classes: {} | Tests: {}",
            self.class_completion, self.test_completion
        )
    }
}

/// Row of the progress export and preview; column names match the sheet download.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct ProgressRow {
    #[serde(rename = "School")]
    #[tabled(rename = "School")]
    pub school: String,
    #[serde(rename = "Subject")]
    #[tabled(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Classes_Done")]
    #[tabled(rename = "Classes Done")]
    pub classes_done: u32,
    #[serde(rename = "Classes_Total")]
    #[tabled(rename = "Total Classes")]
    pub classes_total: u32,
}

impl From<&Bucket> for ProgressRow {
    fn from(b: &Bucket) -> Self {
        Self {
            school: b.dimension.clone(),
            subject: b.subject.clone(),
            classes_done: b.completed,
            classes_total: b.total,
        }
    }
}

/// Row of the tab-scoped table view.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct TableRow {
    #[tabled(rename = "School")]
    pub school: String,
    #[tabled(rename = "Subject")]
    pub subject: String,
    #[tabled(rename = "Done")]
    pub done: u32,
    #[tabled(rename = "Total")]
    pub total: u32,
    #[tabled(rename = "Completion")]
    pub completion: String,
}

impl From<&Bucket> for TableRow {
    fn from(b: &Bucket) -> Self {
        Self {
            school: b.dimension.clone(),
            subject: b.subject.clone(),
            done: b.completed,
            total: b.total,
            completion: format!("{:.1}%", b.completion_ratio() * 100.0),
        }
    }
}
