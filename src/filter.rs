use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{Result, TrackerError};
use crate::types::Record;
use crate::util::is_valid_month;

/// Dropdown state. `None` or an empty string means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub school_name: Option<String>,
    pub subject: Option<String>,
    pub month: Option<String>,
}

fn active(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.is_empty())
}

impl FilterSelection {
    pub fn is_empty(&self) -> bool {
        active(&self.school_name).is_none()
            && active(&self.subject).is_none()
            && active(&self.month).is_none()
    }

    pub fn matches(&self, record: &Record) -> bool {
        active(&self.school_name).map_or(true, |s| record.school_name == s)
            && active(&self.subject).map_or(true, |s| record.subject == s)
            && active(&self.month).map_or(true, |m| record.session_date.starts_with(m))
    }

    /// Reject a month filter that is not a real `YYYY-MM`.
    pub fn validate_month(&self) -> Result<()> {
        match active(&self.month) {
            Some(m) if !is_valid_month(m) => Err(TrackerError::InvalidFilter(format!(
                "month {m:?} is not YYYY-MM"
            ))),
            _ => Ok(()),
        }
    }

    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "all records".to_string();
        }
        let parts: Vec<String> = [
            ("school", active(&self.school_name)),
            ("subject", active(&self.subject)),
            ("month", active(&self.month)),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.map(|v| format!("{name}={v}")))
        .collect();
        parts.join(", ")
    }
}

/// Records satisfying every active constraint, in their original order.
pub fn apply_filters<'a>(records: &'a [Record], selection: &FilterSelection) -> Vec<&'a Record> {
    records.iter().filter(|r| selection.matches(r)).collect()
}

/// Sorted distinct values offered by the school, subject and month dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub schools: Vec<String>,
    pub subjects: Vec<String>,
    pub months: Vec<String>,
}

impl FilterOptions {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut schools = BTreeSet::new();
        let mut subjects = BTreeSet::new();
        let mut months = BTreeSet::new();
        for r in records {
            if !r.school_name.is_empty() {
                schools.insert(r.school_name.clone());
            }
            if !r.subject.is_empty() {
                subjects.insert(r.subject.clone());
            }
            if !r.month().is_empty() {
                months.insert(r.month().to_string());
            }
        }
        Self {
            schools: schools.into_iter().collect(),
            subjects: subjects.into_iter().collect(),
            months: months.into_iter().collect(),
        }
    }
}
