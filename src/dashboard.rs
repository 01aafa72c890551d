//! One pass of the dashboard pipeline: filter, aggregate, summarize.
//!
//! The dataset is borrowed, never stored, so every filter change simply calls
//! [`build_dashboard`] again over the same loaded data.
use serde::Serialize;

use crate::filter::{apply_filters, FilterOptions, FilterSelection};
use crate::reports::{
    aggregate_by_month_subject, aggregate_by_school_subject, aggregate_by_school_subject_for_tab,
    ProgressChart, TrendChart,
};
use crate::summary::summarize;
use crate::types::{Bucket, Dataset, SessionTab, Summary};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub selection: String,
    pub tab: SessionTab,
    pub record_count: usize,
    pub summary: Summary,
    /// Class progress per school×subject.
    pub progress: Vec<Bucket>,
    pub progress_chart: ProgressChart,
    pub trend_chart: TrendChart,
    /// Tab-scoped counts per school×subject.
    pub table: Vec<Bucket>,
}

pub fn build_dashboard(dataset: &Dataset, selection: &FilterSelection, tab: SessionTab) -> Dashboard {
    let filtered = apply_filters(dataset.records(), selection);
    tracing::debug!(
        "Dashboard pass: {} of {} records match {}",
        filtered.len(),
        dataset.len(),
        selection.describe()
    );

    let progress = aggregate_by_school_subject(filtered.iter().copied());
    let monthly = aggregate_by_month_subject(filtered.iter().copied());
    let table = aggregate_by_school_subject_for_tab(filtered.iter().copied(), tab);

    Dashboard {
        selection: selection.describe(),
        tab,
        record_count: filtered.len(),
        summary: summarize(filtered.iter().copied()),
        progress_chart: ProgressChart::from_buckets(&progress),
        trend_chart: TrendChart::from_buckets(&monthly),
        progress,
        table,
    }
}

/// Dropdown options always come from the full dataset, not the filtered one.
pub fn filter_options(dataset: &Dataset) -> FilterOptions {
    FilterOptions::from_records(dataset.records())
}
