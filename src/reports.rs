use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::types::{Bucket, Record, SessionTab};
use crate::util::composite_key;

/// Group records into buckets in first-seen order.
///
/// Every record opens its bucket; only records accepted by `in_scope` count
/// toward `total`, and of those only completed chapters toward `completed`.
fn group_buckets<'a, I, D, S>(records: I, dims: D, in_scope: S) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a Record>,
    D: Fn(&'a Record) -> (&'a str, &'a str),
    S: Fn(&Record) -> bool,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::new();
    for r in records {
        let (dim, subject) = dims(r);
        let key = composite_key(dim, subject);
        let slot = *index.entry(key).or_insert_with(|| {
            buckets.push(Bucket::new(dim, subject));
            buckets.len() - 1
        });
        tally(&mut buckets[slot], r, &in_scope);
    }
    buckets
}

fn tally(bucket: &mut Bucket, r: &Record, in_scope: impl Fn(&Record) -> bool) {
    if in_scope(r) {
        bucket.total += 1;
        if r.is_completed() {
            bucket.completed += 1;
        }
    }
}

/// Class progress per school and subject (progress chart, CSV export).
pub fn aggregate_by_school_subject<'a, I>(records: I) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a Record>,
{
    group_buckets(
        records,
        |r| (r.school_name.as_str(), r.subject.as_str()),
        Record::is_class,
    )
}

/// Per school and subject, counting every session inside `tab` (table view).
pub fn aggregate_by_school_subject_for_tab<'a, I>(records: I, tab: SessionTab) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a Record>,
{
    group_buckets(
        records,
        |r| (r.school_name.as_str(), r.subject.as_str()),
        |r| tab.includes(r),
    )
}

/// Class progress per month and subject over the full months × subjects grid.
///
/// Combinations with no records still get a zero bucket so every trend
/// series has a point for every month. Months and subjects are ascending.
pub fn aggregate_by_month_subject<'a, I>(records: I) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a Record>,
{
    let records: Vec<&Record> = records.into_iter().collect();
    let months: BTreeSet<&str> = records.iter().map(|r| r.month()).collect();
    let subjects: BTreeSet<&str> = records.iter().map(|r| r.subject.as_str()).collect();

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::with_capacity(months.len() * subjects.len());
    for month in &months {
        for subject in &subjects {
            index.insert(composite_key(month, subject), buckets.len());
            buckets.push(Bucket::new(month, subject));
        }
    }

    for r in records {
        if let Some(&slot) = index.get(&composite_key(r.month(), &r.subject)) {
            tally(&mut buckets[slot], r, Record::is_class);
        }
    }
    buckets
}

/// Bar chart series: one bar pair per school×subject bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressChart {
    pub labels: Vec<String>,
    pub totals: Vec<u32>,
    pub completed: Vec<u32>,
}

impl ProgressChart {
    pub fn from_buckets(buckets: &[Bucket]) -> Self {
        Self {
            labels: buckets
                .iter()
                .map(|b| format!("{}-{}", b.dimension, b.subject))
                .collect(),
            totals: buckets.iter().map(|b| b.total).collect(),
            completed: buckets.iter().map(|b| b.completed).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub subject: String,
    /// Completion ratio per month, aligned with [`TrendChart::months`].
    pub ratios: Vec<f64>,
}

/// Line chart series: the month axis plus one completion-ratio line per subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendChart {
    pub months: Vec<String>,
    pub series: Vec<TrendSeries>,
}

impl TrendChart {
    pub fn from_buckets(buckets: &[Bucket]) -> Self {
        let mut months: Vec<String> = Vec::new();
        let mut subjects: Vec<String> = Vec::new();
        let mut ratios: HashMap<String, f64> = HashMap::new();
        for b in buckets {
            if !months.contains(&b.dimension) {
                months.push(b.dimension.clone());
            }
            if !subjects.contains(&b.subject) {
                subjects.push(b.subject.clone());
            }
            ratios.insert(b.key.clone(), b.completion_ratio());
        }
        let series = subjects
            .into_iter()
            .map(|subject| TrendSeries {
                ratios: months
                    .iter()
                    .map(|m| {
                        ratios
                            .get(&composite_key(m, &subject))
                            .copied()
                            .unwrap_or(0.0)
                    })
                    .collect(),
                subject,
            })
            .collect();
        Self { months, series }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(school: &str, subject: &str, kind: &str, status: &str, date: &str) -> Record {
        Record {
            school_name: school.to_string(),
            subject: subject.to_string(),
            session_type: kind.to_string(),
            chapter_status: status.to_string(),
            session_date: date.to_string(),
            ..Record::default()
        }
    }

    #[test]
    fn two_class_records_half_complete() {
        let data = vec![
            rec("A", "Math", "Class", "Completed", "2024-03-01"),
            rec("A", "Math", "Class", "Pending", "2024-03-02"),
        ];
        let buckets = aggregate_by_school_subject(&data);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].total, 2);
        assert_eq!(buckets[0].completed, 1);
        assert!((buckets[0].completion_ratio() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn progress_counts_only_class_sessions() {
        let data = vec![
            rec("A", "Math", "Test", "Completed", "2024-03-01"),
            rec("A", "Math", "class", "Completed", "2024-03-01"),
            rec("B", "Art", "Class", "Completed", "2024-03-01"),
        ];
        let buckets = aggregate_by_school_subject(&data);
        assert_eq!(buckets.len(), 2);
        assert_eq!((buckets[0].total, buckets[0].completed), (0, 0));
        assert_eq!(buckets[0].completion_ratio(), 0.0);
        assert_eq!((buckets[1].total, buckets[1].completed), (1, 1));
    }

    #[test]
    fn buckets_keep_first_seen_order() {
        let data = vec![
            rec("C", "X", "Class", "", "2024-01-01"),
            rec("A", "X", "Class", "", "2024-01-01"),
            rec("C", "X", "Class", "", "2024-01-01"),
            rec("B", "Y", "Class", "", "2024-01-01"),
        ];
        let order: Vec<String> = aggregate_by_school_subject(&data)
            .into_iter()
            .map(|b| b.dimension)
            .collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn empty_and_lookalike_dimensions_stay_separate() {
        let data = vec![
            rec("", "", "Class", "Completed", "2024-01-01"),
            rec("", "A", "Class", "Completed", "2024-01-01"),
            rec("A", "", "Class", "Completed", "2024-01-01"),
            rec("A_B", "C", "Class", "Completed", "2024-01-01"),
            rec("A", "B_C", "Class", "Completed", "2024-01-01"),
        ];
        let buckets = aggregate_by_school_subject(&data);
        assert_eq!(buckets.len(), 5);
        assert!(buckets.iter().all(|b| b.total == 1));
    }

    #[test]
    fn aggregation_is_repeatable() {
        let data = vec![
            rec("A", "Math", "Class", "Completed", "2024-03-01"),
            rec("B", "Math", "Class", "Pending", "2024-03-02"),
            rec("A", "Art", "Test", "Completed", "2024-04-02"),
        ];
        assert_eq!(
            aggregate_by_school_subject(&data),
            aggregate_by_school_subject(&data)
        );
    }

    #[test]
    fn ratios_stay_in_unit_interval() {
        let data = vec![
            rec("A", "Math", "Class", "Completed", "2024-03-01"),
            rec("A", "Math", "Test", "Completed", "2024-03-01"),
            rec("B", "Art", "Test", "Pending", "2024-03-01"),
            rec("C", "Art", "Class", "Pending", "2024-03-01"),
        ];
        for b in aggregate_by_school_subject(&data)
            .iter()
            .chain(aggregate_by_month_subject(&data).iter())
        {
            let r = b.completion_ratio();
            assert!(r.is_finite() && (0.0..=1.0).contains(&r), "{b:?}");
        }
    }

    #[test]
    fn tab_scope_counts_all_session_types() {
        let data = vec![
            rec("A", "Math", "Class", "Completed", "2024-03-01"),
            rec("A", "Math", "Test", "Completed", "2024-03-02"),
            rec("A", "Math", "Workshop", "Pending", "2024-03-03"),
        ];
        let all = aggregate_by_school_subject_for_tab(&data, SessionTab::All);
        assert_eq!((all[0].total, all[0].completed), (3, 2));
        let tests = aggregate_by_school_subject_for_tab(&data, SessionTab::Test);
        assert_eq!((tests[0].total, tests[0].completed), (1, 1));
        let class = aggregate_by_school_subject_for_tab(&data, SessionTab::Class);
        assert_eq!(class, aggregate_by_school_subject(&data));
    }

    #[test]
    fn monthly_trend_zero_fills_cross_product() {
        let data = vec![
            rec("A", "Math", "Class", "Completed", "2024-04-01"),
            rec("A", "Science", "Class", "Pending", "2024-03-09"),
            rec("B", "Math", "Class", "Completed", "2024-04-15"),
        ];
        let buckets = aggregate_by_month_subject(&data);
        let cells: Vec<(&str, &str, u32, u32)> = buckets
            .iter()
            .map(|b| (b.dimension.as_str(), b.subject.as_str(), b.total, b.completed))
            .collect();
        assert_eq!(
            cells,
            vec![
                ("2024-03", "Math", 0, 0),
                ("2024-03", "Science", 1, 0),
                ("2024-04", "Math", 2, 2),
                ("2024-04", "Science", 0, 0),
            ]
        );
        assert_eq!(buckets[0].completion_ratio(), 0.0);
    }

    #[test]
    fn empty_input_gives_empty_aggregates() {
        let data: Vec<Record> = Vec::new();
        assert!(aggregate_by_school_subject(&data).is_empty());
        assert!(aggregate_by_school_subject_for_tab(&data, SessionTab::All).is_empty());
        assert!(aggregate_by_month_subject(&data).is_empty());
        assert_eq!(TrendChart::from_buckets(&[]), TrendChart::default());
    }

    #[test]
    fn works_on_filtered_references() {
        let data = vec![
            rec("A", "Math", "Class", "Completed", "2024-03-01"),
            rec("B", "Math", "Class", "Completed", "2024-03-01"),
        ];
        let only_a: Vec<&Record> = data.iter().filter(|r| r.school_name == "A").collect();
        let buckets = aggregate_by_school_subject(only_a);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].dimension, "A");
    }

    #[test]
    fn chart_series_shapes() {
        let data = vec![
            rec("A", "Math", "Class", "Completed", "2024-03-01"),
            rec("A", "Math", "Class", "Pending", "2024-04-01"),
            rec("B", "Art", "Class", "Completed", "2024-04-01"),
        ];
        let progress = ProgressChart::from_buckets(&aggregate_by_school_subject(&data));
        assert_eq!(progress.labels, vec!["A-Math", "B-Art"]);
        assert_eq!(progress.totals, vec![2, 1]);
        assert_eq!(progress.completed, vec![1, 1]);

        let trend = TrendChart::from_buckets(&aggregate_by_month_subject(&data));
        assert_eq!(trend.months, vec!["2024-03", "2024-04"]);
        assert_eq!(trend.series.len(), 2);
        assert_eq!(trend.series[0].subject, "Art");
        assert_eq!(trend.series[0].ratios, vec![0.0, 1.0]);
        assert_eq!(trend.series[1].subject, "Math");
        assert_eq!(trend.series[1].ratios, vec![1.0, 0.0]);
    }
}
