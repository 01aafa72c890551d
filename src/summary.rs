use std::collections::HashSet;

use crate::types::{Completion, Record, Summary};

/// Summary cards: distinct schools and subjects plus class/test completion.
pub fn summarize<'a, I>(records: I) -> Summary
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut schools: HashSet<&str> = HashSet::new();
    let mut subjects: HashSet<&str> = HashSet::new();
    let (mut classes_done, mut classes_total) = (0u32, 0u32);
    let (mut tests_done, mut tests_total) = (0u32, 0u32);

    for r in records {
        if !r.school_name.is_empty() {
            schools.insert(&r.school_name);
        }
        if !r.subject.is_empty() {
            subjects.insert(&r.subject);
        }
        if r.is_class() {
            classes_total += 1;
            if r.is_completed() {
                classes_done += 1;
            }
        } else if r.is_test() {
            tests_total += 1;
            if r.is_completed() {
                tests_done += 1;
            }
        }
    }

    Summary {
        distinct_schools: schools.len(),
        distinct_subjects: subjects.len(),
        class_completion: Completion::new(classes_done, classes_total),
        test_completion: Completion::new(tests_done, tests_total),
    }
}
