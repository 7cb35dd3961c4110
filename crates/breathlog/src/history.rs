//! Grouped history view.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::entry::{LogCollection, LogEntry};

/// Entries grouped by date, oldest date first.
pub type DateGroups<'a> = BTreeMap<NaiveDate, Vec<&'a LogEntry>>;

/// Group entries by their date.
///
/// Within a date, entries keep their save order. Every entry lands in exactly
/// one group.
#[must_use]
pub fn group_by_date(collection: &LogCollection) -> DateGroups<'_> {
    let mut groups = DateGroups::new();
    for entry in collection {
        groups.entry(entry.date).or_default().push(entry);
    }
    groups
}
