//! Snapshot diffing for tracker entries.

use crate::model::{CanonicalEntry, DiffRecord};

/// Compare a freshly fetched sequence against the previous snapshot.
///
/// Entries are matched by name; names are expected unique and the first
/// match wins silently. A record is emitted for entries that are new or
/// whose (status, status date) pair moved. Date comparison is on the
/// instant: both absent is equal, exactly one absent is not. Output keeps
/// the order of `current`.
pub fn diff_entries(prior: &[CanonicalEntry], current: &[CanonicalEntry]) -> Vec<DiffRecord> {
    let mut records = Vec::new();

    for entry in current {
        let old = prior.iter().find(|p| p.name == entry.name);
        let changed = match old {
            None => true,
            Some(old) => old.status != entry.status || old.status_date != entry.status_date,
        };
        if changed {
            records.push(DiffRecord {
                name: entry.name.clone(),
                start_date: entry.start_date,
                old_status: old.map(|o| o.status),
                old_status_date: old.and_then(|o| o.status_date),
                new_status: entry.status,
                new_status_date: entry.status_date,
            });
        }
    }

    records
}
