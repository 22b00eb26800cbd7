//! Community tracker: fetch, normalize, diff, persist.

pub mod diff;
pub mod normalize;
pub mod sheet;

use crate::error::FetchError;
use crate::model::{CanonicalEntry, DiffRecord};
use crate::store::{BlobStore, SnapshotStore};
use sheet::EntrySource;

/// In-memory view of the tracker plus its persisted snapshot.
///
/// The cache is replaced wholesale after each successful fetch; there is
/// no partial mutation and no rollback. A sparse fetch that still
/// succeeds becomes the new baseline.
pub struct ForumTracker<S> {
    source: Box<dyn EntrySource>,
    snapshots: SnapshotStore<S>,
    cache: Option<Vec<CanonicalEntry>>,
}

impl<S: BlobStore> ForumTracker<S> {
    pub fn new(source: Box<dyn EntrySource>, snapshots: SnapshotStore<S>) -> Self {
        Self {
            source,
            snapshots,
            cache: None,
        }
    }

    /// Entries as of the last prime or cycle.
    pub fn entries(&self) -> Option<&[CanonicalEntry]> {
        self.cache.as_deref()
    }

    /// Seed the cache: the on-disk snapshot if one is readable, a fresh
    /// fetch otherwise. An unreadable snapshot counts as absent.
    pub fn prime(&mut self) -> Result<(), FetchError> {
        match self.snapshots.load() {
            Ok(Some(entries)) => {
                tracing::info!(entries = entries.len(), "loaded entry snapshot");
                self.cache = Some(entries);
                return Ok(());
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("snapshot unreadable, fetching fresh: {err}"),
        }

        let entries = self.source.fetch()?;
        self.persist(&entries);
        self.cache = Some(entries);
        Ok(())
    }

    /// One diff cycle: fetch, compare against the cache, and make the
    /// fetched sequence the new baseline even when nothing changed.
    /// Without a primed cache there is nothing to compare against, so the
    /// cycle reports no changes; callers that care must prime first.
    pub fn diff_cycle(&mut self) -> Result<Vec<DiffRecord>, FetchError> {
        let Some(prior) = self.cache.as_deref() else {
            return Ok(Vec::new());
        };

        let current = self.source.fetch()?;
        let records = diff::diff_entries(prior, &current);
        self.persist(&current);
        self.cache = Some(current);
        tracing::info!(changes = records.len(), "finished forum entries diff");
        Ok(records)
    }

    fn persist(&mut self, entries: &[CanonicalEntry]) {
        if let Err(err) = self.snapshots.save(entries) {
            tracing::warn!("snapshot write failed, baseline advances in memory only: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CaseStatus;
    use crate::store::MemBlobStore;
    use chrono::{DateTime, TimeZone, Utc};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Pops one canned response per fetch.
    struct ScriptedSource {
        responses: RefCell<VecDeque<Result<Vec<CanonicalEntry>, FetchError>>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Vec<CanonicalEntry>, FetchError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
            }
        }
    }

    impl EntrySource for ScriptedSource {
        fn fetch(&self) -> Result<Vec<CanonicalEntry>, FetchError> {
            self.responses
                .borrow_mut()
                .pop_front()
                .expect("unscripted fetch")
        }
    }

    fn date(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, day, 0, 0, 0).unwrap()
    }

    fn entry(name: &str, status: CaseStatus, day: u32) -> CanonicalEntry {
        CanonicalEntry {
            name: name.to_string(),
            start_date: Some(date(1)),
            status,
            status_date: Some(date(day)),
        }
    }

    fn tracker(
        responses: Vec<Result<Vec<CanonicalEntry>, FetchError>>,
    ) -> ForumTracker<MemBlobStore> {
        ForumTracker::new(
            Box::new(ScriptedSource::new(responses)),
            SnapshotStore::new(MemBlobStore::default()),
        )
    }

    #[test]
    fn status_move_is_reported_once_then_quiet() {
        let mut tracker = tracker(vec![
            Ok(vec![entry("A", CaseStatus::Sent, 2)]),
            Ok(vec![entry("A", CaseStatus::Received, 9)]),
            Ok(vec![entry("A", CaseStatus::Received, 9)]),
        ]);

        tracker.prime().unwrap();

        let records = tracker.diff_cycle().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "A");
        assert_eq!(records[0].old_status, Some(CaseStatus::Sent));
        assert_eq!(records[0].old_status_date, Some(date(2)));
        assert_eq!(records[0].new_status, CaseStatus::Received);
        assert_eq!(records[0].new_status_date, Some(date(9)));

        // Same data again: the first fetch became the baseline.
        assert!(tracker.diff_cycle().unwrap().is_empty());
    }

    #[test]
    fn fetch_failure_leaves_the_baseline_untouched() {
        let mut tracker = tracker(vec![
            Ok(vec![entry("A", CaseStatus::Sent, 2)]),
            Err(FetchError::Payload("boom".to_string())),
            Ok(vec![entry("A", CaseStatus::Sent, 2)]),
        ]);

        tracker.prime().unwrap();
        assert!(tracker.diff_cycle().is_err());

        // The failed cycle must not have advanced the baseline.
        assert!(tracker.diff_cycle().unwrap().is_empty());
    }

    #[test]
    fn unprimed_tracker_reports_no_changes_without_fetching() {
        let mut tracker = tracker(Vec::new());
        assert!(tracker.diff_cycle().unwrap().is_empty());
    }

    #[test]
    fn prime_prefers_the_stored_snapshot_over_a_fetch() {
        let mut snapshots = SnapshotStore::new(MemBlobStore::default());
        let stored = vec![entry("A", CaseStatus::Aor, 5)];
        snapshots.save(&stored).unwrap();

        // No scripted responses: a fetch attempt would panic.
        let mut tracker = ForumTracker::new(Box::new(ScriptedSource::new(Vec::new())), snapshots);
        tracker.prime().unwrap();
        assert_eq!(tracker.entries().unwrap(), stored);
    }

    #[test]
    fn prime_falls_back_to_a_fetch_when_nothing_is_stored() {
        let fetched = vec![entry("A", CaseStatus::Sent, 2)];
        let mut tracker = tracker(vec![Ok(fetched.clone())]);
        tracker.prime().unwrap();
        assert_eq!(tracker.entries().unwrap(), fetched);
    }
}
