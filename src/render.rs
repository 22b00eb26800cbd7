//! Message rendering. Pure string building over normalized data.
//!
//! Two date styles on purpose: tracker dates are calendar dates with no
//! meaningful timezone and render in UTC; live-status timestamps are
//! instants on the applicant's clock and render in local time with the
//! time of day.

use crate::model::{CanonicalEntry, DiffRecord, LiveStatus, Stage};
use chrono::{DateTime, Duration, Local, Utc};

/// Rendered in place of an absent status or date.
const NA: &str = "N/A";

/// How many entries `/latest` shows by default.
pub const LATEST_DEFAULT: usize = 10;

/// Hard cap on `/latest`, whatever the caller asks for.
pub const LATEST_CAP: usize = 99;

fn utc_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(date) => date.format("%-d %b %Y").to_string(),
        None => NA.to_string(),
    }
}

fn local_datetime(date: DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%-d %b %Y %H:%M").to_string()
}

/// Pending stage plus any page updates from the last 24 hours.
pub fn status_message(status: &LiveStatus, stage: &Stage, now: DateTime<Utc>) -> String {
    let mut msg = format!("{}: {}", stage.name, stage.status);
    let last_updated = match status.last_updated {
        Some(date) => local_datetime(date),
        None => NA.to_string(),
    };
    msg.push_str(&format!("\nLast updated: {last_updated}"));

    // Items dated in the future pass the window too, matching the page's
    // own occasionally-ahead clock.
    for item in &status.history {
        if now.signed_duration_since(item.date) < Duration::hours(24) {
            msg.push_str(&format!("\n\n[Update from {}]", local_datetime(item.date)));
            msg.push_str(&format!("\n{}", item.description.as_deref().unwrap_or("")));
        }
    }

    msg
}

/// Tracker changes, one three-line block per moved entry.
pub fn diff_message(records: &[DiffRecord]) -> String {
    let mut msg = String::from("Forum updates:");

    for record in records {
        let old_status = record
            .old_status
            .map(|status| status.to_string())
            .unwrap_or_else(|| NA.to_string());
        msg.push_str(&format!(
            "\n\n{} ({})",
            record.name,
            utc_date(record.start_date)
        ));
        msg.push_str(&format!(
            "\nFrom: {} ({})",
            old_status,
            utc_date(record.old_status_date)
        ));
        msg.push_str(&format!(
            "\nTo: {} ({})",
            record.new_status,
            utc_date(record.new_status_date)
        ));
    }

    msg
}

/// The most recently moved entries, newest first. Entries that never
/// reached a milestone have no status date and are left out entirely.
pub fn latest_message(entries: &[CanonicalEntry], limit: usize) -> String {
    let mut latest: Vec<&CanonicalEntry> = entries
        .iter()
        .filter(|entry| entry.status_date.is_some())
        .collect();
    latest.sort_by(|a, b| b.status_date.cmp(&a.status_date));

    let mut msg = String::new();
    for entry in latest.iter().take(limit.min(LATEST_CAP)) {
        msg.push_str(&format!(
            "{} ({}) - {} ({})\n",
            entry.name,
            utc_date(entry.start_date),
            entry.status,
            utc_date(entry.status_date)
        ));
    }

    msg
}

/// One entry's current standing, as a Telegram markdown block.
pub fn entry_message(entry: &CanonicalEntry) -> String {
    format!(
        "*{}*\nReceived: {}\nStatus: {} ({})",
        entry.name,
        utc_date(entry.start_date),
        entry.status,
        utc_date(entry.status_date)
    )
}

/// Exact-match lookup for `/history`; names are expected unique, first
/// match wins.
pub fn find_entry<'a>(entries: &'a [CanonicalEntry], name: &str) -> Option<&'a CanonicalEntry> {
    entries.iter().find(|entry| entry.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CaseStatus, HistoryItem, StageName};
    use chrono::TimeZone;

    fn date(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, day, hour, 0, 0).unwrap()
    }

    fn entry(name: &str, status: CaseStatus, status_day: Option<u32>) -> CanonicalEntry {
        CanonicalEntry {
            name: name.to_string(),
            start_date: Some(date(1, 0)),
            status,
            status_date: status_day.map(|day| date(day, 0)),
        }
    }

    #[test]
    fn utc_dates_render_without_time() {
        assert_eq!(utc_date(Some(date(5, 13))), "5 Jun 2023");
        assert_eq!(utc_date(None), "N/A");
    }

    #[test]
    fn diff_message_renders_old_and_new_sides() {
        let records = vec![DiffRecord {
            name: "A".to_string(),
            start_date: Some(date(1, 0)),
            old_status: Some(CaseStatus::Sent),
            old_status_date: Some(date(2, 0)),
            new_status: CaseStatus::Received,
            new_status_date: Some(date(9, 0)),
        }];
        let msg = diff_message(&records);
        assert_eq!(
            msg,
            "Forum updates:\n\nA (1 Jun 2023)\nFrom: Sent (2 Jun 2023)\nTo: Received (9 Jun 2023)"
        );
    }

    #[test]
    fn diff_message_uses_na_for_new_entries() {
        let records = vec![DiffRecord {
            name: "B".to_string(),
            start_date: None,
            old_status: None,
            old_status_date: None,
            new_status: CaseStatus::Aor,
            new_status_date: Some(date(5, 0)),
        }];
        let msg = diff_message(&records);
        assert!(msg.contains("B (N/A)"));
        assert!(msg.contains("From: N/A (N/A)"));
        assert!(msg.contains("To: AOR (5 Jun 2023)"));
    }

    #[test]
    fn latest_sorts_descending_and_drops_dateless_entries() {
        let entries = vec![
            entry("old", CaseStatus::Sent, Some(2)),
            entry("none", CaseStatus::Unknown, None),
            entry("new", CaseStatus::Test, Some(20)),
            entry("mid", CaseStatus::Aor, Some(10)),
        ];
        let msg = latest_message(&entries, LATEST_DEFAULT);
        let names: Vec<&str> = msg
            .lines()
            .map(|line| line.split_once(' ').unwrap().0)
            .collect();
        assert_eq!(names, ["new", "mid", "old"]);
        assert!(!msg.contains("none"));
    }

    #[test]
    fn latest_respects_limit_and_cap() {
        let entries: Vec<CanonicalEntry> = (1..=28)
            .map(|day| entry(&format!("E{day}"), CaseStatus::Aor, Some(day)))
            .collect();
        assert_eq!(latest_message(&entries, 5).lines().count(), 5);
        assert_eq!(latest_message(&entries, 1000).lines().count(), 28);
    }

    #[test]
    fn status_message_includes_only_recent_history() {
        let now = date(10, 12);
        let status = LiveStatus {
            last_updated: Some(date(10, 9)),
            status: Some("In progress".to_string()),
            language: None,
            presence: None,
            test: None,
            background: Some("In progress".to_string()),
            prohibitions: None,
            oath: None,
            history: vec![
                HistoryItem {
                    date: date(10, 2),
                    title: "Fresh".to_string(),
                    category: None,
                    description: Some("New update".to_string()),
                },
                HistoryItem {
                    date: date(8, 2),
                    title: "Stale".to_string(),
                    category: None,
                    description: Some("Old update".to_string()),
                },
            ],
        };
        let stage = Stage {
            name: StageName::Background,
            status: "In progress".to_string(),
        };

        let msg = status_message(&status, &stage, now);
        assert!(msg.starts_with("Background: In progress\nLast updated: "));
        assert!(msg.contains("New update"));
        assert!(!msg.contains("Old update"));
    }

    #[test]
    fn entry_lookup_is_exact() {
        let entries = vec![entry("AB123", CaseStatus::Aor, Some(5))];
        assert!(find_entry(&entries, "AB123").is_some());
        assert!(find_entry(&entries, "ab123").is_none());
        assert!(find_entry(&entries, "AB12").is_none());
    }

    #[test]
    fn entry_message_is_a_markdown_block() {
        let msg = entry_message(&entry("AB123", CaseStatus::Test, Some(9)));
        assert_eq!(msg, "*AB123*\nReceived: 1 Jun 2023\nStatus: Test (9 Jun 2023)");
    }
}
