//! Shared data model for the tracker spreadsheet and the live status page.
//!
//! These types mirror the persisted snapshot JSON, so the string forms of
//! the status labels are stable identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milestone labels used by the community tracker, from the earliest step
/// to the latest. A row may carry timestamps for several of these; the
/// latest one reached is the entry's status.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum CaseStatus {
    #[serde(rename = "Sent")]
    Sent,
    #[serde(rename = "Received")]
    Received,
    #[serde(rename = "AOR")]
    Aor,
    #[serde(rename = "In process")]
    InProcess,
    #[serde(rename = "Test invite")]
    TestInvite,
    #[serde(rename = "Test")]
    Test,
    #[serde(rename = "DM")]
    Dm,
    #[serde(rename = "Oath invite")]
    OathInvite,
    #[serde(rename = "Oath")]
    Oath,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl CaseStatus {
    /// Stable label, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Sent => "Sent",
            CaseStatus::Received => "Received",
            CaseStatus::Aor => "AOR",
            CaseStatus::InProcess => "In process",
            CaseStatus::TestInvite => "Test invite",
            CaseStatus::Test => "Test",
            CaseStatus::Dm => "DM",
            CaseStatus::OathInvite => "Oath invite",
            CaseStatus::Oath => "Oath",
            CaseStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked application, collapsed to its single most advanced
/// milestone. `status` and `status_date` always move together.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CanonicalEntry {
    pub name: String,
    pub start_date: Option<DateTime<Utc>>,
    pub status: CaseStatus,
    pub status_date: Option<DateTime<Utc>>,
}

/// One entry's movement between two snapshots. Transient; never persisted.
/// `None` in the old fields means the entry was not in the prior snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffRecord {
    pub name: String,
    pub start_date: Option<DateTime<Utc>>,
    pub old_status: Option<CaseStatus>,
    pub old_status_date: Option<DateTime<Utc>>,
    pub new_status: CaseStatus,
    pub new_status_date: Option<DateTime<Utc>>,
}

/// Scraped state of the applicant's own status page. Stage fields hold the
/// page's free text; a finished stage reads exactly "Completed". Missing
/// fields stay `None` when a selector came back empty.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LiveStatus {
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub presence: Option<String>,
    #[serde(default)]
    pub test: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub prohibitions: Option<String>,
    #[serde(default)]
    pub oath: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryItem>,
}

/// One row of the status page's update feed, newest first as scraped.
/// Only the first page is fetched, so the list is capped by the source.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HistoryItem {
    pub date: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// The four gated steps of the live status page, plus the terminal state
/// once all four are complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageName {
    Background,
    Test,
    Dm,
    Oath,
    Finish,
}

impl StageName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Background => "Background",
            StageName::Test => "Test",
            StageName::Dm => "DM",
            StageName::Oath => "Oath",
            StageName::Finish => "Finish",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The currently pending stage and its raw status text.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub name: StageName,
    pub status: String,
}
