//! Row normalization for the community tracker spreadsheet.
//!
//! Rows are human-entered, so several milestone timestamps may be filled
//! in at once. The scan order below is the authoritative total order:
//! the latest-possible milestone with a timestamp wins.

use crate::model::{CanonicalEntry, CaseStatus};
use chrono::{DateTime, TimeZone, Utc};

/// Column layout of the tracker worksheets. The sheet is positional with
/// no header probing; a renamed column must be fixed here, not guessed at
/// runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)] // unreferenced columns still shift the indices of later ones
pub enum Column {
    Id,
    Location,
    CaseType,
    Presence,
    Sent,
    Received,
    Aor,
    InProcess,
    TestInvite,
    Test,
    Dm,
    OathInvite,
    Oath,
    Notes,
}

impl Column {
    pub fn index(self) -> usize {
        self as usize
    }

    /// Last column letter of the layout, for building A1 ranges.
    pub const LAST_LETTER: char = 'N';
}

/// One tracker row with its milestone timestamps decoded. Cells the sheet
/// left blank stay `None`.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub id: Option<String>,
    pub sent: Option<DateTime<Utc>>,
    pub received: Option<DateTime<Utc>>,
    pub aor: Option<DateTime<Utc>>,
    pub in_process: Option<DateTime<Utc>>,
    pub test_invite: Option<DateTime<Utc>>,
    pub test: Option<DateTime<Utc>>,
    pub dm: Option<DateTime<Utc>>,
    pub oath_invite: Option<DateTime<Utc>>,
    pub oath: Option<DateTime<Utc>>,
}

/// Serial day of 1970-01-01; the spreadsheet epoch is 1899-12-30.
const UNIX_EPOCH_SERIAL: f64 = 25569.0;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Decode a spreadsheet serial date (days since 1899-12-30, fractional
/// part is time of day). Zero and non-finite values mean "no date".
pub fn serial_to_date(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() || serial == 0.0 {
        return None;
    }
    let epoch_ms = ((serial - UNIX_EPOCH_SERIAL) * MS_PER_DAY).round() as i64;
    Utc.timestamp_millis_opt(epoch_ms).single()
}

/// Milestone scan order, latest-possible first.
fn milestones(row: &RawRow) -> [(CaseStatus, Option<DateTime<Utc>>); 9] {
    [
        (CaseStatus::Oath, row.oath),
        (CaseStatus::OathInvite, row.oath_invite),
        (CaseStatus::Dm, row.dm),
        (CaseStatus::Test, row.test),
        (CaseStatus::TestInvite, row.test_invite),
        (CaseStatus::InProcess, row.in_process),
        (CaseStatus::Aor, row.aor),
        (CaseStatus::Received, row.received),
        (CaseStatus::Sent, row.sent),
    ]
}

/// Collapse a row to its single most advanced milestone. Rows without an
/// identifier cannot be keyed and are dropped by the caller.
pub fn normalize(row: &RawRow) -> Option<CanonicalEntry> {
    let name = row.id.as_deref()?.trim();
    if name.is_empty() {
        return None;
    }

    let (status, status_date) = milestones(row)
        .into_iter()
        .find(|(_, date)| date.is_some())
        .unwrap_or((CaseStatus::Unknown, None));

    Some(CanonicalEntry {
        name: name.to_string(),
        start_date: row.received,
        status,
        status_date,
    })
}
