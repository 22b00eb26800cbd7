//! Google Sheets source for the community tracker.
//!
//! The tracker is a public spreadsheet with one worksheet per month.
//! Cells come back unformatted so dates arrive as serial numbers; rows
//! are filtered to the configured locations before normalization.

use crate::error::FetchError;
use crate::forum::normalize::{self, Column, RawRow};
use crate::model::CanonicalEntry;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Yields the current tracker entries, already normalized.
pub trait EntrySource {
    fn fetch(&self) -> Result<Vec<CanonicalEntry>, FetchError>;
}

/// Worksheets are named by month; the tracker never got a December tab.
const MONTH_SHEETS: [&str; 11] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
];

/// Rows above this are headers.
const FIRST_DATA_ROW: u32 = 4;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

pub struct SheetSource {
    api_key: String,
    sheet_id: String,
    locations: Vec<String>,
}

/// Subset of the Sheets `values` response we care about.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl SheetSource {
    pub fn new(api_key: String, sheet_id: String, locations: Vec<String>) -> Self {
        Self {
            api_key,
            sheet_id,
            locations,
        }
    }

    /// Fetch one worksheet's data rows. `Ok(None)` means the worksheet
    /// does not exist (the API answers 400 for a range naming a missing
    /// tab); that is normal early in the year and skipped silently.
    fn fetch_sheet(&self, month: &str) -> Result<Option<Vec<Vec<Value>>>, FetchError> {
        let range = format!("{month}!A{FIRST_DATA_ROW}:{}", Column::LAST_LETTER);
        let url = format!("{SHEETS_API_BASE}/{}/values/{range}", self.sheet_id);
        match ureq::get(&url)
            .query("key", &self.api_key)
            .query("valueRenderOption", "UNFORMATTED_VALUE")
            .call()
        {
            Ok(mut response) => {
                let parsed: ValueRange = response
                    .body_mut()
                    .read_json()
                    .map_err(|err| FetchError::Payload(err.to_string()))?;
                Ok(Some(parsed.values))
            }
            Err(ureq::Error::StatusCode(400)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn location_matches(&self, cells: &[Value]) -> bool {
        let location = cell_str(cells, Column::Location).unwrap_or_default();
        self.locations
            .iter()
            .any(|want| want.eq_ignore_ascii_case(&location))
    }
}

impl EntrySource for SheetSource {
    fn fetch(&self) -> Result<Vec<CanonicalEntry>, FetchError> {
        tracing::info!("running forum entries update");
        let mut entries = Vec::new();

        for month in MONTH_SHEETS {
            let Some(rows) = self.fetch_sheet(month)? else {
                tracing::debug!(month, "worksheet absent, skipping");
                continue;
            };
            for cells in &rows {
                if !self.location_matches(cells) {
                    continue;
                }
                match normalize::normalize(&decode_row(cells)) {
                    Some(entry) => entries.push(entry),
                    None => tracing::debug!(month, "row without identifier skipped"),
                }
            }
        }

        Ok(entries)
    }
}

/// Map one row of cells through the fixed column layout.
fn decode_row(cells: &[Value]) -> RawRow {
    RawRow {
        id: cell_str(cells, Column::Id),
        sent: cell_date(cells, Column::Sent),
        received: cell_date(cells, Column::Received),
        aor: cell_date(cells, Column::Aor),
        in_process: cell_date(cells, Column::InProcess),
        test_invite: cell_date(cells, Column::TestInvite),
        test: cell_date(cells, Column::Test),
        dm: cell_date(cells, Column::Dm),
        oath_invite: cell_date(cells, Column::OathInvite),
        oath: cell_date(cells, Column::Oath),
    }
}

/// Case identifiers are occasionally typed as bare numbers.
fn cell_str(cells: &[Value], column: Column) -> Option<String> {
    match cells.get(column.index()) {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}

/// Dates must be serial numbers; anything hand-typed as text is treated
/// as blank rather than guessed at.
fn cell_date(cells: &[Value], column: Column) -> Option<DateTime<Utc>> {
    match cells.get(column.index()) {
        Some(Value::Number(number)) => normalize::serial_to_date(number.as_f64()?),
        _ => None,
    }
}
