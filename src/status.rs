//! Live status page: stage inference over the portal's tracked steps.

pub mod source;

use crate::error::FetchError;
use crate::model::{LiveStatus, Stage, StageName};
use source::StatusSource;

/// A stage is done only when the portal shows this exact text.
const COMPLETED: &str = "Completed";

/// Shown when a stage field came back empty.
const UNKNOWN: &str = "Unknown";

/// Derive the currently pending stage.
///
/// Gates are checked in process order: background and test clear before
/// presence (reported as "DM"), presence before oath. The portal lists
/// them in a different order, which is why the order is fixed here. A
/// missing field counts as not completed. With all four complete the
/// terminal `Finish` stage carries the page's overall status text.
pub fn next_stage(status: &LiveStatus) -> Stage {
    let gates = [
        (StageName::Background, &status.background),
        (StageName::Test, &status.test),
        (StageName::Dm, &status.presence),
        (StageName::Oath, &status.oath),
    ];

    for (name, value) in gates {
        if value.as_deref() != Some(COMPLETED) {
            return Stage {
                name,
                status: value.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            };
        }
    }

    Stage {
        name: StageName::Finish,
        status: status.status.clone().unwrap_or_else(|| UNKNOWN.to_string()),
    }
}

/// One live-status cycle: fetch the page state and pair it with the
/// inferred pending stage.
pub fn update(source: &dyn StatusSource) -> Result<(LiveStatus, Stage), FetchError> {
    tracing::info!("running citizenship status update");
    let status = source.fetch()?;
    let stage = next_stage(&status);
    tracing::info!(stage = stage.name.as_str(), "finished citizenship status update");
    Ok((status, stage))
}
