//! DST transition policies for work-window bounds.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Longest DST gap we step across when shifting forward.
const MAX_GAP_MINUTES: i64 = 180;

/// Policy for wall-clock times that fall into a DST transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DstPolicy {
    /// Times in a gap (e.g. 2:30 AM during spring forward) move to the first
    /// valid instant after it; times in a fold use the earlier offset.
    #[default]
    ShiftForward,
    /// Any bound that is nonexistent or ambiguous leaves the day without a window.
    Skip,
}

impl DstPolicy {
    /// Resolve a local wall-clock time in `tz` to a concrete instant.
    pub fn resolve<Tz: TimeZone>(self, tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => Some(dt),
            LocalResult::Ambiguous(earliest, _) => match self {
                DstPolicy::ShiftForward => Some(earliest),
                DstPolicy::Skip => None,
            },
            LocalResult::None => match self {
                DstPolicy::ShiftForward => (1..=MAX_GAP_MINUTES)
                    .map(|m| local + Duration::minutes(m))
                    .find_map(|shifted| tz.from_local_datetime(&shifted).earliest()),
                DstPolicy::Skip => None,
            },
        }
    }
}
