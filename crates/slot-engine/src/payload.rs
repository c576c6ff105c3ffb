//! The JSON document handed to callers and calendar widgets.
//!
//! Field names are camelCase and every timestamp is ISO-8601 in the configured
//! local zone, e.g. `2025-11-03T09:00:00-04:00`.

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{format_wall_clock, SlotConfig};
use crate::slots::Slot;

/// Title and `extendedProps.type` of every widget event.
pub const AVAILABLE_TITLE: &str = "Available";
pub const AVAILABLE_TYPE: &str = "available";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthPayload {
    pub time_zone: String,
    pub slot_minutes: u32,
    pub work_window: WorkWindowEcho,
    pub calendars_queried: Vec<String>,
    /// `YYYY-MM`
    pub month: String,
    /// One entry per calendar day, in order.
    pub days: Vec<DayAvailability>,
    /// The same slots flattened into FullCalendar-style events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<CalendarEvent>>,
    /// Days with at least one slot.
    pub total_days: usize,
    pub total_slots: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWindowEcho {
    pub start: String,
    pub end: String,
}

impl WorkWindowEcho {
    pub fn from_config(config: &SlotConfig) -> Self {
        Self {
            start: format_wall_clock(config.work_start),
            end: format_wall_clock(config.work_end),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub slots: Vec<SlotTimes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTimes {
    pub start: String,
    pub end: String,
}

impl SlotTimes {
    pub fn from_slot<Tz: TimeZone>(slot: &Slot, tz: &Tz) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            start: local_iso(slot.start, tz),
            end: local_iso(slot.end, tz),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub title: String,
    pub start: String,
    pub end: String,
    pub all_day: bool,
    pub extended_props: ExtendedProps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedProps {
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<&SlotTimes> for CalendarEvent {
    fn from(slot: &SlotTimes) -> Self {
        Self {
            title: AVAILABLE_TITLE.to_string(),
            start: slot.start.clone(),
            end: slot.end.clone(),
            all_day: false,
            extended_props: ExtendedProps {
                kind: AVAILABLE_TYPE.to_string(),
            },
        }
    }
}

/// Format an instant as ISO-8601 with the local offset of `tz`.
pub fn local_iso<Tz: TimeZone>(dt: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.with_timezone(tz)
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}

impl MonthPayload {
    /// Assemble the payload from per-day slots.
    pub fn assemble(
        config: &SlotConfig,
        month: String,
        days: Vec<(NaiveDate, Vec<Slot>)>,
    ) -> Self {
        let tz = &config.time_zone;
        let days: Vec<DayAvailability> = days
            .into_iter()
            .map(|(date, slots)| DayAvailability {
                date,
                slots: slots.iter().map(|s| SlotTimes::from_slot(s, tz)).collect(),
            })
            .collect();

        let total_days = days.iter().filter(|d| !d.slots.is_empty()).count();
        let total_slots = days.iter().map(|d| d.slots.len()).sum();
        let events = config.include_events.then(|| {
            days.iter()
                .flat_map(|d| d.slots.iter().map(CalendarEvent::from))
                .collect()
        });

        Self {
            time_zone: tz.name().to_string(),
            slot_minutes: config.slot_minutes,
            work_window: WorkWindowEcho::from_config(config),
            calendars_queried: config.calendar_ids.clone(),
            month,
            days,
            events,
            total_days,
            total_slots,
        }
    }
}
