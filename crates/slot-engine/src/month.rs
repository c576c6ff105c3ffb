//! Month orchestration: one free/busy fetch, one merge, then slots per day.
//!
//! Days are computed independently from the same merged busy set; nothing is
//! carried from one day to the next.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};

use crate::config::SlotConfig;
use crate::error::Result;
use crate::interval::Interval;
use crate::merge::{merge_calendars, merge_intervals};
use crate::payload::MonthPayload;
use crate::slots::{generate_day_slots, Slot};
use crate::source::AvailabilitySource;
use crate::window::{work_window, Month};

/// Per-request options that are not part of the standing configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthOptions {
    /// Drop slots that start at or before this instant (typically "now").
    pub not_before: Option<DateTime<Utc>>,
}

impl MonthOptions {
    pub fn hide_past(now: DateTime<Utc>) -> Self {
        Self {
            not_before: Some(now),
        }
    }
}

/// Fetch busy time for `month` from `source` and build the payload.
///
/// Makes exactly one call to the source, covering every configured calendar.
///
/// # Errors
/// Returns `SlotError::InvalidConfig` for an unusable configuration and
/// `SlotError::Source` for any failure of the source, unchanged.
#[tracing::instrument(skip_all, fields(month = %month))]
pub fn monthly_availability<S>(
    source: &S,
    config: &SlotConfig,
    month: Month,
    options: &MonthOptions,
) -> Result<MonthPayload>
where
    S: AvailabilitySource + ?Sized,
{
    config.validate()?;
    let range = month.query_range(&config.time_zone)?;
    let by_calendar = source.fetch_busy(&range, &config.calendar_ids)?;

    let busy = merge_calendars(by_calendar.values());
    tracing::debug!(
        calendars = by_calendar.len(),
        merged_busy = busy.len(),
        "fetched busy intervals"
    );
    build_month_payload(config, month, &busy, options)
}

/// Build the payload for `month` from busy intervals already in hand.
pub fn build_month_payload(
    config: &SlotConfig,
    month: Month,
    busy: &[Interval],
    options: &MonthOptions,
) -> Result<MonthPayload> {
    config.validate()?;
    let busy = merge_intervals(busy.iter().copied());

    let days: Vec<(NaiveDate, Vec<Slot>)> = month
        .days()
        .map(|date| (date, day_slots(date, config, &busy, options)))
        .collect();

    let payload = MonthPayload::assemble(config, month.to_string(), days);
    tracing::info!(
        month = %payload.month,
        days = payload.days.len(),
        total_days = payload.total_days,
        total_slots = payload.total_slots,
        "built month availability"
    );
    Ok(payload)
}

/// Free slots for a single date under `config`.
pub fn day_slots(
    date: NaiveDate,
    config: &SlotConfig,
    busy: &[Interval],
    options: &MonthOptions,
) -> Vec<Slot> {
    if config.skip_weekends && is_weekend(date) {
        return Vec::new();
    }
    let Some(window) = work_window(date, config) else {
        tracing::debug!(%date, "work window does not exist under the DST policy");
        return Vec::new();
    };

    let mut slots = generate_day_slots(&window, busy, config.slot_length());
    if let Some(not_before) = options.not_before {
        slots.retain(|s| s.start > not_before);
    }
    slots
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
