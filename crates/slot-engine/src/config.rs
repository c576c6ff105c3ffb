//! Scheduling configuration passed explicitly into every computation.

use std::path::Path;

use chrono::{Duration, NaiveTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::{Result, SlotError};

pub const DEFAULT_TIME_ZONE: &str = "America/Santo_Domingo";
pub const DEFAULT_WORK_START: &str = "09:00";
pub const DEFAULT_WORK_END: &str = "18:00";
pub const DEFAULT_SLOT_MINUTES: u32 = 60;
pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// Working hours, slot length, and calendars to query.
///
/// Serialized as camelCase JSON with wall-clock times as `"HH:MM"` and the
/// timezone as an IANA name:
///
/// ```json
/// {
///   "timeZone": "America/New_York",
///   "workStart": "09:00",
///   "workEnd": "17:30",
///   "slotMinutes": 30,
///   "calendarIds": ["primary", "team@example.com"],
///   "skipWeekends": true
/// }
/// ```
///
/// Omitted keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSlotConfig", into = "RawSlotConfig")]
pub struct SlotConfig {
    pub time_zone: Tz,
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub slot_minutes: u32,
    pub calendar_ids: Vec<String>,
    /// Saturdays and Sundays are listed without slots.
    pub skip_weekends: bool,
    pub dst_policy: DstPolicy,
    /// Emit the flattened calendar-widget `events` list in the payload.
    pub include_events: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSlotConfig {
    time_zone: String,
    work_start: String,
    work_end: String,
    slot_minutes: u32,
    calendar_ids: Vec<String>,
    skip_weekends: bool,
    dst_policy: DstPolicy,
    include_events: bool,
}

impl Default for RawSlotConfig {
    fn default() -> Self {
        Self {
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            work_start: DEFAULT_WORK_START.to_string(),
            work_end: DEFAULT_WORK_END.to_string(),
            slot_minutes: DEFAULT_SLOT_MINUTES,
            calendar_ids: vec![DEFAULT_CALENDAR_ID.to_string()],
            skip_weekends: false,
            dst_policy: DstPolicy::default(),
            include_events: true,
        }
    }
}

impl TryFrom<RawSlotConfig> for SlotConfig {
    type Error = SlotError;

    fn try_from(raw: RawSlotConfig) -> Result<Self> {
        let config = SlotConfig {
            time_zone: parse_time_zone(&raw.time_zone)?,
            work_start: parse_wall_clock(&raw.work_start)?,
            work_end: parse_wall_clock(&raw.work_end)?,
            slot_minutes: raw.slot_minutes,
            calendar_ids: raw.calendar_ids,
            skip_weekends: raw.skip_weekends,
            dst_policy: raw.dst_policy,
            include_events: raw.include_events,
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<SlotConfig> for RawSlotConfig {
    fn from(config: SlotConfig) -> Self {
        Self {
            time_zone: config.time_zone.name().to_string(),
            work_start: format_wall_clock(config.work_start),
            work_end: format_wall_clock(config.work_end),
            slot_minutes: config.slot_minutes,
            calendar_ids: config.calendar_ids,
            skip_weekends: config.skip_weekends,
            dst_policy: config.dst_policy,
            include_events: config.include_events,
        }
    }
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            time_zone: chrono_tz::America::Santo_Domingo,
            work_start: NaiveTime::from_hms_opt(9, 0, 0).expect("09:00 is a valid time"),
            work_end: NaiveTime::from_hms_opt(18, 0, 0).expect("18:00 is a valid time"),
            slot_minutes: DEFAULT_SLOT_MINUTES,
            calendar_ids: vec![DEFAULT_CALENDAR_ID.to_string()],
            skip_weekends: false,
            dst_policy: DstPolicy::default(),
            include_events: true,
        }
    }
}

impl SlotConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawSlotConfig = serde_json::from_str(json)?;
        SlotConfig::try_from(raw)
    }

    /// Read, parse, and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check the invariants the slot generator relies on.
    ///
    /// # Errors
    /// Returns `SlotError::InvalidConfig` if the slot length is zero, the work
    /// window is empty or inverted, a single slot does not fit in the window,
    /// or no calendar is configured.
    pub fn validate(&self) -> Result<()> {
        if self.slot_minutes == 0 {
            return Err(SlotError::InvalidConfig(
                "slotMinutes must be greater than zero".to_string(),
            ));
        }
        if self.work_end <= self.work_start {
            return Err(SlotError::InvalidConfig(format!(
                "workEnd {} must be after workStart {}",
                format_wall_clock(self.work_end),
                format_wall_clock(self.work_start)
            )));
        }
        if self.slot_length() > self.work_end - self.work_start {
            return Err(SlotError::InvalidConfig(format!(
                "a {}-minute slot does not fit in {}-{}",
                self.slot_minutes,
                format_wall_clock(self.work_start),
                format_wall_clock(self.work_end)
            )));
        }
        if self.calendar_ids.is_empty() {
            return Err(SlotError::InvalidConfig(
                "at least one calendar id is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn slot_length(&self) -> Duration {
        Duration::minutes(i64::from(self.slot_minutes))
    }
}

/// Parse an IANA timezone name.
pub fn parse_time_zone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| SlotError::InvalidTimezone(name.to_string()))
}

/// Parse a wall-clock time written as `HH:MM`.
pub fn parse_wall_clock(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| SlotError::InvalidTime(s.to_string()))
}

pub fn format_wall_clock(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}
