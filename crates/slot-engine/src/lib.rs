//! # slot-engine
//!
//! Monthly meeting-slot availability from calendar free/busy data.
//!
//! Busy intervals for a month are fetched once from an [`AvailabilitySource`],
//! merged, and subtracted from a fixed daily work window that is sliced into
//! fixed-length slots. The result is a [`MonthPayload`] ready to serialize for
//! a booking UI.
//!
//! ## Modules
//!
//! - [`interval`]: half-open absolute time intervals
//! - [`merge`]: merge overlapping busy intervals
//! - [`slots`]: fixed-grid slot generation inside one work window
//! - [`window`]: month ranges and per-day work windows
//! - [`dst`]: DST policies for wall-clock bounds
//! - [`config`]: working hours, slot length, calendars
//! - [`month`]: month orchestration
//! - [`payload`]: output document
//! - [`source`]: availability-source capability and a static source
//! - `google`: Google Calendar free/busy source (feature `google`)
//! - [`error`]: error types

pub mod config;
pub mod dst;
pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod interval;
pub mod merge;
pub mod month;
pub mod payload;
pub mod slots;
pub mod source;
pub mod window;

pub use config::SlotConfig;
pub use dst::DstPolicy;
pub use error::SlotError;
pub use interval::Interval;
pub use merge::merge_intervals;
pub use month::{build_month_payload, monthly_availability, MonthOptions};
pub use payload::MonthPayload;
pub use slots::{generate_day_slots, Slot};
pub use source::{AvailabilitySource, SourceError, StaticSource};
pub use window::Month;
