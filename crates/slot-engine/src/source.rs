//! Where busy intervals come from.
//!
//! [`AvailabilitySource`] is the single seam between the pure slot computation
//! and the outside world. [`StaticSource`] serves canned data for tests and
//! offline runs; the Google implementation lives in [`crate::google`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::interval::Interval;

/// Busy intervals keyed by calendar id.
pub type BusyByCalendar = BTreeMap<String, Vec<Interval>>;

/// Failures reported by an availability source. They reach the caller as-is;
/// nothing in this crate retries.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Credentials not found at {0}")]
    CredentialsNotFound(PathBuf),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Calendar '{id}' could not be queried: {reason}")]
    Calendar { id: String, reason: String },

    #[cfg(feature = "google")]
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Capability to fetch busy intervals for a time range and a set of calendars.
pub trait AvailabilitySource {
    /// Return the busy intervals of every calendar in `calendar_ids` that
    /// intersect `range`. Every requested id appears in the result.
    fn fetch_busy(
        &self,
        range: &Interval,
        calendar_ids: &[String],
    ) -> Result<BusyByCalendar, SourceError>;
}

impl<S: AvailabilitySource + ?Sized> AvailabilitySource for &S {
    fn fetch_busy(
        &self,
        range: &Interval,
        calendar_ids: &[String],
    ) -> Result<BusyByCalendar, SourceError> {
        (**self).fetch_busy(range, calendar_ids)
    }
}

/// An in-memory source with fixed busy intervals per calendar.
///
/// Unknown calendar ids yield an empty busy list.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    busy: BusyByCalendar,
}

impl StaticSource {
    pub fn new(busy: BusyByCalendar) -> Self {
        Self { busy }
    }

    /// Add busy intervals for `calendar_id`.
    pub fn with_busy(
        mut self,
        calendar_id: impl Into<String>,
        intervals: impl IntoIterator<Item = Interval>,
    ) -> Self {
        self.busy
            .entry(calendar_id.into())
            .or_default()
            .extend(intervals);
        self
    }

    /// Parse `{ "calendarId": [{ "start": "...", "end": "..." }] }`.
    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        let busy: BusyByCalendar = serde_json::from_str(json)
            .map_err(|e| SourceError::InvalidResponse(format!("busy data: {e}")))?;
        Ok(Self::new(busy))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

impl AvailabilitySource for StaticSource {
    fn fetch_busy(
        &self,
        range: &Interval,
        calendar_ids: &[String],
    ) -> Result<BusyByCalendar, SourceError> {
        Ok(calendar_ids
            .iter()
            .map(|id| {
                let busy = self
                    .busy
                    .get(id)
                    .map(|list| list.iter().filter(|b| b.overlaps(range)).copied().collect())
                    .unwrap_or_default();
                (id.clone(), busy)
            })
            .collect())
    }
}
