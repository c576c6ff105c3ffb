//! Error types for slot-engine operations.

use thiserror::Error;

use crate::source::SourceError;

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Invalid interval: start {start} is not before end {end}")]
    InvalidInterval { start: String, end: String },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid time of day '{0}' (expected HH:MM)")]
    InvalidTime(String),

    #[error("Invalid month '{0}' (expected YYYY-MM)")]
    InvalidMonth(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Availability source: {0}")]
    Source(#[from] SourceError),
}

pub type Result<T> = std::result::Result<T, SlotError>;
