//! WASM bindings for slot-engine.
//!
//! Exposes interval merging, single-day slot generation, and whole-month
//! payload assembly to JavaScript via `wasm-bindgen`. Busy data is fetched by
//! the host; everything crosses the boundary as JSON strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/slot-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use slot_engine::config::SlotConfig;
use slot_engine::month::{build_month_payload, MonthOptions};
use slot_engine::window::Month;
use slot_engine::{generate_day_slots, merge_intervals, Interval};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// JSON DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct IntervalDto {
    start: String,
    end: String,
}

impl From<&Interval> for IntervalDto {
    fn from(iv: &Interval) -> Self {
        Self {
            start: iv.start().to_rfc3339(),
            end: iv.end().to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SlotDto {
    start: String,
    end: String,
    duration_minutes: i64,
}

#[derive(Deserialize)]
struct IntervalInput {
    start: String,
    end: String,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// RFC 3339 strings keep their offset; a naive `YYYY-MM-DDTHH:MM:SS` is read as UTC.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, JsValue> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| JsValue::from_str(&format!("Invalid datetime '{}': {}", s, e)))
}

fn parse_intervals_json(json: &str) -> Result<Vec<Interval>, JsValue> {
    let inputs: Vec<IntervalInput> = serde_json::from_str(json)
        .map_err(|e| JsValue::from_str(&format!("Invalid intervals JSON: {}", e)))?;

    inputs
        .into_iter()
        .map(|input| {
            let start = parse_datetime(&input.start)?;
            let end = parse_datetime(&input.end)?;
            Interval::new(start, end).map_err(to_js)
        })
        .collect()
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Merge a JSON array of `{start, end}` intervals.
///
/// Returns a sorted JSON array of disjoint `{start, end}` objects in UTC.
/// Touching intervals are merged.
#[wasm_bindgen(js_name = "mergeIntervals")]
pub fn merge_intervals_json(intervals_json: &str) -> Result<String, JsValue> {
    let intervals = parse_intervals_json(intervals_json)?;
    let merged: Vec<IntervalDto> = merge_intervals(intervals)
        .iter()
        .map(IntervalDto::from)
        .collect();
    to_json(&merged)
}

/// Free fixed-length slots inside one work window.
///
/// # Arguments
/// - `window_start`, `window_end` -- ISO 8601 bounds of the work window
/// - `busy_json` -- JSON array of `{start, end}` busy intervals, any order
/// - `slot_minutes` -- slot length; the grid is anchored at `window_start`
///
/// Returns a JSON array of `{start, end, durationMinutes}` objects.
#[wasm_bindgen(js_name = "generateDaySlots")]
pub fn generate_day_slots_json(
    window_start: &str,
    window_end: &str,
    busy_json: &str,
    slot_minutes: u32,
) -> Result<String, JsValue> {
    if slot_minutes == 0 {
        return Err(JsValue::from_str("slot_minutes must be positive"));
    }
    let window = Interval::new(parse_datetime(window_start)?, parse_datetime(window_end)?)
        .map_err(to_js)?;
    let busy = merge_intervals(parse_intervals_json(busy_json)?);

    let slots: Vec<SlotDto> =
        generate_day_slots(&window, &busy, Duration::minutes(i64::from(slot_minutes)))
            .iter()
            .map(|s| SlotDto {
                start: s.start.to_rfc3339(),
                end: s.end.to_rfc3339(),
                duration_minutes: s.duration().num_minutes(),
            })
            .collect();
    to_json(&slots)
}

/// Build the month payload from a configuration and busy intervals the host
/// has already fetched.
///
/// `config_json` uses the same camelCase document as the CLI's `--config`
/// file (`"{}"` for defaults). `month` is `YYYY-MM`. When `not_before` is
/// given, slots starting at or before that instant are dropped.
#[wasm_bindgen(js_name = "buildMonthPayload")]
pub fn build_month_payload_json(
    config_json: &str,
    month: &str,
    busy_json: &str,
    not_before: Option<String>,
) -> Result<String, JsValue> {
    let config = SlotConfig::from_json_str(config_json).map_err(to_js)?;
    let month = Month::parse(month).map_err(to_js)?;
    let busy = parse_intervals_json(busy_json)?;
    let options = MonthOptions {
        not_before: not_before.as_deref().map(parse_datetime).transpose()?,
    };

    let payload = build_month_payload(&config, month, &busy, &options).map_err(to_js)?;
    to_json(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Error paths build a `JsValue`, which only works on a wasm target, so
    // native tests stick to the success paths.

    #[test]
    fn merge_touching_intervals() {
        let json = merge_intervals_json(
            r#"[{"start":"2026-03-02T10:00:00Z","end":"2026-03-02T11:00:00Z"},
                {"start":"2026-03-02T09:00:00Z","end":"2026-03-02T10:00:00Z"}]"#,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["start"], "2026-03-02T09:00:00+00:00");
        assert_eq!(value[0]["end"], "2026-03-02T11:00:00+00:00");
    }

    #[test]
    fn day_slots_skip_busy_time() {
        let json = generate_day_slots_json(
            "2026-03-02T09:00:00",
            "2026-03-02T12:00:00",
            r#"[{"start":"2026-03-02T10:15:00Z","end":"2026-03-02T10:45:00Z"}]"#,
            60,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let slots = value.as_array().unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0]["start"], "2026-03-02T09:00:00+00:00");
        assert_eq!(slots[1]["start"], "2026-03-02T11:00:00+00:00");
        assert_eq!(slots[1]["durationMinutes"], 60);
    }

    #[test]
    fn month_payload_with_defaults() {
        let json = build_month_payload_json("{}", "2025-11", "[]", None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["month"], "2025-11");
        assert_eq!(value["totalDays"], 30);
        assert_eq!(value["totalSlots"], 270);
    }

    #[test]
    fn month_payload_hides_past_slots() {
        let json = build_month_payload_json(
            "{}",
            "2025-11",
            "[]",
            Some("2025-11-30T00:00:00Z".to_string()),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        // Only Nov 30 remains.
        assert_eq!(value["totalDays"], 1);
        assert_eq!(value["totalSlots"], 9);
    }
}
