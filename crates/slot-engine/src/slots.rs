//! Fixed-length slot generation within a single work window.
//!
//! The grid is anchored at the window start and advances by exactly one slot
//! length per step. A candidate that overlaps busy time by any amount is
//! dropped whole; it is never shortened or shifted to fit around the busy
//! interval.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::interval::Interval;
use crate::merge::merge_intervals;

/// A bookable slot of the configured length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Slot {
    pub fn interval(&self) -> Interval {
        Interval::new_unchecked(self.start, self.end)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Clip busy intervals to `window`, dropping the ones that do not touch it,
/// and merge the result.
pub fn clip_to_window(busy: &[Interval], window: &Interval) -> Vec<Interval> {
    merge_intervals(busy.iter().filter_map(|b| b.clip(window)))
}

/// Generate every free slot of length `slot_len` inside `window`.
///
/// `busy` may be unsorted, overlapping, and extend past the window; it is
/// clipped and merged first. Returns slots sorted by start time. A
/// non-positive `slot_len` yields no slots.
pub fn generate_day_slots(window: &Interval, busy: &[Interval], slot_len: Duration) -> Vec<Slot> {
    if slot_len <= Duration::zero() {
        return Vec::new();
    }

    let busy = clip_to_window(busy, window);
    let mut slots = Vec::new();
    let mut next_busy = 0;
    let mut cursor = window.start();

    while cursor + slot_len <= window.end() {
        let candidate = Interval::new_unchecked(cursor, cursor + slot_len);

        // Busy intervals are sorted and disjoint; skip the ones already behind us.
        while next_busy < busy.len() && busy[next_busy].end() <= candidate.start() {
            next_busy += 1;
        }
        let blocked = busy
            .get(next_busy)
            .is_some_and(|b| b.overlaps(&candidate));

        if !blocked {
            slots.push(Slot {
                start: candidate.start(),
                end: candidate.end(),
            });
        }
        cursor = candidate.end();
    }

    slots
}

