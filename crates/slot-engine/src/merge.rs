//! Merge busy intervals into a minimal sorted set.
//!
//! Sorts intervals by start time, then sweeps once, folding every interval that
//! starts at or before the current merged end into it.

use crate::interval::Interval;

/// Merge overlapping or touching intervals.
///
/// Returns a sorted, non-overlapping list covering exactly the union of the
/// inputs. An interval whose start equals the current merged end is treated as
/// contiguous and folded in, so the output never contains two intervals that
/// touch.
pub fn merge_intervals<I>(intervals: I) -> Vec<Interval>
where
    I: IntoIterator<Item = Interval>,
{
    let mut intervals: Vec<Interval> = intervals.into_iter().collect();
    if intervals.is_empty() {
        return Vec::new();
    }

    // Sort by start time (then by end time for stability).
    intervals.sort_unstable_by_key(|iv| (iv.start(), iv.end()));

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for iv in intervals {
        if let Some(last) = merged.last_mut() {
            if iv.start() <= last.end() {
                // Overlapping or adjacent: extend the current interval.
                *last = Interval::new_unchecked(last.start(), last.end().max(iv.end()));
                continue;
            }
        }
        merged.push(iv);
    }

    merged
}

/// Merge already-flattened busy lists from several calendars.
pub fn merge_calendars<'a, I>(calendars: I) -> Vec<Interval>
where
    I: IntoIterator<Item = &'a Vec<Interval>>,
{
    merge_intervals(calendars.into_iter().flatten().copied())
}
