//! Pairwise overlap detection with half-open semantics.

use crate::contract::model::{Interval, TimeRange};
use crate::domain::error::DomainError;

/// Touching endpoints do not overlap: `10:00-11:00` and `11:00-12:00` are adjacent.
pub fn overlaps(a: &TimeRange, b: &TimeRange) -> bool {
    a.start < b.end && b.start < a.end
}

/// Fails on the first pair of colliding candidates, in start order.
pub fn check_self_overlap(intervals: &[Interval]) -> Result<(), DomainError> {
    let mut sorted: Vec<TimeRange> = intervals.iter().map(Interval::range).collect();
    sorted.sort_by_key(|r| (r.start, r.end));

    for pair in sorted.windows(2) {
        if overlaps(&pair[0], &pair[1]) {
            return Err(DomainError::overlap(pair[1], pair[0]));
        }
    }
    Ok(())
}

/// Existing day sets are small (tens of intervals), so the O(n*m) scan is fine.
pub fn check_against_existing(
    candidates: &[Interval],
    existing: &[Interval],
) -> Result<(), DomainError> {
    for candidate in candidates {
        let c = candidate.range();
        if let Some(hit) = existing.iter().find(|e| overlaps(&c, &e.range())) {
            return Err(DomainError::overlap(c, hit.range()));
        }
    }
    Ok(())
}
