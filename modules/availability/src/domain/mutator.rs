//! Interval-set mutations: merge-insert, split-update and spanning delete.
//!
//! Every function takes the current interval list by reference and returns a
//! new list, so a failure leaves the caller's state untouched. Results are
//! always sorted by start and pairwise non-overlapping when the input was.

use crate::contract::model::{Interval, SlotStatus, SlotUpdate, TimeRange};
use crate::domain::error::DomainError;
use crate::domain::overlap::{check_against_existing, check_self_overlap, overlaps};
use crate::domain::time::IntervalValidator;

pub fn sort_intervals(intervals: &mut [Interval]) {
    intervals.sort_by_key(|i| (i.start, i.end));
}

/// Strictly additive insert; no existing interval is altered.
pub fn merge_insert(
    existing: &[Interval],
    candidates: Vec<Interval>,
    validator: &IntervalValidator,
) -> Result<Vec<Interval>, DomainError> {
    if candidates.is_empty() {
        return Err(DomainError::validation(
            "intervals",
            "at least one interval is required",
        ));
    }

    for candidate in &candidates {
        validator.validate_interval(candidate)?;
    }
    check_self_overlap(&candidates)?;
    check_against_existing(&candidates, existing)?;

    let mut merged = Vec::with_capacity(existing.len() + candidates.len());
    merged.extend_from_slice(existing);
    merged.extend(candidates);
    sort_intervals(&mut merged);
    Ok(merged)
}

/// Replace `target` inside its containing interval with the updated status,
/// keeping the untouched remainder on either side.
///
/// `expected` additionally requires the containing interval to currently be
/// in that status (used by release).
pub fn split_update(
    intervals: &[Interval],
    target: TimeRange,
    update: &SlotUpdate,
    expected: Option<SlotStatus>,
) -> Result<Vec<Interval>, DomainError> {
    // The target may not span two intervals, even adjacent ones.
    let Some(pos) = intervals.iter().position(|c| c.range().contains(&target)) else {
        return Err(DomainError::range_not_found(target));
    };

    let current = &intervals[pos];
    if let Some(expected) = expected {
        if current.status != expected {
            return Err(DomainError::conflict(
                target,
                format!("{} is {}, expected {}", current.range(), current.status, expected),
            ));
        }
    }
    check_transition(current, target, update.status)?;

    let mut out = Vec::with_capacity(intervals.len() + 2);
    out.extend(
        intervals
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != pos)
            .map(|(_, iv)| iv.clone()),
    );

    if current.start < target.start {
        out.push(remainder(current, TimeRange::new(current.start, target.start)));
    }
    out.push(Interval::with_status(
        target,
        update.status,
        update.reservation_ref.clone(),
    ));
    if target.end < current.end {
        out.push(remainder(current, TimeRange::new(target.end, current.end)));
    }

    sort_intervals(&mut out);
    Ok(out)
}

/// OPEN -> anything, BLOCKED -> OPEN|BLOCKED, RESERVED -> OPEN.
fn check_transition(
    current: &Interval,
    target: TimeRange,
    next: SlotStatus,
) -> Result<(), DomainError> {
    use SlotStatus::*;
    match (current.status, next) {
        (Reserved, Reserved) => Err(DomainError::conflict(
            target,
            format!("already reserved by {}", reference_label(current)),
        )),
        (Blocked, Reserved) => Err(DomainError::conflict(
            target,
            format!("{} is blocked, not open", current.range()),
        )),
        (Reserved, Blocked) => Err(DomainError::conflict(
            target,
            "a reserved interval must be released before it can be blocked",
        )),
        _ => Ok(()),
    }
}

fn remainder(original: &Interval, range: TimeRange) -> Interval {
    Interval::with_status(range, original.status, original.reservation_ref.clone())
}

fn reference_label(interval: &Interval) -> &str {
    interval.reservation_ref.as_deref().unwrap_or("an unknown booking")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletePolicy {
    pub allow_partial: bool,
    pub delete_all: bool,
    /// Remove or trim reserved intervals instead of refusing.
    pub force: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteResult {
    pub intervals: Vec<Interval>,
    /// Intervals removed without leaving a fragment.
    pub deleted: usize,
    /// Remainder fragments produced by trimming.
    pub modified: usize,
}

/// Remove each requested range in order on a working copy. Any failure
/// aborts the whole batch.
pub fn spanning_delete(
    intervals: &[Interval],
    ranges: &[TimeRange],
    policy: DeletePolicy,
) -> Result<DeleteResult, DomainError> {
    let mut work = DeleteResult {
        intervals: intervals.to_vec(),
        ..DeleteResult::default()
    };

    if policy.delete_all {
        clear_day(&mut work, policy.force)?;
        return Ok(work);
    }

    for range in ranges {
        delete_one(&mut work, *range, policy)?;
    }
    sort_intervals(&mut work.intervals);
    Ok(work)
}

fn clear_day(work: &mut DeleteResult, force: bool) -> Result<(), DomainError> {
    if !force {
        if let Some(hit) = work
            .intervals
            .iter()
            .find(|i| i.status == SlotStatus::Reserved)
        {
            return Err(DomainError::conflict(
                hit.range(),
                format!("reserved by {}; the day cannot be cleared", reference_label(hit)),
            ));
        }
    }
    work.deleted += work.intervals.len();
    work.intervals.clear();
    Ok(())
}

fn delete_one(
    work: &mut DeleteResult,
    range: TimeRange,
    policy: DeletePolicy,
) -> Result<(), DomainError> {
    if let Some(pos) = work.intervals.iter().position(|i| i.range() == range) {
        let hit = &work.intervals[pos];
        if hit.status == SlotStatus::Reserved && !policy.force {
            return Err(DomainError::conflict(
                range,
                format!("reserved by {}", reference_label(hit)),
            ));
        }
        work.intervals.remove(pos);
        work.deleted += 1;
        return Ok(());
    }

    if !policy.allow_partial {
        return Err(DomainError::range_not_found(range));
    }

    let mut hits = work
        .intervals
        .iter()
        .filter(|i| overlaps(&i.range(), &range))
        .peekable();
    if hits.peek().is_none() {
        return Err(DomainError::range_not_found(range));
    }
    if !policy.force {
        if let Some(reserved) = hits.find(|i| i.status == SlotStatus::Reserved) {
            return Err(DomainError::conflict(
                reserved.range(),
                format!(
                    "reserved by {}; partial deletion of {range} refused",
                    reference_label(reserved)
                ),
            ));
        }
    }

    let current = std::mem::take(&mut work.intervals);
    let mut kept = Vec::with_capacity(current.len() + 1);
    for iv in current {
        if !overlaps(&iv.range(), &range) {
            kept.push(iv);
            continue;
        }

        let mut fragments = 0;
        if iv.start < range.start {
            kept.push(remainder(&iv, TimeRange::new(iv.start, range.start)));
            fragments += 1;
        }
        if range.end < iv.end {
            kept.push(remainder(&iv, TimeRange::new(range.end, iv.end)));
            fragments += 1;
        }

        if fragments == 0 {
            work.deleted += 1;
        } else {
            work.modified += fragments;
        }
    }
    work.intervals = kept;
    Ok(())
}
