//! Read-side views over stored day schedules. Nothing here mutates state.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::contract::model::{
    Availability, DayBreakdown, DaySchedule, DayStats, Interval, NextOpenSlot, PeriodStatistics,
    ScheduleReport, SlotStats, SlotStatus, TimeRange,
};

/// Restrict each day to intervals with `status`; days left empty are dropped.
pub fn filter_by_status(
    schedules: Vec<DaySchedule>,
    status: Option<SlotStatus>,
) -> Vec<DaySchedule> {
    let Some(status) = status else {
        return schedules;
    };

    schedules
        .into_iter()
        .filter_map(|mut day| {
            day.intervals.retain(|i| i.status == status);
            (!day.intervals.is_empty()).then_some(day)
        })
        .collect()
}

/// Merge touching intervals (`end == next.start`) into display ranges.
///
/// Callers choose which intervals to pass; status is not inspected.
pub fn group_contiguous(intervals: &[Interval]) -> Vec<TimeRange> {
    let mut ranges: Vec<TimeRange> = intervals.iter().map(Interval::range).collect();
    ranges.sort_by_key(|r| (r.start, r.end));

    let mut grouped: Vec<TimeRange> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match grouped.last_mut() {
            Some(last) if last.end == r.start => last.end = r.end,
            _ => grouped.push(r),
        }
    }
    grouped
}

pub fn slot_stats(intervals: &[Interval]) -> SlotStats {
    let mut stats = SlotStats::default();
    for iv in intervals {
        let minutes = u32::from(iv.duration_minutes());
        match iv.status {
            SlotStatus::Open => {
                stats.open += 1;
                stats.open_minutes += minutes;
            }
            SlotStatus::Reserved => {
                stats.reserved += 1;
                stats.reserved_minutes += minutes;
            }
            SlotStatus::Blocked => {
                stats.blocked += 1;
                stats.blocked_minutes += minutes;
            }
        }
    }
    stats.utilization_rate = utilization(stats.reserved, stats.open);
    stats
}

fn utilization(reserved: usize, open: usize) -> f64 {
    let denominator = reserved + open;
    if denominator == 0 {
        return 0.0;
    }
    reserved as f64 / denominator as f64
}

fn accumulate(total: &mut SlotStats, day: &SlotStats) {
    total.open += day.open;
    total.reserved += day.reserved;
    total.blocked += day.blocked;
    total.open_minutes += day.open_minutes;
    total.reserved_minutes += day.reserved_minutes;
    total.blocked_minutes += day.blocked_minutes;
    total.utilization_rate = utilization(total.reserved, total.open);
}

/// Per-day stats for every schedule; the overall figure covers active days only.
pub fn statistics(schedules: &[DaySchedule]) -> PeriodStatistics {
    let mut result = PeriodStatistics::default();
    for day in schedules {
        let stats = slot_stats(&day.intervals);
        if day.active {
            accumulate(&mut result.overall, &stats);
        }
        result.days.push(DayStats {
            date: day.date,
            active: day.active,
            stats,
        });
    }
    result
}

/// First OPEN interval on the earliest active day that has one.
pub fn first_open(schedules: &[DaySchedule]) -> Option<NextOpenSlot> {
    let mut days: Vec<&DaySchedule> = schedules.iter().filter(|d| d.active).collect();
    days.sort_by_key(|d| d.date);

    days.into_iter().find_map(|day| {
        day.intervals
            .iter()
            .filter(|i| i.status == SlotStatus::Open)
            .min_by_key(|i| i.start)
            .map(|interval| NextOpenSlot {
                date: day.date,
                interval: interval.clone(),
            })
    })
}

/// Available iff a single OPEN interval contains `range`, which is exactly
/// when a reservation of `range` would succeed.
pub fn availability_in(schedule: Option<&DaySchedule>, range: TimeRange) -> Availability {
    let Some(day) = schedule.filter(|d| d.active) else {
        return Availability::default();
    };

    let open = day.intervals.iter().filter(|i| i.status == SlotStatus::Open);
    let mut is_available = false;
    let mut open_slots = Vec::new();
    for iv in open {
        let r = iv.range();
        is_available |= r.contains(&range);
        if let Some(clipped) = r.intersection(&range) {
            open_slots.push(clipped);
        }
    }

    Availability {
        is_available,
        open_slots,
    }
}

pub fn build_report(
    owner_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
    schedules: &[DaySchedule],
) -> ScheduleReport {
    let period = statistics(schedules);
    let days = schedules
        .iter()
        .zip(period.days)
        .map(|(day, day_stats)| {
            let open: Vec<Interval> = day
                .intervals
                .iter()
                .filter(|i| i.status == SlotStatus::Open)
                .cloned()
                .collect();
            DayBreakdown {
                date: day.date,
                active: day.active,
                intervals: day.intervals.clone(),
                available_ranges: group_contiguous(&open),
                stats: day_stats.stats,
            }
        })
        .collect();

    ScheduleReport {
        owner_id,
        from,
        to,
        days,
        summary: period.overall,
    }
}
