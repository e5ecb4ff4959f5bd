//! Public models for the availability module.
//!
//! Clock times travel as zero-padded `HH:mm` strings but every comparison is
//! done on the parsed minute-of-day value.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Error produced when a clock time string is not a valid `HH:mm` value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid clock time '{input}': expected zero-padded HH:mm")]
pub struct ClockTimeParseError {
    pub input: String,
}

/// Minute offset within a single day, `00:00` through `23:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);
    pub const LAST_MINUTE: ClockTime = ClockTime(MINUTES_PER_DAY - 1);

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour >= 24 || minute >= 60 {
            return None;
        }
        Some(Self(hour * 60 + minute))
    }

    /// Parse a strict `HH:mm` string: two digits, a colon, two digits.
    pub fn parse(input: &str) -> Result<Self, ClockTimeParseError> {
        let invalid = || ClockTimeParseError {
            input: input.to_string(),
        };

        let (hours, minutes) = input.split_once(':').ok_or_else(invalid)?;
        let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(hours) || !two_digits(minutes) {
            return Err(invalid());
        }

        let hour: u16 = hours.parse().map_err(|_| invalid())?;
        let minute: u16 = minutes.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = ClockTimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}

/// Interval status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Open,
    Reserved,
    Blocked,
}

impl SlotStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotStatus::Open => "OPEN",
            SlotStatus::Reserved => "RESERVED",
            SlotStatus::Blocked => "BLOCKED",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A half-open `[start, end)` clock range with no status attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeRange {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        Self { start, end }
    }

    /// Parse both bounds; ordering is checked by the validator, not here.
    pub fn parse(start: &str, end: &str) -> Result<Self, ClockTimeParseError> {
        Ok(Self {
            start: ClockTime::parse(start)?,
            end: ClockTime::parse(end)?,
        })
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end.minutes().saturating_sub(self.start.minutes())
    }

    /// True if `other` lies fully inside `self`.
    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn intersection(&self, other: &TimeRange) -> Option<TimeRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(TimeRange { start, end })
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// One stored interval of a day schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: ClockTime,
    pub end: ClockTime,
    pub status: SlotStatus,
    /// Booking reference; present iff `status` is `Reserved`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_ref: Option<String>,
}

impl Interval {
    pub fn open(range: TimeRange) -> Self {
        Self::with_status(range, SlotStatus::Open, None)
    }

    pub fn blocked(range: TimeRange) -> Self {
        Self::with_status(range, SlotStatus::Blocked, None)
    }

    pub fn reserved(range: TimeRange, reservation_ref: impl Into<String>) -> Self {
        Self::with_status(range, SlotStatus::Reserved, Some(reservation_ref.into()))
    }

    pub fn with_status(
        range: TimeRange,
        status: SlotStatus,
        reservation_ref: Option<String>,
    ) -> Self {
        Self {
            start: range.start,
            end: range.end,
            status,
            reservation_ref,
        }
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }

    pub fn duration_minutes(&self) -> u16 {
        self.range().duration_minutes()
    }
}

/// All intervals of one provider on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub owner_id: Uuid,
    pub date: NaiveDate,
    pub intervals: Vec<Interval>,
    pub active: bool,
    /// Incremented on every persisted mutation; 0 means never stored.
    #[serde(default)]
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl DaySchedule {
    pub fn new(owner_id: Uuid, date: NaiveDate, intervals: Vec<Interval>) -> Self {
        Self {
            owner_id,
            date,
            intervals,
            active: true,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Target status for a split-update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUpdate {
    pub status: SlotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_ref: Option<String>,
}

impl SlotUpdate {
    pub fn open() -> Self {
        Self {
            status: SlotStatus::Open,
            reservation_ref: None,
        }
    }

    pub fn blocked() -> Self {
        Self {
            status: SlotStatus::Blocked,
            reservation_ref: None,
        }
    }

    pub fn reserved(reservation_ref: impl Into<String>) -> Self {
        Self {
            status: SlotStatus::Reserved,
            reservation_ref: Some(reservation_ref.into()),
        }
    }
}

/// Policy flags for `delete_ranges`.
///
/// The default only removes intervals whose boundaries match a requested
/// range exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteOptions {
    /// Never trim; only exact boundary matches are removed.
    pub exact_only: bool,
    /// Trim intervals that only partially overlap a requested range.
    pub allow_partial: bool,
    /// Ignore the requested ranges and clear the whole day.
    pub delete_all: bool,
    /// Remove or trim reserved intervals too. Honoured only when the module
    /// is configured with `allow_reservation_override`.
    pub force: bool,
    /// Drop the day record when no interval is left.
    pub remove_empty: bool,
}

impl DeleteOptions {
    pub fn partial() -> Self {
        Self {
            allow_partial: true,
            ..Self::default()
        }
    }

    pub fn all() -> Self {
        Self {
            delete_all: true,
            ..Self::default()
        }
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn with_cleanup(mut self) -> Self {
        self.remove_empty = true;
        self
    }

    pub fn partial_permitted(&self) -> bool {
        self.allow_partial && !self.exact_only
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub deleted_count: usize,
    pub modified_count: usize,
    pub schedule_removed: bool,
}

/// Answer to "is this provider free for this range on this day".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Availability {
    pub is_available: bool,
    /// OPEN intervals intersecting the requested range, clipped to it.
    pub open_slots: Vec<TimeRange>,
}

/// Interval counts, covered minutes and utilization for a day or a period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotStats {
    pub open: usize,
    pub reserved: usize,
    pub blocked: usize,
    pub open_minutes: u32,
    pub reserved_minutes: u32,
    pub blocked_minutes: u32,
    /// `reserved / (reserved + open)`, 0 when both are zero.
    pub utilization_rate: f64,
}

impl SlotStats {
    pub fn total(&self) -> usize {
        self.open + self.reserved + self.blocked
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayStats {
    pub date: NaiveDate,
    pub active: bool,
    pub stats: SlotStats,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PeriodStatistics {
    pub days: Vec<DayStats>,
    /// Totals over active days only.
    pub overall: SlotStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBreakdown {
    pub date: NaiveDate,
    pub active: bool,
    pub intervals: Vec<Interval>,
    /// Contiguous OPEN ranges, merged for display.
    pub available_ranges: Vec<TimeRange>,
    pub stats: SlotStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub owner_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: Vec<DayBreakdown>,
    pub summary: SlotStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextOpenSlot {
    pub date: NaiveDate,
    pub interval: Interval,
}
