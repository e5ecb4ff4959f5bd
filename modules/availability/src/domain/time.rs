//! Clock arithmetic helpers and the interval validator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contract::model::{ClockTime, Interval, SlotStatus, SlotUpdate, TimeRange};
use crate::domain::error::DomainError;

const HALF_HOUR: u16 = 30;

/// Parse `HH:mm` into a minute-of-day offset.
pub fn to_minutes(clock: &str) -> Result<u16, DomainError> {
    Ok(ClockTime::parse(clock)?.minutes())
}

/// Signed distance in minutes from `from` to `to`.
pub fn minutes_between(from: ClockTime, to: ClockTime) -> i32 {
    i32::from(to.minutes()) - i32::from(from.minutes())
}

/// Boundary policy applied to every interval and target range.
///
/// A deployment picks exactly one; there is no per-call override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Any `HH:mm` pair with start before end.
    #[default]
    Free,
    /// Boundaries on :00 or :30.
    HalfHour,
    /// Boundaries on :00 or :30 and exactly thirty minutes long.
    HalfHourFixed,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Granularity::Free => "free",
            Granularity::HalfHour => "half_hour",
            Granularity::HalfHourFixed => "half_hour_fixed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalValidator {
    granularity: Granularity,
}

impl IntervalValidator {
    pub fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn validate_range(&self, range: &TimeRange) -> Result<(), DomainError> {
        if range.start >= range.end {
            return Err(DomainError::invalid_interval(*range));
        }

        match self.granularity {
            Granularity::Free => Ok(()),
            Granularity::HalfHour => self.check_boundaries(range),
            Granularity::HalfHourFixed => {
                self.check_boundaries(range)?;
                if range.duration_minutes() != HALF_HOUR {
                    return Err(DomainError::granularity(
                        *range,
                        self.granularity,
                        format!("duration must be exactly {HALF_HOUR} minutes"),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Range rules plus the reservation-reference invariant.
    pub fn validate_interval(&self, interval: &Interval) -> Result<(), DomainError> {
        self.validate_range(&interval.range())?;
        check_reservation_ref(interval.status, interval.reservation_ref.as_deref())
    }

    pub fn validate_update(&self, update: &SlotUpdate) -> Result<(), DomainError> {
        check_reservation_ref(update.status, update.reservation_ref.as_deref())
    }

    fn check_boundaries(&self, range: &TimeRange) -> Result<(), DomainError> {
        for bound in [range.start, range.end] {
            if bound.minute() % HALF_HOUR != 0 {
                return Err(DomainError::granularity(
                    *range,
                    self.granularity,
                    format!("{bound} is not on a half-hour boundary"),
                ));
            }
        }
        Ok(())
    }
}

fn check_reservation_ref(
    status: SlotStatus,
    reservation_ref: Option<&str>,
) -> Result<(), DomainError> {
    match (status, reservation_ref) {
        (SlotStatus::Reserved, Some(r)) if !r.trim().is_empty() => Ok(()),
        (SlotStatus::Reserved, _) => Err(DomainError::validation(
            "reservation_ref",
            "a reserved interval requires a non-empty reservation reference",
        )),
        (_, Some(_)) => Err(DomainError::validation(
            "reservation_ref",
            format!("only reserved intervals carry a reservation reference, got {status}"),
        )),
        (_, None) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: &str, end: &str) -> TimeRange {
        TimeRange::parse(start, end).unwrap()
    }

    #[test]
    fn parses_clock_times() {
        assert_eq!(to_minutes("00:00").unwrap(), 0);
        assert_eq!(to_minutes("09:30").unwrap(), 570);
        assert_eq!(to_minutes("23:59").unwrap(), 1439);
    }

    #[test]
    fn rejects_malformed_clock_times() {
        for bad in ["24:00", "9:30", "09:3", "09:60", "0930", "ab:cd", "", "09:30:00", "-1:00"] {
            let err = to_minutes(bad).unwrap_err();
            assert!(
                matches!(err, DomainError::InvalidClockTime { ref input } if input == bad),
                "{bad} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn formats_back_to_padded_clock() {
        let t = ClockTime::from_hm(7, 5).unwrap();
        assert_eq!(t.to_string(), "07:05");
        assert_eq!(minutes_between(t, ClockTime::parse("08:00").unwrap()), 55);
        assert_eq!(minutes_between(ClockTime::parse("08:00").unwrap(), t), -55);
    }

    #[test]
    fn free_policy_only_requires_ordering() {
        let v = IntervalValidator::new(Granularity::Free);
        assert!(v.validate_range(&range("09:07", "09:13")).is_ok());
        assert!(matches!(
            v.validate_range(&range("10:00", "10:00")),
            Err(DomainError::InvalidInterval { .. })
        ));
        assert!(matches!(
            v.validate_range(&range("11:00", "10:00")),
            Err(DomainError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn half_hour_policy_checks_boundaries() {
        let v = IntervalValidator::new(Granularity::HalfHour);
        assert!(v.validate_range(&range("09:00", "11:30")).is_ok());
        assert!(matches!(
            v.validate_range(&range("09:15", "10:00")),
            Err(DomainError::Granularity { .. })
        ));
    }

    #[test]
    fn fixed_policy_checks_duration() {
        let v = IntervalValidator::new(Granularity::HalfHourFixed);
        assert!(v.validate_range(&range("09:30", "10:00")).is_ok());
        assert!(matches!(
            v.validate_range(&range("09:00", "10:00")),
            Err(DomainError::Granularity { .. })
        ));
    }

    #[test]
    fn reservation_ref_must_follow_status() {
        let v = IntervalValidator::default();
        let r = range("09:00", "10:00");
        assert!(v.validate_interval(&Interval::reserved(r, "order-1")).is_ok());
        assert!(v.validate_interval(&Interval::open(r)).is_ok());

        let dangling = Interval::with_status(r, SlotStatus::Open, Some("order-1".into()));
        assert!(matches!(
            v.validate_interval(&dangling),
            Err(DomainError::Validation { .. })
        ));

        let missing = Interval::with_status(r, SlotStatus::Reserved, None);
        assert!(v.validate_interval(&missing).is_err());
        assert!(v.validate_update(&SlotUpdate::reserved("  ")).is_err());
    }
}
