use chrono::NaiveDate;
use uuid::Uuid;

use availability::contract::{error::AvailabilityError, error::ErrorClass, model::*};
use availability::domain::error::DomainError;
use availability::domain::time::Granularity;
// Note: These internal module imports are only for testing
// External consumers should only use the `contract` module

fn range(start: &str, end: &str) -> TimeRange {
    TimeRange::parse(start, end).unwrap()
}

#[test]
fn test_contract_models_serialize_clock_strings() {
    let interval = Interval::reserved(range("09:00", "09:30"), "order-1");
    let json = serde_json::to_value(&interval).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "start": "09:00",
            "end": "09:30",
            "status": "RESERVED",
            "reservation_ref": "order-1"
        })
    );

    let open: Interval =
        serde_json::from_str(r#"{"start":"10:00","end":"11:00","status":"OPEN"}"#).unwrap();
    assert_eq!(open, Interval::open(range("10:00", "11:00")));

    let bad = serde_json::from_str::<Interval>(r#"{"start":"9:00","end":"11:00","status":"OPEN"}"#);
    assert!(bad.is_err());
}

#[test]
fn test_contract_errors() {
    let error = AvailabilityError::not_found("nothing here");
    match error {
        AvailabilityError::NotFound { ref message } => assert_eq!(message, "nothing here"),
        _ => panic!("Expected NotFound error"),
    }
    assert_eq!(error.class(), ErrorClass::MissingResource);

    assert_eq!(AvailabilityError::internal().class(), ErrorClass::Internal);
    assert_eq!(
        AvailabilityError::format("bad").class(),
        ErrorClass::ClientInput
    );
}

#[test]
fn test_domain_errors_map_to_contract_errors() {
    let owner = Uuid::nil();
    let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let r = range("09:00", "10:00");

    let cases = vec![
        (
            DomainError::InvalidClockTime { input: "9:00".into() },
            ErrorClass::ClientInput,
        ),
        (DomainError::invalid_interval(r), ErrorClass::ClientInput),
        (
            DomainError::granularity(r, Granularity::HalfHourFixed, "too long"),
            ErrorClass::ClientInput,
        ),
        (DomainError::overlap(r, r), ErrorClass::ClientInput),
        (
            DomainError::schedule_not_found(owner, date),
            ErrorClass::MissingResource,
        ),
        (DomainError::range_not_found(r), ErrorClass::MissingResource),
        (DomainError::conflict(r, "taken"), ErrorClass::StateConflict),
        (
            DomainError::concurrent_modification(owner, date),
            ErrorClass::StateConflict,
        ),
        (DomainError::storage("disk full"), ErrorClass::Internal),
    ];

    for (domain, class) in cases {
        let contract = AvailabilityError::from(domain.clone());
        assert_eq!(contract.class(), class, "{domain:?}");
    }

    // Storage details are not leaked across the contract.
    assert_eq!(
        AvailabilityError::from(DomainError::storage("disk full")),
        AvailabilityError::Internal
    );
}

#[test]
fn test_clock_parse_error_is_a_format_error() {
    let err = ClockTime::parse("24:00").unwrap_err();
    assert!(matches!(
        AvailabilityError::from(err),
        AvailabilityError::Format { .. }
    ));
}
