mod common;

use std::sync::Arc;

use uuid::Uuid;

use availability::contract::model::SlotStatus;
use availability::domain::error::DomainError;
use availability::domain::repo::ScheduleRepository;
use availability::infra::storage::memory_repo::InMemoryScheduleRepository;
use common::{date, open, range, service, service_over};

const CONTENDERS: usize = 16;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reservations_have_a_single_winner() {
    let svc = Arc::new(service());
    let owner = Uuid::new_v4();
    svc.create_or_merge(owner, date(1), vec![open("09:00", "10:00")])
        .await
        .unwrap();

    let handles: Vec<_> = (0..CONTENDERS)
        .map(|i| {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.reserve(owner, date(1), range("09:00", "10:00"), format!("order-{i}"))
                    .await
            })
        })
        .collect();

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(DomainError::Conflict { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(wins, 1);

    let day = svc.read(owner, date(1)).await.unwrap();
    assert_eq!(day.intervals.len(), 1);
    assert_eq!(day.intervals[0].status, SlotStatus::Reserved);
    assert_eq!(day.version, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_subranges_race_to_a_single_reservation() {
    let svc = Arc::new(service());

    for round in 0..20 {
        let owner = Uuid::new_v4();
        svc.create_or_merge(owner, date(1), vec![open("09:00", "12:00")])
            .await
            .unwrap();

        let handles: Vec<_> = [("09:30", "10:30"), ("10:00", "11:00")]
            .into_iter()
            .map(|(start, end)| {
                let svc = svc.clone();
                tokio::spawn(async move {
                    svc.reserve(owner, date(1), range(start, end), format!("order-{start}"))
                        .await
                })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(DomainError::Conflict { .. }) => {}
                Err(other) => panic!("round {round}: unexpected error: {other:?}"),
            }
        }
        assert_eq!(wins, 1, "round {round}");

        let day = svc.read(owner, date(1)).await.unwrap();
        let reserved = day
            .intervals
            .iter()
            .filter(|i| i.status == SlotStatus::Reserved)
            .count();
        assert_eq!(reserved, 1, "round {round}: {:?}", day.intervals);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_days_do_not_contend() {
    let svc = Arc::new(service());
    let owner = Uuid::new_v4();

    let handles: Vec<_> = (1..=20u32)
        .map(|day| {
            let svc = svc.clone();
            tokio::spawn(async move {
                svc.create_or_merge(owner, date(day), vec![open("09:00", "10:00")])
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let days = svc.range_query(owner, date(1), date(31), None).await.unwrap();
    assert_eq!(days.len(), 20);
}

/// Two service instances over one store model two processes sharing a
/// database: their in-process locks are separate, so only the version check
/// on save keeps the outcome consistent.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn version_check_arbitrates_between_independent_services() {
    let repo: Arc<dyn ScheduleRepository> = Arc::new(InMemoryScheduleRepository::new());
    let a = Arc::new(service_over(repo.clone()));
    let b = Arc::new(service_over(repo.clone()));
    let owner = Uuid::new_v4();
    a.create_or_merge(owner, date(1), vec![open("09:00", "10:00")])
        .await
        .unwrap();

    let handles: Vec<_> = (0..CONTENDERS)
        .map(|i| {
            let svc = if i % 2 == 0 { a.clone() } else { b.clone() };
            tokio::spawn(async move {
                svc.reserve(owner, date(1), range("09:00", "10:00"), format!("order-{i}"))
                    .await
            })
        })
        .collect();

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(DomainError::Conflict { .. } | DomainError::ConcurrentModification { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(wins, 1);

    let stored = repo.find(owner, date(1)).await.unwrap().unwrap();
    assert_eq!(stored.intervals[0].status, SlotStatus::Reserved);
}
