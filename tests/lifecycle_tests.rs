// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge lifecycle tests driven through the session service.

use chrono::Duration;
use courage::db::SessionDb;
use courage::error::AppError;
use courage::models::{ChallengeStatus, Language, HISTORY_CAPACITY};
use courage::time_utils::FixedClock;
use std::sync::Arc;

mod common;

use common::{start_time, test_profile, test_service, MockGenerator};

fn fresh() -> (
    courage::services::SessionService,
    Arc<MockGenerator>,
    Arc<FixedClock>,
    SessionDb,
) {
    let db = SessionDb::new_in_memory();
    let generator = Arc::new(MockGenerator::default());
    let clock = Arc::new(FixedClock::new(start_time()));
    let service = test_service(db.clone(), generator.clone(), clock.clone());
    (service, generator, clock, db)
}

#[tokio::test]
async fn test_onboarding_generates_first_challenge() {
    let (service, generator, _clock, db) = fresh();

    let snapshot = service.onboard(test_profile()).await.unwrap();

    assert_eq!(generator.calls(), 1);
    assert_eq!(snapshot.status(), ChallengeStatus::Proposed);
    assert!(!snapshot.loading);
    assert_eq!(db.get_profile().unwrap(), Some(test_profile()));

    let stored = db
        .get_current_challenge(start_time().date_naive())
        .unwrap()
        .unwrap();
    assert_eq!(Some(&stored), snapshot.current.as_ref());
    assert_eq!(stored.date, start_time().date_naive());
}

#[tokio::test]
async fn test_onboarding_twice_is_rejected() {
    let (service, _generator, _clock, _db) = fresh();
    service.onboard(test_profile()).await.unwrap();

    let err = service.onboard(test_profile()).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyOnboarded));
}

#[tokio::test]
async fn test_failed_first_generation_keeps_profile() {
    let (service, generator, _clock, db) = fresh();
    generator.set_failing(true);

    let snapshot = service.onboard(test_profile()).await.unwrap();

    assert!(snapshot.profile.is_some());
    assert_eq!(snapshot.status(), ChallengeStatus::Absent);
    assert!(!snapshot.loading);
    assert!(db.get_profile().unwrap().is_some());
}

#[tokio::test]
async fn test_actions_require_profile() {
    let (service, generator, _clock, _db) = fresh();

    assert!(matches!(
        service.generate().await.unwrap_err(),
        AppError::NotOnboarded
    ));
    assert!(matches!(service.accept().unwrap_err(), AppError::NotOnboarded));
    assert!(matches!(
        service.change_language(Language::English).await.unwrap_err(),
        AppError::NotOnboarded
    ));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_full_lifecycle_records_history() {
    let (service, _generator, clock, db) = fresh();
    service.onboard(test_profile()).await.unwrap();

    let accepted = service.accept().unwrap();
    assert_eq!(accepted.status(), ChallengeStatus::Accepted);
    let challenge = accepted.current.unwrap();
    assert_eq!(challenge.accepted_at, Some(start_time()));

    clock.advance(Duration::seconds(3661));
    let completed = service.confirm_done().unwrap();
    assert_eq!(completed.status(), ChallengeStatus::Completed);
    assert_eq!(completed.elapsed_seconds(), Some(3661));

    let history = db.get_history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history.list()[0].id, challenge.id);
    assert_eq!(history.list()[0].is_completed, Some(true));
}

#[tokio::test]
async fn test_repeated_accept_keeps_first_timestamp() {
    let (service, _generator, clock, _db) = fresh();
    service.onboard(test_profile()).await.unwrap();

    service.accept().unwrap();
    clock.advance(Duration::minutes(5));
    let again = service.accept().unwrap();

    assert_eq!(again.current.unwrap().accepted_at, Some(start_time()));
}

#[tokio::test]
async fn test_repeated_done_adds_one_history_entry() {
    let (service, _generator, _clock, db) = fresh();
    service.onboard(test_profile()).await.unwrap();
    service.accept().unwrap();

    service.confirm_done().unwrap();
    service.confirm_done().unwrap();

    assert_eq!(db.get_history().unwrap().len(), 1);
}

#[tokio::test]
async fn test_done_requires_acceptance() {
    let (service, _generator, _clock, db) = fresh();
    service.onboard(test_profile()).await.unwrap();

    let err = service.confirm_done().unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    assert!(db.get_history().unwrap().is_empty());
}

#[tokio::test]
async fn test_accept_after_completion_is_rejected() {
    let (service, _generator, _clock, _db) = fresh();
    service.onboard(test_profile()).await.unwrap();
    service.accept().unwrap();
    service.confirm_done().unwrap();

    let err = service.accept().unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_another_rejected_while_accepted() {
    let (service, generator, _clock, _db) = fresh();
    service.onboard(test_profile()).await.unwrap();
    service.accept().unwrap();

    let err = service.another().await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_another_replaces_proposed_challenge() {
    let (service, generator, _clock, _db) = fresh();
    let first = service.onboard(test_profile()).await.unwrap();
    let first_id = first.current.unwrap().id;

    let second = service.another().await.unwrap();
    let second = second.current.unwrap();

    assert_ne!(second.id, first_id);
    assert_eq!(second.status(), ChallengeStatus::Proposed);
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn test_another_after_completion_keeps_history() {
    let (service, _generator, _clock, db) = fresh();
    service.onboard(test_profile()).await.unwrap();
    service.accept().unwrap();
    service.confirm_done().unwrap();

    let next = service.another().await.unwrap();
    assert_eq!(next.status(), ChallengeStatus::Proposed);
    assert_eq!(db.get_history().unwrap().len(), 1);
}

#[tokio::test]
async fn test_generate_over_existing_challenge_is_rejected() {
    let (service, generator, _clock, _db) = fresh();
    service.onboard(test_profile()).await.unwrap();

    let err = service.generate().await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_generation_failure_returns_to_absent() {
    let (service, generator, _clock, db) = fresh();
    service.onboard(test_profile()).await.unwrap();

    generator.set_failing(true);
    let err = service.another().await.unwrap_err();
    assert!(matches!(err, AppError::Generation(_)));

    let snapshot = service.snapshot().unwrap();
    assert_eq!(snapshot.status(), ChallengeStatus::Absent);
    assert!(!snapshot.loading);
    assert!(db
        .get_current_challenge(start_time().date_naive())
        .unwrap()
        .is_none());

    // A later explicit retry succeeds.
    generator.set_failing(false);
    let retried = service.generate().await.unwrap();
    assert_eq!(retried.status(), ChallengeStatus::Proposed);
}

#[tokio::test]
async fn test_history_keeps_most_recent_twenty() {
    let (service, _generator, clock, db) = fresh();
    service.onboard(test_profile()).await.unwrap();

    let mut ids = Vec::new();
    for i in 0..(HISTORY_CAPACITY + 1) {
        if i > 0 {
            service.another().await.unwrap();
        }
        let accepted = service.accept().unwrap();
        ids.push(accepted.current.unwrap().id);
        clock.advance(Duration::seconds(10));
        service.confirm_done().unwrap();
    }

    let history = db.get_history().unwrap();
    assert_eq!(history.len(), HISTORY_CAPACITY);
    assert_eq!(history.list()[0].id, ids[HISTORY_CAPACITY]);
    assert!(history.list().iter().all(|c| c.id != ids[0]));
}

#[tokio::test]
async fn test_day_rollover_drops_challenge() {
    let (service, generator, clock, db) = fresh();
    service.onboard(test_profile()).await.unwrap();
    service.accept().unwrap();

    clock.advance(Duration::days(1));
    let snapshot = service.snapshot().unwrap();

    assert_eq!(snapshot.status(), ChallengeStatus::Absent);
    assert!(db
        .get_current_challenge(clock_today(&clock))
        .unwrap()
        .is_none());
    // Viewing never generates.
    assert_eq!(generator.calls(), 1);

    let next = service.generate().await.unwrap();
    assert_eq!(next.current.unwrap().date, clock_today(&clock));
}

fn clock_today(clock: &FixedClock) -> chrono::NaiveDate {
    use courage::time_utils::Clock;
    clock.today()
}

#[tokio::test]
async fn test_stale_record_ignored_on_load() {
    let (service, generator, clock, db) = fresh();
    service.onboard(test_profile()).await.unwrap();
    drop(service);

    clock.advance(Duration::days(2));
    let reloaded = test_service(db.clone(), generator, clock);

    assert_eq!(reloaded.snapshot().unwrap().status(), ChallengeStatus::Absent);
    assert!(reloaded.snapshot().unwrap().profile.is_some());
}

#[tokio::test]
async fn test_language_change_regenerates_once() {
    let (service, generator, _clock, db) = fresh();
    service.onboard(test_profile()).await.unwrap();
    service.accept().unwrap();

    let snapshot = service.change_language(Language::German).await.unwrap();

    assert_eq!(generator.calls(), 2);
    assert_eq!(snapshot.status(), ChallengeStatus::Proposed);
    assert!(snapshot.current.unwrap().title.contains("Deutsch"));
    assert_eq!(db.get_profile().unwrap().unwrap().language, Language::German);
}

#[tokio::test]
async fn test_same_language_is_noop() {
    let (service, generator, _clock, _db) = fresh();
    let before = service.onboard(test_profile()).await.unwrap();

    let after = service.change_language(Language::French).await.unwrap();

    assert_eq!(generator.calls(), 1);
    assert_eq!(after.current, before.current);
}

#[tokio::test]
async fn test_language_change_keeps_completed_challenge() {
    let (service, generator, _clock, _db) = fresh();
    service.onboard(test_profile()).await.unwrap();
    service.accept().unwrap();
    let done = service.confirm_done().unwrap();

    let after = service.change_language(Language::Italian).await.unwrap();

    assert_eq!(generator.calls(), 1);
    assert_eq!(after.current, done.current);
    assert_eq!(after.profile.unwrap().language, Language::Italian);
}

#[tokio::test]
async fn test_actions_rejected_while_loading() {
    let db = SessionDb::new_in_memory();
    let generator = Arc::new(MockGenerator::default());
    let clock = Arc::new(FixedClock::new(start_time()));
    let service = Arc::new(test_service(db, generator.clone(), clock));
    service.onboard(test_profile()).await.unwrap();

    generator.set_holding(true);
    let background = {
        let service = service.clone();
        tokio::spawn(async move { service.change_language(Language::English).await })
    };
    // Onboarding left a stored permit behind, so count calls instead.
    while generator.calls() < 2 {
        generator.started.notified().await;
    }

    assert!(service.snapshot().unwrap().loading);
    assert!(matches!(service.accept().unwrap_err(), AppError::Busy));
    assert!(matches!(
        service.change_language(Language::Spanish).await.unwrap_err(),
        AppError::Busy
    ));
    assert!(matches!(service.reset().unwrap_err(), AppError::Busy));

    generator.release.notify_one();
    let result = background.await.unwrap().unwrap();

    assert_eq!(generator.calls(), 2);
    assert!(!result.loading);
    assert_eq!(result.profile.unwrap().language, Language::English);
}

#[tokio::test]
async fn test_abandoned_generation_clears_loading() {
    let db = SessionDb::new_in_memory();
    let generator = Arc::new(MockGenerator::default());
    let clock = Arc::new(FixedClock::new(start_time()));
    let service = Arc::new(test_service(db, generator.clone(), clock));
    service.onboard(test_profile()).await.unwrap();

    generator.set_holding(true);
    let background = {
        let service = service.clone();
        tokio::spawn(async move { service.another().await })
    };
    while generator.calls() < 2 {
        generator.started.notified().await;
    }
    assert!(service.snapshot().unwrap().loading);

    background.abort();
    let _ = background.await;

    let snapshot = service.snapshot().unwrap();
    assert!(!snapshot.loading);
    assert_eq!(snapshot.status(), ChallengeStatus::Absent);
}

#[tokio::test]
async fn test_reset_clears_everything() {
    let (service, _generator, _clock, db) = fresh();
    service.onboard(test_profile()).await.unwrap();
    service.accept().unwrap();
    service.confirm_done().unwrap();

    let snapshot = service.reset().unwrap();

    assert!(snapshot.profile.is_none());
    assert!(snapshot.current.is_none());
    assert!(snapshot.history.is_empty());
    assert!(db.get_profile().unwrap().is_none());
    assert!(db.get_history().unwrap().is_empty());
}

#[tokio::test]
async fn test_share_requires_challenge() {
    let (service, generator, _clock, _db) = fresh();
    generator.set_failing(true);
    service.onboard(test_profile()).await.unwrap();

    assert!(matches!(service.share().unwrap_err(), AppError::NoChallenge));
}
