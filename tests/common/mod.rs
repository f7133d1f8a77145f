// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use courage::config::Config;
use courage::db::{KeyValueStore, MemoryStore, SessionDb};
use courage::error::AppError;
use courage::models::{GeneratedChallenge, Identity, Language, Profile};
use courage::routes::create_router;
use courage::services::{ChallengeGenerator, GenerationError, SessionService};
use courage::time_utils::FixedClock;
use courage::AppState;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tower::ServiceExt;

/// 2026-03-01T09:00:00Z
#[allow(dead_code)]
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

#[allow(dead_code)]
pub fn test_profile() -> Profile {
    Profile {
        name: "Ghost".to_string(),
        identity: Identity::NonBinary,
        birth_date: NaiveDate::from_ymd_opt(1990, 4, 2).unwrap(),
        language: Language::French,
    }
}

/// Scripted generator: counts calls, can fail, and can hold a call open.
#[allow(dead_code)]
#[derive(Default)]
pub struct MockGenerator {
    calls: AtomicUsize,
    fail: AtomicBool,
    hold: AtomicBool,
    /// Signalled every time `generate` is entered.
    pub started: Notify,
    /// Releases one held call.
    pub release: Notify,
}

#[allow(dead_code)]
impl MockGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent calls wait for `release`.
    pub fn set_holding(&self, hold: bool) {
        self.hold.store(hold, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChallengeGenerator for MockGenerator {
    async fn generate(&self, profile: &Profile) -> Result<GeneratedChallenge, GenerationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.started.notify_one();

        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(GenerationError::Http {
                status: 503,
                message: "UNAVAILABLE: model overloaded".to_string(),
            });
        }

        Ok(GeneratedChallenge {
            title: format!("Challenge #{} ({})", n, profile.language.label()),
            description: "Start a conversation with a stranger.".to_string(),
            category: "Social".to_string(),
            difficulty: "3".to_string(),
            reasoning: "Small steps build confidence.".to_string(),
        })
    }
}

/// In-memory store whose writes or removals of one key can be made to fail.
#[allow(dead_code)]
pub struct FlakyStore {
    inner: MemoryStore,
    key: &'static str,
    failing_sets: AtomicUsize,
    failing_removes: AtomicUsize,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new(key: &'static str) -> Self {
        Self {
            inner: MemoryStore::new(),
            key,
            failing_sets: AtomicUsize::new(0),
            failing_removes: AtomicUsize::new(0),
        }
    }

    /// Fail the next `n` writes of the key.
    pub fn fail_sets(&self, n: usize) {
        self.failing_sets.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` removals of the key.
    pub fn fail_removes(&self, n: usize) {
        self.failing_removes.store(n, Ordering::SeqCst);
    }

    fn should_fail(&self, key: &str, counter: &AtomicUsize) -> bool {
        key == self.key
            && counter
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        if self.should_fail(key, &self.failing_sets) {
            return Err(AppError::Storage("disk full".to_string()));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        if self.should_fail(key, &self.failing_removes) {
            return Err(AppError::Storage("read-only file system".to_string()));
        }
        self.inner.remove(key)
    }
}

/// Everything a test needs to drive the app.
#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub generator: Arc<MockGenerator>,
    pub clock: Arc<FixedClock>,
}

/// Build a session service over the given records.
#[allow(dead_code)]
pub fn test_service(
    db: SessionDb,
    generator: Arc<MockGenerator>,
    clock: Arc<FixedClock>,
) -> SessionService {
    SessionService::load(db, generator, clock).expect("Failed to load session")
}

/// Create a test app over an in-memory store.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    create_test_app_with_db(SessionDb::new_in_memory())
}

#[allow(dead_code)]
pub fn create_test_app_with_db(db: SessionDb) -> TestApp {
    let generator = Arc::new(MockGenerator::default());
    let clock = Arc::new(FixedClock::new(start_time()));
    let session = test_service(db, generator.clone(), clock.clone());

    let state = Arc::new(AppState {
        config: Config::test_default(),
        session,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        generator,
        clock,
    }
}

/// Send a request and decode the JSON body.
#[allow(dead_code)]
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, value)
}

/// Onboard the default test profile through the API.
#[allow(dead_code)]
pub async fn onboard(router: &Router) -> serde_json::Value {
    let (status, body) = send(
        router,
        "POST",
        "/api/onboarding",
        Some(serde_json::json!({
            "name": "Ghost",
            "identity": "Non-binaire",
            "birthDate": "1990-04-02",
            "language": "Français"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "onboarding failed: {}", body);
    body
}
