// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session and challenge lifecycle routes.

use crate::error::{AppError, Result};
use crate::models::{Challenge, ChallengeStatus, Profile};
use crate::services::{SessionSnapshot, SharePayload};
use crate::time_utils::{format_compact, format_timer, format_utc_rfc3339};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session", get(get_session).delete(reset_session))
        .route("/api/challenge/generate", post(generate_challenge))
        .route("/api/challenge/accept", post(accept_challenge))
        .route("/api/challenge/done", post(confirm_done))
        .route("/api/challenge/another", post(another_challenge))
        .route("/api/challenge/share", get(share_challenge))
}

// ─── Views ───────────────────────────────────────────────────

/// What the client should render.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionView {
    /// `onboarding`, `loading`, `absent`, `proposed`, `accepted` or `completed`
    pub state: String,
    pub profile: Option<Profile>,
    pub challenge: Option<Challenge>,
    /// Seconds since acceptance (accepted) or the final duration (completed)
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub elapsed_seconds: Option<u64>,
    /// Live timer, `HH:MM:SS` (accepted only)
    pub timer: Option<String>,
    /// Compact duration, `1h2m3s` (completed only)
    pub duration: Option<String>,
    pub history: Vec<HistoryEntryView>,
}

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HistoryEntryView {
    pub id: String,
    pub date: String,
    pub title: String,
    pub category: String,
    pub difficulty: String,
    pub completed_at: Option<String>,
    pub duration: String,
}

impl HistoryEntryView {
    fn from_challenge(challenge: &Challenge) -> Self {
        let seconds = match (challenge.accepted_at, challenge.completed_at) {
            (Some(start), Some(end)) => crate::time_utils::elapsed_seconds(start, end),
            _ => 0,
        };
        Self {
            id: challenge.id.clone(),
            date: challenge.date.to_string(),
            title: challenge.title.clone(),
            category: challenge.category.clone(),
            difficulty: challenge.difficulty.clone(),
            completed_at: challenge.completed_at.map(format_utc_rfc3339),
            duration: format_compact(seconds),
        }
    }
}

impl SessionView {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let status = snapshot.status();
        let state = if snapshot.profile.is_none() {
            "onboarding"
        } else if snapshot.loading {
            "loading"
        } else {
            status.as_str()
        };

        let elapsed_seconds = snapshot.elapsed_seconds();
        let timer = match status {
            ChallengeStatus::Accepted => elapsed_seconds.map(format_timer),
            _ => None,
        };
        let duration = match status {
            ChallengeStatus::Completed => elapsed_seconds.map(format_compact),
            _ => None,
        };

        Self {
            state: state.to_string(),
            profile: snapshot.profile.clone(),
            challenge: snapshot.current.clone(),
            elapsed_seconds,
            timer,
            duration,
            history: snapshot
                .history
                .list()
                .iter()
                .map(HistoryEntryView::from_challenge)
                .collect(),
        }
    }
}

// ─── Handlers ────────────────────────────────────────────────

/// Current session view. Never triggers generation.
async fn get_session(State(state): State<Arc<AppState>>) -> Result<Json<SessionView>> {
    let snapshot = state.session.snapshot()?;
    Ok(Json(SessionView::from_snapshot(&snapshot)))
}

/// Generate today's challenge when there is none.
async fn generate_challenge(State(state): State<Arc<AppState>>) -> Result<Json<SessionView>> {
    let snapshot = state.session.generate().await?;
    Ok(Json(SessionView::from_snapshot(&snapshot)))
}

async fn accept_challenge(State(state): State<Arc<AppState>>) -> Result<Json<SessionView>> {
    let snapshot = state.session.accept()?;
    Ok(Json(SessionView::from_snapshot(&snapshot)))
}

async fn confirm_done(State(state): State<Arc<AppState>>) -> Result<Json<SessionView>> {
    let snapshot = state.session.confirm_done()?;
    Ok(Json(SessionView::from_snapshot(&snapshot)))
}

/// Replace a proposed or completed challenge with a new one.
async fn another_challenge(State(state): State<Arc<AppState>>) -> Result<Json<SessionView>> {
    let snapshot = state.session.another().await?;
    Ok(Json(SessionView::from_snapshot(&snapshot)))
}

async fn share_challenge(State(state): State<Arc<AppState>>) -> Result<Json<SharePayload>> {
    Ok(Json(state.session.share()?))
}

#[derive(Deserialize)]
struct ResetQuery {
    /// Must be `true`; reset is irreversible.
    #[serde(default)]
    confirm: bool,
}

/// Clear profile, challenge and history.
async fn reset_session(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResetQuery>,
) -> Result<Json<SessionView>> {
    if !params.confirm {
        return Err(AppError::BadRequest(
            "Reset requires confirm=true".to_string(),
        ));
    }

    tracing::info!("User-initiated session reset");
    let snapshot = state.session.reset()?;
    Ok(Json(SessionView::from_snapshot(&snapshot)))
}
