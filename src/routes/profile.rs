// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Onboarding and profile settings routes.

use crate::error::Result;
use crate::models::{Identity, Language, Profile};
use crate::routes::api::SessionView;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError, ValidationErrors};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/onboarding", post(onboard))
        .route("/api/profile/language", put(change_language))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OnboardingRequest {
    #[validate(length(min = 1, max = 64), custom(function = "not_blank"))]
    pub name: String,
    pub identity: Identity,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LanguageRequest {
    pub language: Language,
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Birth dates after today are rejected; the clock decides what "today" is.
fn check_birth_date(birth_date: NaiveDate, today: NaiveDate) -> Result<()> {
    if birth_date > today {
        let mut errors = ValidationErrors::new();
        let mut error = ValidationError::new("future_date");
        error.message = Some(Cow::from("birth date cannot be in the future"));
        errors.add("birthDate", error);
        return Err(errors.into());
    }
    Ok(())
}

/// Create the profile and generate the first challenge.
async fn onboard(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<OnboardingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionView>)> {
    let Json(request) = payload?;
    request.validate()?;
    check_birth_date(request.birth_date, state.session.clock().today())?;

    let profile = Profile {
        name: request.name.trim().to_string(),
        identity: request.identity,
        birth_date: request.birth_date,
        language: request.language,
    };

    let snapshot = state.session.onboard(profile).await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionView::from_snapshot(&snapshot)),
    ))
}

async fn change_language(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<LanguageRequest>, JsonRejection>,
) -> Result<Json<SessionView>> {
    let Json(request) = payload?;
    let snapshot = state.session.change_language(request.language).await?;
    Ok(Json(SessionView::from_snapshot(&snapshot)))
}
