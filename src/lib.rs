// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Courage: one AI-generated personal-growth challenge per day
//!
//! This crate provides the local backend of the app: it keeps the user's
//! profile, today's challenge and the history of completed challenges on the
//! device, and asks Gemini for new challenges.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::SessionService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub session: SessionService,
}
