// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod challenge;
pub mod history;
pub mod profile;

pub use challenge::{
    Challenge, ChallengeStatus, GeneratedChallenge, Transition, TransitionError,
};
pub use history::{History, HISTORY_CAPACITY};
pub use profile::{Identity, Language, Profile};
