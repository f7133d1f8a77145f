// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily challenge record and its lifecycle transitions.
//!
//! A challenge moves `Proposed -> Accepted -> Completed`. `Absent` is the
//! lack of a record and lives with the session, not here.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Lifecycle state of the session's current challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ChallengeStatus {
    Absent,
    Proposed,
    Accepted,
    Completed,
}

impl ChallengeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ChallengeStatus::Absent => "absent",
            ChallengeStatus::Proposed => "proposed",
            ChallengeStatus::Accepted => "accepted",
            ChallengeStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Challenge content as returned by the generator, before it is dated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedChallenge {
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub reasoning: String,
}

/// Persisted challenge (`current_challenge` record and history entries).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Challenge {
    pub id: String,
    /// Calendar day this challenge belongs to (`YYYY-MM-DD`)
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_accepted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    /// Milliseconds since the Unix epoch
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub accepted_at: Option<DateTime<Utc>>,
    /// Milliseconds since the Unix epoch
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Rejected lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} a {from} challenge")]
pub struct TransitionError {
    pub from: ChallengeStatus,
    pub action: &'static str,
}

/// Outcome of a transition that tolerates repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    AlreadyDone,
}

impl Challenge {
    /// Date a freshly generated challenge for `date`.
    pub fn new(id: String, date: NaiveDate, generated: GeneratedChallenge) -> Self {
        Self {
            id,
            date,
            title: generated.title,
            description: generated.description,
            category: generated.category,
            difficulty: generated.difficulty,
            reasoning: generated.reasoning,
            is_accepted: None,
            is_completed: None,
            accepted_at: None,
            completed_at: None,
        }
    }

    pub fn status(&self) -> ChallengeStatus {
        if self.is_completed == Some(true) {
            ChallengeStatus::Completed
        } else if self.is_accepted == Some(true) {
            ChallengeStatus::Accepted
        } else {
            ChallengeStatus::Proposed
        }
    }

    /// `Proposed -> Accepted`. `acceptedAt` is written once and never replaced.
    pub fn accept(&mut self, now: DateTime<Utc>) -> Result<Transition, TransitionError> {
        match self.status() {
            ChallengeStatus::Proposed => {
                self.is_accepted = Some(true);
                if self.accepted_at.is_none() {
                    self.accepted_at = Some(now);
                }
                Ok(Transition::Applied)
            }
            ChallengeStatus::Accepted => Ok(Transition::AlreadyDone),
            from => Err(TransitionError {
                from,
                action: "accept",
            }),
        }
    }

    /// `Accepted -> Completed`. `completedAt` never precedes `acceptedAt`.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<Transition, TransitionError> {
        match self.status() {
            ChallengeStatus::Accepted => {
                let accepted_at = *self.accepted_at.get_or_insert(now);
                self.is_completed = Some(true);
                self.completed_at = Some(now.max(accepted_at));
                Ok(Transition::Applied)
            }
            ChallengeStatus::Completed => Ok(Transition::AlreadyDone),
            from => Err(TransitionError {
                from,
                action: "complete",
            }),
        }
    }

    /// Whether the record belongs to `today`.
    pub fn is_for_day(&self, today: NaiveDate) -> bool {
        self.date == today
    }

    /// Check the lifecycle invariants of a record read back from storage.
    pub fn is_valid(&self) -> bool {
        if self.id.is_empty() || self.title.trim().is_empty() {
            return false;
        }
        let accepted = self.is_accepted == Some(true);
        let completed = self.is_completed == Some(true);
        if accepted && self.accepted_at.is_none() {
            return false;
        }
        if completed {
            match (accepted, self.accepted_at, self.completed_at) {
                (true, Some(a), Some(c)) => c >= a,
                _ => false,
            }
        } else {
            true
        }
    }

    /// Seconds spent on the challenge so far, derived from `acceptedAt`.
    ///
    /// For a completed challenge this is the final duration.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> Option<u64> {
        let accepted_at = self.accepted_at?;
        let end = match self.status() {
            ChallengeStatus::Completed => self.completed_at?,
            ChallengeStatus::Accepted => now,
            _ => return None,
        };
        Some(crate::time_utils::elapsed_seconds(accepted_at, end))
    }
}
