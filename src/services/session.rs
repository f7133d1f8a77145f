// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session controller: owns the profile, the current challenge and the
//! history, and is the only place they are mutated.
//!
//! Handles:
//! - Onboarding and language changes
//! - The challenge lifecycle (generate, accept, done, another)
//! - Day rollover of the current challenge
//! - Single-flight generation (the `loading` flag)
//! - Reset

use crate::db::SessionDb;
use crate::error::{AppError, Result};
use crate::models::{
    Challenge, ChallengeStatus, History, Language, Profile, Transition, TransitionError,
};
use crate::services::generator::ChallengeGenerator;
use crate::services::share::{share_payload, SharePayload};
use crate::time_utils::Clock;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct SessionState {
    profile: Option<Profile>,
    current: Option<Challenge>,
    history: History,
    /// A generation request is in flight. Never persisted.
    loading: bool,
}

impl SessionState {
    fn status(&self) -> ChallengeStatus {
        self.current
            .as_ref()
            .map_or(ChallengeStatus::Absent, Challenge::status)
    }
}

/// Point-in-time copy of the session for rendering.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub profile: Option<Profile>,
    pub current: Option<Challenge>,
    pub history: History,
    pub loading: bool,
    /// Clock reading the snapshot was taken at
    pub now: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn status(&self) -> ChallengeStatus {
        self.current
            .as_ref()
            .map_or(ChallengeStatus::Absent, Challenge::status)
    }

    /// Seconds since the current challenge was accepted (or its final duration).
    pub fn elapsed_seconds(&self) -> Option<u64> {
        self.current.as_ref()?.elapsed_seconds(self.now)
    }
}

/// Clears the loading flag if a generation is abandoned mid-flight
/// (for example when the HTTP request is dropped).
struct LoadingGuard<'a> {
    state: &'a Mutex<SessionState>,
    armed: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.loading = false;
            tracing::warn!("Challenge generation abandoned before completion");
        }
    }
}

/// Owner of all session state.
pub struct SessionService {
    db: SessionDb,
    generator: Arc<dyn ChallengeGenerator>,
    clock: Arc<dyn Clock>,
    state: Mutex<SessionState>,
}

impl SessionService {
    /// Load the persisted records and build the controller.
    pub fn load(
        db: SessionDb,
        generator: Arc<dyn ChallengeGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let profile = db.get_profile()?;
        let current = db.get_current_challenge(clock.today())?;
        let history = db.get_history()?;

        let state = SessionState {
            profile,
            current,
            history,
            loading: false,
        };

        tracing::info!(
            onboarded = state.profile.is_some(),
            status = %state.status(),
            history = state.history.len(),
            "Session loaded"
        );

        Ok(Self {
            db,
            generator,
            clock,
            state: Mutex::new(state),
        })
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Lock the state, first dropping a challenge left over from a previous day.
    fn lock(&self) -> Result<MutexGuard<'_, SessionState>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Session state lock poisoned")))?;

        let today = self.clock.today();
        if state.current.as_ref().is_some_and(|c| !c.is_for_day(today)) {
            // A leftover record is dropped again on the next load.
            if let Err(e) = self.db.delete_current_challenge() {
                tracing::error!(error = %e, "Failed to delete stale challenge record");
            }
            if let Some(stale) = state.current.take() {
                tracing::info!(id = %stale.id, date = %stale.date, %today, "Day rolled over, dropping challenge");
            }
        }

        Ok(state)
    }

    fn snapshot_of(&self, state: &SessionState) -> SessionSnapshot {
        SessionSnapshot {
            profile: state.profile.clone(),
            current: state.current.clone(),
            history: state.history.clone(),
            loading: state.loading,
            now: self.clock.now(),
        }
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        let state = self.lock()?;
        Ok(self.snapshot_of(&state))
    }

    // ─── Guards ──────────────────────────────────────────────────

    fn ensure_idle(state: &SessionState) -> Result<()> {
        if state.loading {
            tracing::debug!("Rejecting action while a challenge is being generated");
            return Err(AppError::Busy);
        }
        Ok(())
    }

    fn require_profile(state: &SessionState) -> Result<Profile> {
        state.profile.clone().ok_or(AppError::NotOnboarded)
    }

    /// Enter `Loading`. Must be called with the state locked and idle.
    fn start_loading(&self, state: &mut SessionState) -> LoadingGuard<'_> {
        state.loading = true;
        LoadingGuard {
            state: &self.state,
            armed: true,
        }
    }

    /// Remove the current challenge from storage and memory.
    fn discard_current(&self, state: &mut SessionState, reason: &str) -> Result<()> {
        if state.current.is_some() {
            self.db.delete_current_challenge()?;
            if let Some(discarded) = state.current.take() {
                tracing::info!(id = %discarded.id, status = %discarded.status(), reason, "Discarding challenge");
            }
        }
        Ok(())
    }

    // ─── Generation ──────────────────────────────────────────────

    /// Call the generator and install the result. The session is `Loading`
    /// on entry; it leaves `Loading` whatever the outcome.
    async fn run_generation(
        &self,
        profile: Profile,
        mut guard: LoadingGuard<'_>,
    ) -> Result<SessionSnapshot> {
        tracing::info!(language = profile.language.label(), "Generating challenge");
        let outcome = self.generator.generate(&profile).await;

        let mut state = self.lock()?;
        state.loading = false;
        guard.armed = false;

        let generated = match outcome {
            Ok(generated) => generated,
            Err(e) => {
                tracing::error!(error = %e, "Challenge generation failed");
                return Err(AppError::Generation(e.to_string()));
            }
        };

        let challenge = Challenge::new(
            uuid::Uuid::new_v4().to_string(),
            self.clock.today(),
            generated,
        );
        self.db.set_current_challenge(&challenge)?;
        tracing::info!(
            id = %challenge.id,
            category = %challenge.category,
            difficulty = %challenge.difficulty,
            "Challenge proposed"
        );
        state.current = Some(challenge);

        Ok(self.snapshot_of(&state))
    }

    /// Create the profile, then try to generate the first challenge.
    ///
    /// A failed first generation leaves the user onboarded with no challenge.
    pub async fn onboard(&self, profile: Profile) -> Result<SessionSnapshot> {
        let (profile, guard) = {
            let mut state = self.lock()?;
            Self::ensure_idle(&state)?;
            if state.profile.is_some() {
                return Err(AppError::AlreadyOnboarded);
            }
            if !profile.is_valid() {
                return Err(AppError::BadRequest("name is required".to_string()));
            }

            self.db.set_profile(&profile)?;
            tracing::info!(
                identity = profile.identity.label(),
                language = profile.language.label(),
                "Profile created"
            );
            state.profile = Some(profile.clone());
            self.discard_current(&mut state, "new profile")?;

            let guard = self.start_loading(&mut state);
            (profile, guard)
        };

        match self.run_generation(profile, guard).await {
            Err(AppError::Generation(_)) => self.snapshot(),
            other => other,
        }
    }

    /// `Absent -> Proposed`.
    pub async fn generate(&self) -> Result<SessionSnapshot> {
        let (profile, guard) = {
            let mut state = self.lock()?;
            Self::ensure_idle(&state)?;
            let profile = Self::require_profile(&state)?;

            let from = state.status();
            if from != ChallengeStatus::Absent {
                return Err(TransitionError {
                    from,
                    action: "generate over",
                }
                .into());
            }

            let guard = self.start_loading(&mut state);
            (profile, guard)
        };

        self.run_generation(profile, guard).await
    }

    /// Discard a proposed or completed challenge and generate a new one.
    pub async fn another(&self) -> Result<SessionSnapshot> {
        let (profile, guard) = {
            let mut state = self.lock()?;
            Self::ensure_idle(&state)?;
            let profile = Self::require_profile(&state)?;

            let from = state.status();
            if from == ChallengeStatus::Accepted {
                return Err(TransitionError {
                    from,
                    action: "replace",
                }
                .into());
            }

            self.discard_current(&mut state, "another requested")?;
            let guard = self.start_loading(&mut state);
            (profile, guard)
        };

        self.run_generation(profile, guard).await
    }

    /// Change the profile language.
    ///
    /// A proposed or accepted challenge (or none at all) is replaced by one
    /// generated in the new language. A completed challenge is kept.
    pub async fn change_language(&self, language: Language) -> Result<SessionSnapshot> {
        let (profile, guard) = {
            let mut state = self.lock()?;
            Self::ensure_idle(&state)?;
            let mut profile = Self::require_profile(&state)?;

            if profile.language == language {
                return Ok(self.snapshot_of(&state));
            }

            let previous = profile.language;
            profile.language = language;
            self.db.set_profile(&profile)?;
            state.profile = Some(profile.clone());
            tracing::info!(
                from = previous.label(),
                to = language.label(),
                "Language changed"
            );

            if state.status() == ChallengeStatus::Completed {
                tracing::debug!("Keeping completed challenge across language change");
                return Ok(self.snapshot_of(&state));
            }

            self.discard_current(&mut state, "language changed")?;
            let guard = self.start_loading(&mut state);
            (profile, guard)
        };

        self.run_generation(profile, guard).await
    }

    // ─── Lifecycle transitions ───────────────────────────────────

    /// `Proposed -> Accepted`. Repeating it on an accepted challenge is a no-op.
    pub fn accept(&self) -> Result<SessionSnapshot> {
        let mut state = self.lock()?;
        Self::ensure_idle(&state)?;
        Self::require_profile(&state)?;

        let mut challenge = state.current.clone().ok_or(AppError::NoChallenge)?;
        match challenge.accept(self.clock.now())? {
            Transition::Applied => {
                self.db.set_current_challenge(&challenge)?;
                tracing::info!(id = %challenge.id, "Challenge accepted");
                state.current = Some(challenge);
            }
            Transition::AlreadyDone => {
                tracing::debug!(id = %challenge.id, "Challenge already accepted");
            }
        }

        Ok(self.snapshot_of(&state))
    }

    /// `Accepted -> Completed`, recording the challenge in the history.
    /// Repeating it on a completed challenge is a no-op, except that a
    /// history entry lost to an earlier storage failure is written again.
    pub fn confirm_done(&self) -> Result<SessionSnapshot> {
        let mut state = self.lock()?;
        Self::ensure_idle(&state)?;
        Self::require_profile(&state)?;

        let mut challenge = state.current.clone().ok_or(AppError::NoChallenge)?;
        match challenge.complete(self.clock.now())? {
            Transition::Applied => {
                let mut history = state.history.clone();
                history.append(challenge.clone());

                // History first, so a completed record always has its entry.
                // Memory changes only once both records are written.
                self.db.set_history(&history)?;
                self.db.set_current_challenge(&challenge)?;

                tracing::info!(
                    id = %challenge.id,
                    duration_secs = challenge.elapsed_seconds(self.clock.now()).unwrap_or(0),
                    history = history.len(),
                    "Challenge completed"
                );
                state.history = history;
                state.current = Some(challenge);
            }
            Transition::AlreadyDone if !state.history.contains(&challenge.id) => {
                let mut history = state.history.clone();
                history.append(challenge.clone());
                self.db.set_history(&history)?;
                tracing::warn!(id = %challenge.id, "Restored missing history entry");
                state.history = history;
            }
            Transition::AlreadyDone => {
                tracing::debug!(id = %challenge.id, "Challenge already completed");
            }
        }

        Ok(self.snapshot_of(&state))
    }

    /// Share text for the current challenge.
    pub fn share(&self) -> Result<SharePayload> {
        let state = self.lock()?;
        let profile = Self::require_profile(&state)?;
        let challenge = state.current.as_ref().ok_or(AppError::NoChallenge)?;
        Ok(share_payload(challenge, profile.language))
    }

    /// Clear every record and return to pre-onboarding.
    pub fn reset(&self) -> Result<SessionSnapshot> {
        let mut state = self.lock()?;
        Self::ensure_idle(&state)?;

        self.db.clear_all()?;
        *state = SessionState::default();
        tracing::info!("Session reset");

        Ok(self.snapshot_of(&state))
    }
}
