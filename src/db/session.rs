// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed access to the three session records.
//!
//! Provides high-level operations for:
//! - Profile (onboarding record)
//! - Current challenge (scoped to one calendar day)
//! - History (completed challenges)
//!
//! Records that fail to parse or validate are treated as absent.

use crate::db::keys;
use crate::db::store::{KeyValueStore, MemoryStore};
use crate::error::AppError;
use crate::models::{Challenge, History, Profile};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Session record store.
#[derive(Clone)]
pub struct SessionDb {
    store: Arc<dyn KeyValueStore>,
}

impl SessionDb {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Create an in-memory database (tests, throwaway sessions).
    pub fn new_in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Read and decode a record, failing closed on corrupt JSON.
    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Malformed record, treating as absent");
                Ok(None)
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode {}: {}", key, e)))?;
        self.store.set(key, &raw)
    }

    // ─── Profile ─────────────────────────────────────────────────

    pub fn get_profile(&self) -> Result<Option<Profile>, AppError> {
        Ok(self
            .read::<Profile>(keys::PROFILE)?
            .filter(|profile| {
                let valid = profile.is_valid();
                if !valid {
                    tracing::warn!("Stored profile has no name, treating as absent");
                }
                valid
            }))
    }

    pub fn set_profile(&self, profile: &Profile) -> Result<(), AppError> {
        self.write(keys::PROFILE, profile)
    }

    // ─── Current Challenge ───────────────────────────────────────

    /// Get the current challenge if it belongs to `today`.
    ///
    /// A record from another day is removed and reported as absent.
    pub fn get_current_challenge(&self, today: NaiveDate) -> Result<Option<Challenge>, AppError> {
        let Some(challenge) = self.read::<Challenge>(keys::CURRENT_CHALLENGE)? else {
            return Ok(None);
        };

        if !challenge.is_valid() {
            tracing::warn!(id = %challenge.id, "Stored challenge breaks lifecycle invariants, treating as absent");
            return Ok(None);
        }

        if !challenge.is_for_day(today) {
            tracing::debug!(
                id = %challenge.id,
                date = %challenge.date,
                %today,
                "Dropping challenge from another day"
            );
            self.delete_current_challenge()?;
            return Ok(None);
        }

        Ok(Some(challenge))
    }

    pub fn set_current_challenge(&self, challenge: &Challenge) -> Result<(), AppError> {
        self.write(keys::CURRENT_CHALLENGE, challenge)
    }

    pub fn delete_current_challenge(&self) -> Result<(), AppError> {
        self.store.remove(keys::CURRENT_CHALLENGE)
    }

    // ─── History ─────────────────────────────────────────────────

    /// Get the history, dropping individual entries that fail to decode or
    /// validate. The rest of the log is kept.
    pub fn get_history(&self) -> Result<History, AppError> {
        let raw: Vec<serde_json::Value> = self.read(keys::HISTORY)?.unwrap_or_default();
        let total = raw.len();
        let valid: Vec<Challenge> = raw
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value::<Challenge>(value) {
                Ok(challenge) if challenge.is_valid() => Some(challenge),
                Ok(challenge) => {
                    tracing::warn!(index, id = %challenge.id, "History entry breaks lifecycle invariants");
                    None
                }
                Err(e) => {
                    tracing::warn!(index, error = %e, "Malformed history entry");
                    None
                }
            })
            .collect();
        if valid.len() != total {
            tracing::warn!(
                dropped = total - valid.len(),
                "Ignoring invalid history entries"
            );
        }
        Ok(History::from_entries(valid))
    }

    pub fn set_history(&self, history: &History) -> Result<(), AppError> {
        self.write(keys::HISTORY, history)
    }

    // ─── Reset ───────────────────────────────────────────────────

    /// Delete all three records.
    ///
    /// Every key is attempted even if an earlier removal fails.
    pub fn clear_all(&self) -> Result<(), AppError> {
        let mut first_error = None;
        for key in keys::ALL {
            if let Err(e) = self.store.remove(key) {
                tracing::error!(key, error = %e, "Failed to remove record");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::info!("Session records cleared");
                Ok(())
            }
        }
    }
}
