// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Boundary to the external challenge generator.

use async_trait::async_trait;

use crate::models::{GeneratedChallenge, Profile};

/// Produces a new challenge tailored to a profile.
///
/// One call is one best-effort attempt: implementations do not retry.
#[async_trait]
pub trait ChallengeGenerator: Send + Sync {
    async fn generate(&self, profile: &Profile) -> Result<GeneratedChallenge, GenerationError>;
}

/// Reasons a generation attempt produced no usable challenge.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("response had no text")]
    EmptyResponse,

    #[error("malformed challenge: {0}")]
    Malformed(String),
}

/// Allowed `difficulty` values.
pub const DIFFICULTY_LEVELS: [&str; 5] = ["1", "2", "3", "4", "5"];

const MAX_CATEGORY_CHARS: usize = 40;

/// Trim every field and check it against the expected vocabulary.
pub fn validate_generated(raw: GeneratedChallenge) -> Result<GeneratedChallenge, GenerationError> {
    let challenge = GeneratedChallenge {
        title: raw.title.trim().to_string(),
        description: raw.description.trim().to_string(),
        category: raw.category.trim().to_string(),
        difficulty: raw.difficulty.trim().to_string(),
        reasoning: raw.reasoning.trim().to_string(),
    };

    for (field, value) in [
        ("title", &challenge.title),
        ("description", &challenge.description),
        ("category", &challenge.category),
        ("reasoning", &challenge.reasoning),
    ] {
        if value.is_empty() {
            return Err(GenerationError::Malformed(format!("empty {}", field)));
        }
    }

    if challenge.category.chars().count() > MAX_CATEGORY_CHARS {
        return Err(GenerationError::Malformed(format!(
            "category longer than {} characters",
            MAX_CATEGORY_CHARS
        )));
    }

    if !DIFFICULTY_LEVELS.contains(&challenge.difficulty.as_str()) {
        return Err(GenerationError::Malformed(format!(
            "difficulty {:?} not in 1-5",
            challenge.difficulty
        )));
    }

    Ok(challenge)
}
