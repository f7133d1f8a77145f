// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gemini API client for generating personalized challenges.
//!
//! Handles:
//! - Prompt construction from the profile (identity, age, language)
//! - A single `generateContent` call with a JSON response schema
//! - Parsing and validating the structured reply

use crate::config::Config;
use crate::models::{GeneratedChallenge, Profile};
use crate::services::generator::{
    validate_generated, ChallengeGenerator, GenerationError, DIFFICULTY_LEVELS,
};
use crate::time_utils::{age_on, Clock};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Gemini-backed challenge generator.
#[derive(Clone)]
pub struct GeminiGenerator {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    clock: Arc<dyn Clock>,
}

impl GeminiGenerator {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            clock,
        }
    }

    pub fn from_config(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            config.gemini_base_url.clone(),
            config.gemini_model.clone(),
            config.gemini_api_key.clone(),
            clock,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn send_request(&self, body: &GenerateContentRequest) -> Result<String, GenerationError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(format!("JSON parse error: {}", e)))?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl ChallengeGenerator for GeminiGenerator {
    async fn generate(&self, profile: &Profile) -> Result<GeneratedChallenge, GenerationError> {
        let prompt = build_prompt(profile, age_on(profile.birth_date, self.clock.today()));
        tracing::debug!(
            model = %self.model,
            language = profile.language.label(),
            "Requesting challenge from Gemini"
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            }),
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: challenge_schema(),
            },
        };

        let text = self.send_request(&request).await?;
        parse_challenge(&text)
    }
}

// ─── Prompt ──────────────────────────────────────────────────

const SYSTEM_INSTRUCTION: &str = "You are a kind but demanding personal-growth coach. \
You design one small daily challenge that pushes a person just outside their comfort zone. \
Challenges must be safe, legal, respectful of others, free and doable within a single day.";

/// Build the user prompt for one profile.
pub fn build_prompt(profile: &Profile, age: u32) -> String {
    format!(
        "Create today's challenge for a {age}-year-old person who identifies as \"{identity}\".\n\
         Tailor it to their age and identity without stereotyping them.\n\
         Write every field in {language}.\n\
         Fields:\n\
         - title: a short, punchy name (max 8 words)\n\
         - description: one or two sentences saying exactly what to do today\n\
         - category: a one or two word theme (for example social, body, creativity, mind)\n\
         - difficulty: one of {levels}, where 1 is gentle and 5 is intimidating\n\
         - reasoning: one sentence on why this challenge fits this person",
        age = age,
        identity = profile.identity.label(),
        language = profile.language.label(),
        levels = DIFFICULTY_LEVELS.join(", "),
    )
}

fn challenge_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "description": { "type": "STRING" },
            "category": { "type": "STRING" },
            "difficulty": { "type": "STRING", "enum": DIFFICULTY_LEVELS },
            "reasoning": { "type": "STRING" }
        },
        "required": ["title", "description", "category", "difficulty", "reasoning"]
    })
}

/// Parse the model's JSON reply, tolerating a Markdown code fence around it.
pub fn parse_challenge(text: &str) -> Result<GeneratedChallenge, GenerationError> {
    let raw: GeneratedChallenge = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| GenerationError::Malformed(e.to_string()))?;
    validate_generated(raw)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

// ─── Wire types ──────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, GenerationError> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .filter(|text| !text.trim().is_empty())
        .ok_or(GenerationError::EmptyResponse)
}

fn map_http_error(status: u16, body: &str) -> GenerationError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            match wrapper.error.status {
                Some(status_text) if !status_text.is_empty() => {
                    format!("{}: {}", status_text, msg)
                }
                _ => msg,
            }
        })
        .unwrap_or_else(|_| body.to_string());

    if status == 429 {
        tracing::warn!("Gemini rate limit hit (429)");
    }

    GenerationError::Http { status, message }
}
