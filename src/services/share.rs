//! Share payload for a challenge.

use crate::models::{Challenge, Language};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Text handed to the platform share sheet (or copied to the clipboard).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
}

pub fn share_payload(challenge: &Challenge, language: Language) -> SharePayload {
    let app_name = language.app_name();
    let hashtag: String = app_name.split_whitespace().collect();
    SharePayload {
        title: app_name.to_string(),
        text: format!(
            "{} - Mon défi : \"{}\"\n\n\"{}\"\n\n#{}",
            app_name, challenge.title, challenge.description, hashtag
        ),
    }
}
