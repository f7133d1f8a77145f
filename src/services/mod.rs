// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod gemini;
pub mod generator;
pub mod session;
pub mod share;

pub use gemini::GeminiGenerator;
pub use generator::{ChallengeGenerator, GenerationError};
pub use session::{SessionService, SessionSnapshot};
pub use share::SharePayload;
