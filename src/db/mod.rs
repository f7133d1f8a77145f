//! Database layer (device-local key-value records).

pub mod session;
pub mod store;

pub use session::SessionDb;
pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Record keys as constants.
pub mod keys {
    /// Onboarding profile
    pub const PROFILE: &str = "challenge_user";
    /// Today's challenge
    pub const CURRENT_CHALLENGE: &str = "current_challenge";
    /// Completed challenges, most recent first
    pub const HISTORY: &str = "challenge_history";

    pub const ALL: [&str; 3] = [PROFILE, CURRENT_CHALLENGE, HISTORY];
}
