//! Player profile: identifier and question-count preference.

use crate::storage::KeyValueStore;
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;

pub const PLAYER_CODE_KEY: &str = "player_code";
pub const QUESTION_COUNT_KEY: &str = "question_count";

/// Shown in place of a missing player code
pub const GUEST_CODE: &str = "GUEST";

/// Question counts a session may use
pub const ALLOWED_QUESTION_COUNTS: [u32; 5] = [10, 20, 30, 50, 100];
pub const DEFAULT_QUESTION_COUNT: u32 = 10;
const MIN_QUESTION_COUNT: u32 = 10;
const MAX_QUESTION_COUNT: u32 = 100;

static PLAYER_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z0-9-]{3,24}$").expect("player code pattern is valid")
});

/// Trim and upper-case a candidate code; `None` if it is still invalid
pub fn normalize_player_code(raw: &str) -> Option<String> {
    let cleaned = raw.trim().to_uppercase();
    PLAYER_CODE.is_match(&cleaned).then_some(cleaned)
}

/// Clamp to `[10, 100]`, then snap to the nearest allowed count
///
/// Ties go to the smaller count (15 snaps to 10, 40 to 30).
pub fn snap_question_count(requested: u32) -> u32 {
    let clamped = requested.clamp(MIN_QUESTION_COUNT, MAX_QUESTION_COUNT);
    let mut closest = ALLOWED_QUESTION_COUNTS[0];
    for candidate in ALLOWED_QUESTION_COUNTS {
        if candidate.abs_diff(clamped) < closest.abs_diff(clamped) {
            closest = candidate;
        }
    }
    closest
}

/// Player preferences backed by a key-value store
pub struct Profile<S> {
    store: S,
}

impl<S: KeyValueStore> Profile<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Stored player code, if one was set
    pub fn player_code(&self) -> Option<String> {
        self.store.get(PLAYER_CODE_KEY).filter(|c| !c.is_empty())
    }

    /// Player code for display and export, `GUEST` when unset
    pub fn display_code(&self) -> String {
        self.player_code().unwrap_or_else(|| GUEST_CODE.to_string())
    }

    /// Store a player code
    ///
    /// Returns `Ok(false)` without touching the store when the code does not
    /// match `^[A-Z0-9-]{3,24}$` after trimming and upper-casing.
    pub fn set_player_code(&mut self, raw: &str) -> Result<bool> {
        match normalize_player_code(raw) {
            Some(code) => {
                self.store.set(PLAYER_CODE_KEY, &code)?;
                tracing::info!("Player code set to {}", code);
                Ok(true)
            }
            None => {
                tracing::debug!("Rejected player code '{}'", raw);
                Ok(false)
            }
        }
    }

    /// Stored question count
    ///
    /// Anything missing, unparsable or outside `[10, 100]` reads as 10.
    pub fn question_count(&self) -> u32 {
        self.store
            .get(QUESTION_COUNT_KEY)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|n| (MIN_QUESTION_COUNT..=MAX_QUESTION_COUNT).contains(n))
            .unwrap_or(DEFAULT_QUESTION_COUNT)
    }

    /// Snap and store a question count; returns the stored value
    pub fn set_question_count(&mut self, requested: u32) -> Result<u32> {
        let snapped = snap_question_count(requested);
        self.store.set(QUESTION_COUNT_KEY, &snapped.to_string())?;
        tracing::info!("Question count set to {} (requested {})", snapped, requested);
        Ok(snapped)
    }
}
