//! crates/ear_trainer_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};

/// A stored practice session summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub id: i64,
    pub lesson_type: String,
    pub total_attempts: i64,
    pub correct_count: i64,
    /// Unix timestamp in fractional seconds.
    pub started_at: f64,
    pub completed_at: f64,
    pub created_at: DateTime<Utc>,
}

/// The caller-supplied part of a round, as accepted by the validation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRound {
    pub lesson_type: String,
    pub total_attempts: i64,
    pub correct_count: i64,
    pub started_at: f64,
    pub completed_at: f64,
}

/// A stored interval-recognition prompt and the user's response.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub id: i64,
    pub round_id: i64,
    pub prompt: AttemptPrompt,
    pub response: AttemptResponse,
    pub created_at: DateTime<Utc>,
}

/// What the user was asked to play.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptPrompt {
    pub root_note_midi: i64,
    pub root_note_name: String,
    /// Positive is ascending, negative is descending.
    pub interval_semitones: i64,
    pub expected_note_midi: i64,
    pub expected_note_name: String,
}

/// What the user actually played, and when.
///
/// `played_note_midi` is `None` for abandoned or timed-out attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptResponse {
    pub played_note_midi: Option<i64>,
    pub played_note_name: Option<String>,
    pub correct: bool,
    pub prompt_displayed_at: f64,
    pub root_note_played_at: Option<f64>,
    pub interval_note_played_at: Option<f64>,
    pub attempt_completed_at: f64,
}

/// The caller-supplied part of an attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttempt {
    pub round_id: i64,
    pub prompt: AttemptPrompt,
    pub response: AttemptResponse,
}

impl AttemptResponse {
    /// True when no destination note was ever played.
    pub fn is_abandoned(&self) -> bool {
        self.played_note_midi.is_none()
    }
}
