//! crates/ear_trainer_core/src/validation.rs
//!
//! Shape and type checks for incoming round and attempt payloads.
//!
//! Validation is pure: it takes a parsed JSON value and either produces the
//! domain struct to hand to the store, or a `ValidationError` listing every
//! field that failed. A JSON `null` is treated exactly like a missing field.
//! Note names and the `correct` flag are derived by the client and stored as
//! given; strict mode cross-checks the numeric fields only.

use std::fmt;

use serde_json::{Map, Value};

use crate::domain::{AttemptPrompt, AttemptResponse, NewAttempt, NewRound};

/// Highest valid MIDI note number.
pub const MIDI_NOTE_MAX: i64 = 127;

/// How much checking to do beyond field presence and types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Presence and type checks only.
    #[default]
    Lenient,
    /// Also enforce cross-field invariants (counts, time ordering, MIDI math).
    Strict,
}

/// The JSON type a field was expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    String,
    Integer,
    Number,
    Boolean,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Expected::String => "a string",
            Expected::Integer => "an integer",
            Expected::Number => "a number",
            Expected::Boolean => "a boolean",
        };
        f.write_str(name)
    }
}

/// One reason a payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldProblem {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("`{0}` is required")]
    Missing(&'static str),
    #[error("`{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: Expected,
    },
    #[error("`{field}` {reason}")]
    Inconsistent {
        field: &'static str,
        reason: String,
    },
}

impl FieldProblem {
    /// The offending field, if the problem is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            FieldProblem::NotAnObject => None,
            FieldProblem::Missing(field)
            | FieldProblem::WrongType { field, .. }
            | FieldProblem::Inconsistent { field, .. } => Some(field),
        }
    }

    fn inconsistent(field: &'static str, reason: impl Into<String>) -> Self {
        FieldProblem::Inconsistent {
            field,
            reason: reason.into(),
        }
    }
}

/// A rejected payload, with every problem that was found.
///
/// Callers outside the service only ever see a generic message; the list is
/// kept for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid payload: {}", join_problems(.problems))]
pub struct ValidationError {
    pub problems: Vec<FieldProblem>,
}

impl ValidationError {
    fn single(problem: FieldProblem) -> Self {
        Self {
            problems: vec![problem],
        }
    }

    /// Names of the fields that failed, in the order they were checked.
    pub fn fields(&self) -> Vec<&'static str> {
        self.problems.iter().filter_map(FieldProblem::field).collect()
    }
}

fn join_problems(problems: &[FieldProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

//=========================================================================================
// Field Extraction
//=========================================================================================

/// Pulls typed fields out of a JSON object, recording problems as it goes.
struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    problems: Vec<FieldProblem>,
}

impl<'a> FieldReader<'a> {
    fn new(payload: &'a Value) -> Result<Self, ValidationError> {
        let object = payload
            .as_object()
            .ok_or_else(|| ValidationError::single(FieldProblem::NotAnObject))?;
        Ok(Self {
            object,
            problems: Vec::new(),
        })
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        self.object.get(field).filter(|value| !value.is_null())
    }

    fn required<T>(
        &mut self,
        field: &'static str,
        expected: Expected,
        extract: fn(&Value) -> Option<T>,
    ) -> Option<T> {
        let Some(value) = self.present(field) else {
            self.problems.push(FieldProblem::Missing(field));
            return None;
        };
        self.typed(field, expected, value, extract)
    }

    fn optional<T>(
        &mut self,
        field: &'static str,
        expected: Expected,
        extract: fn(&Value) -> Option<T>,
    ) -> Option<T> {
        let value = self.present(field)?;
        self.typed(field, expected, value, extract)
    }

    fn typed<T>(
        &mut self,
        field: &'static str,
        expected: Expected,
        value: &Value,
        extract: fn(&Value) -> Option<T>,
    ) -> Option<T> {
        let parsed = extract(value);
        if parsed.is_none() {
            self.problems.push(FieldProblem::WrongType { field, expected });
        }
        parsed
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                problems: self.problems,
            })
        }
    }

    fn into_error(self) -> ValidationError {
        ValidationError {
            problems: self.problems,
        }
    }
}

fn as_string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_owned)
}

/// Any JSON number without a fractional part that fits in an `i64`.
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(int) = value.as_i64() {
        return Some(int);
    }
    let float = value.as_f64()?;
    let in_range = float >= i64::MIN as f64 && float < i64::MAX as f64;
    (float.fract() == 0.0 && in_range).then_some(float as i64)
}

fn as_number(value: &Value) -> Option<f64> {
    value.as_f64()
}

fn as_boolean(value: &Value) -> Option<bool> {
    value.as_bool()
}

//=========================================================================================
// Rounds
//=========================================================================================

/// Validates a create-round payload.
pub fn validate_round(payload: &Value, mode: ValidationMode) -> Result<NewRound, ValidationError> {
    let mut reader = FieldReader::new(payload)?;

    let lesson_type = reader.required("lesson_type", Expected::String, as_string);
    let total_attempts = reader.required("total_attempts", Expected::Integer, as_integer);
    let correct_count = reader.required("correct_count", Expected::Integer, as_integer);
    let started_at = reader.required("started_at", Expected::Number, as_number);
    let completed_at = reader.required("completed_at", Expected::Number, as_number);

    let (
        Some(lesson_type),
        Some(total_attempts),
        Some(correct_count),
        Some(started_at),
        Some(completed_at),
    ) = (lesson_type, total_attempts, correct_count, started_at, completed_at)
    else {
        return Err(reader.into_error());
    };
    reader.finish()?;

    let round = NewRound {
        lesson_type,
        total_attempts,
        correct_count,
        started_at,
        completed_at,
    };

    if mode == ValidationMode::Strict {
        reject_if_any(round_consistency(&round))?;
    }
    Ok(round)
}

fn round_consistency(round: &NewRound) -> Vec<FieldProblem> {
    let mut problems = Vec::new();

    if round.lesson_type.trim().is_empty() {
        problems.push(FieldProblem::inconsistent("lesson_type", "must not be empty"));
    }
    if round.total_attempts < 0 {
        problems.push(FieldProblem::inconsistent("total_attempts", "must not be negative"));
    }
    if round.correct_count < 0 {
        problems.push(FieldProblem::inconsistent("correct_count", "must not be negative"));
    } else if round.correct_count > round.total_attempts {
        problems.push(FieldProblem::inconsistent(
            "correct_count",
            "must not exceed total_attempts",
        ));
    }
    if round.completed_at < round.started_at {
        problems.push(FieldProblem::inconsistent(
            "completed_at",
            "must not precede started_at",
        ));
    }

    problems
}

//=========================================================================================
// Attempts
//=========================================================================================

/// Validates a create-attempt payload.
pub fn validate_attempt(
    payload: &Value,
    mode: ValidationMode,
) -> Result<NewAttempt, ValidationError> {
    let mut reader = FieldReader::new(payload)?;

    let round_id = reader.required("round_id", Expected::Integer, as_integer);

    let root_note_midi = reader.required("root_note_midi", Expected::Integer, as_integer);
    let root_note_name = reader.required("root_note_name", Expected::String, as_string);
    let interval_semitones = reader.required("interval_semitones", Expected::Integer, as_integer);
    let expected_note_midi = reader.required("expected_note_midi", Expected::Integer, as_integer);
    let expected_note_name = reader.required("expected_note_name", Expected::String, as_string);

    let played_note_midi = reader.optional("played_note_midi", Expected::Integer, as_integer);
    let played_note_name = reader.optional("played_note_name", Expected::String, as_string);

    let correct = reader.required("correct", Expected::Boolean, as_boolean);

    let prompt_displayed_at = reader.required("prompt_displayed_at", Expected::Number, as_number);
    let attempt_completed_at = reader.required("attempt_completed_at", Expected::Number, as_number);
    let root_note_played_at = reader.optional("root_note_played_at", Expected::Number, as_number);
    let interval_note_played_at =
        reader.optional("interval_note_played_at", Expected::Number, as_number);

    let (
        Some(round_id),
        Some(root_note_midi),
        Some(root_note_name),
        Some(interval_semitones),
        Some(expected_note_midi),
        Some(expected_note_name),
        Some(correct),
        Some(prompt_displayed_at),
        Some(attempt_completed_at),
    ) = (
        round_id,
        root_note_midi,
        root_note_name,
        interval_semitones,
        expected_note_midi,
        expected_note_name,
        correct,
        prompt_displayed_at,
        attempt_completed_at,
    )
    else {
        return Err(reader.into_error());
    };
    // Optional fields may still have failed their type check.
    reader.finish()?;

    let attempt = NewAttempt {
        round_id,
        prompt: AttemptPrompt {
            root_note_midi,
            root_note_name,
            interval_semitones,
            expected_note_midi,
            expected_note_name,
        },
        response: AttemptResponse {
            played_note_midi,
            played_note_name,
            correct,
            prompt_displayed_at,
            root_note_played_at,
            interval_note_played_at,
            attempt_completed_at,
        },
    };

    if mode == ValidationMode::Strict {
        reject_if_any(attempt_consistency(&attempt))?;
    }
    Ok(attempt)
}

fn attempt_consistency(attempt: &NewAttempt) -> Vec<FieldProblem> {
    let mut problems = Vec::new();
    let prompt = &attempt.prompt;
    let response = &attempt.response;

    let midi_fields = [
        ("root_note_midi", Some(prompt.root_note_midi)),
        ("expected_note_midi", Some(prompt.expected_note_midi)),
        ("played_note_midi", response.played_note_midi),
    ];
    for (field, note) in midi_fields {
        if let Some(note) = note {
            if !(0..=MIDI_NOTE_MAX).contains(&note) {
                problems.push(FieldProblem::inconsistent(field, "is not a MIDI note number"));
            }
        }
    }

    let computed = prompt.root_note_midi.checked_add(prompt.interval_semitones);
    if computed != Some(prompt.expected_note_midi) {
        problems.push(FieldProblem::inconsistent(
            "expected_note_midi",
            "does not equal root_note_midi + interval_semitones",
        ));
    }

    if response.is_abandoned() && response.played_note_name.is_some() {
        problems.push(FieldProblem::inconsistent(
            "played_note_name",
            "given without played_note_midi",
        ));
    }

    if response.correct {
        match response.played_note_midi {
            None => problems.push(FieldProblem::inconsistent(
                "correct",
                "is true but no note was played",
            )),
            Some(played) if played != prompt.expected_note_midi => {
                problems.push(FieldProblem::inconsistent(
                    "correct",
                    "is true but the played note differs from the expected note",
                ))
            }
            Some(_) => {}
        }
    }

    if response.attempt_completed_at < response.prompt_displayed_at {
        problems.push(FieldProblem::inconsistent(
            "attempt_completed_at",
            "must not precede prompt_displayed_at",
        ));
    }

    problems
}

fn reject_if_any(problems: Vec<FieldProblem>) -> Result<(), ValidationError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { problems })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn round_payload() -> Value {
        json!({
            "lesson_type": "intervals_ascending",
            "total_attempts": 10,
            "correct_count": 7,
            "started_at": 1700000000.0,
            "completed_at": 1700000120.5
        })
    }

    fn attempt_payload() -> Value {
        json!({
            "round_id": 1,
            "root_note_midi": 60,
            "root_note_name": "C4",
            "interval_semitones": 4,
            "expected_note_midi": 64,
            "expected_note_name": "E4",
            "played_note_midi": 64,
            "played_note_name": "E4",
            "correct": true,
            "prompt_displayed_at": 1700000000.0,
            "root_note_played_at": 1700000000.8,
            "interval_note_played_at": 1700000001.6,
            "attempt_completed_at": 1700000002.0
        })
    }

    fn without(mut payload: Value, field: &str) -> Value {
        payload.as_object_mut().unwrap().remove(field);
        payload
    }

    fn with(mut payload: Value, field: &str, value: Value) -> Value {
        payload.as_object_mut().unwrap().insert(field.to_string(), value);
        payload
    }

    #[test]
    fn accepts_valid_round() {
        let round = validate_round(&round_payload(), ValidationMode::Lenient).unwrap();
        assert_eq!(round.lesson_type, "intervals_ascending");
        assert_eq!(round.total_attempts, 10);
        assert_eq!(round.correct_count, 7);
        assert_eq!(round.started_at, 1700000000.0);
        assert_eq!(round.completed_at, 1700000120.5);
    }

    #[test]
    fn rejects_round_missing_any_required_field() {
        for field in [
            "lesson_type",
            "total_attempts",
            "correct_count",
            "started_at",
            "completed_at",
        ] {
            let err = validate_round(&without(round_payload(), field), ValidationMode::Lenient)
                .unwrap_err();
            assert_eq!(err.problems, vec![FieldProblem::Missing(field)], "field {field}");
        }
    }

    #[test]
    fn null_counts_as_missing() {
        let payload = with(round_payload(), "started_at", Value::Null);
        let err = validate_round(&payload, ValidationMode::Lenient).unwrap_err();
        assert_eq!(err.problems, vec![FieldProblem::Missing("started_at")]);
    }

    #[test]
    fn rejects_wrong_types_and_reports_each() {
        let payload = with(
            with(round_payload(), "lesson_type", json!(42)),
            "total_attempts",
            json!("10"),
        );
        let err = validate_round(&payload, ValidationMode::Lenient).unwrap_err();
        assert_eq!(
            err.problems,
            vec![
                FieldProblem::WrongType {
                    field: "lesson_type",
                    expected: Expected::String
                },
                FieldProblem::WrongType {
                    field: "total_attempts",
                    expected: Expected::Integer
                },
            ]
        );
    }

    #[test]
    fn integer_fields_accept_whole_floats_only() {
        let whole = with(round_payload(), "total_attempts", json!(10.0));
        assert_eq!(
            validate_round(&whole, ValidationMode::Lenient).unwrap().total_attempts,
            10
        );

        let fractional = with(round_payload(), "total_attempts", json!(10.5));
        let err = validate_round(&fractional, ValidationMode::Lenient).unwrap_err();
        assert_eq!(err.fields(), vec!["total_attempts"]);
    }

    #[test]
    fn rejects_non_object_payload() {
        let err = validate_round(&json!([1, 2, 3]), ValidationMode::Lenient).unwrap_err();
        assert_eq!(err.problems, vec![FieldProblem::NotAnObject]);
    }

    #[test]
    fn lenient_mode_keeps_inconsistent_rounds() {
        let payload = with(
            with(round_payload(), "correct_count", json!(12)),
            "completed_at",
            json!(1600000000.0),
        );
        assert!(validate_round(&payload, ValidationMode::Lenient).is_ok());
    }

    #[test]
    fn strict_mode_rejects_inconsistent_rounds() {
        let payload = with(
            with(round_payload(), "correct_count", json!(12)),
            "completed_at",
            json!(1600000000.0),
        );
        let err = validate_round(&payload, ValidationMode::Strict).unwrap_err();
        assert_eq!(err.fields(), vec!["correct_count", "completed_at"]);

        let empty_tag = with(round_payload(), "lesson_type", json!("  "));
        let err = validate_round(&empty_tag, ValidationMode::Strict).unwrap_err();
        assert_eq!(err.fields(), vec!["lesson_type"]);
    }

    #[test]
    fn accepts_valid_attempt() {
        let attempt = validate_attempt(&attempt_payload(), ValidationMode::Strict).unwrap();
        assert_eq!(attempt.round_id, 1);
        assert_eq!(attempt.prompt.root_note_name, "C4");
        assert_eq!(attempt.prompt.interval_semitones, 4);
        assert_eq!(attempt.response.played_note_midi, Some(64));
        assert!(attempt.response.correct);
        assert_eq!(attempt.response.interval_note_played_at, Some(1700000001.6));
    }

    #[test]
    fn optional_attempt_fields_may_be_omitted_or_null() {
        let payload = with(
            without(
                without(
                    without(attempt_payload(), "played_note_midi"),
                    "played_note_name",
                ),
                "root_note_played_at",
            ),
            "interval_note_played_at",
            Value::Null,
        );
        let payload = with(payload, "correct", json!(false));

        let attempt = validate_attempt(&payload, ValidationMode::Strict).unwrap();
        assert!(attempt.response.is_abandoned());
        assert_eq!(attempt.response.played_note_name, None);
        assert_eq!(attempt.response.root_note_played_at, None);
        assert_eq!(attempt.response.interval_note_played_at, None);
    }

    #[test]
    fn rejects_attempt_missing_correct() {
        let payload = json!({
            "round_id": 1,
            "root_note_midi": 60,
            "root_note_name": "C4",
            "interval_semitones": 4,
            "expected_note_midi": 64,
            "expected_note_name": "E4",
            "prompt_displayed_at": 1700000000.0,
            "attempt_completed_at": 1700000002.0
        });
        let err = validate_attempt(&payload, ValidationMode::Lenient).unwrap_err();
        assert_eq!(err.problems, vec![FieldProblem::Missing("correct")]);
    }

    #[test]
    fn rejects_wrong_typed_optional_field() {
        let payload = with(attempt_payload(), "root_note_played_at", json!("soon"));
        let err = validate_attempt(&payload, ValidationMode::Lenient).unwrap_err();
        assert_eq!(
            err.problems,
            vec![FieldProblem::WrongType {
                field: "root_note_played_at",
                expected: Expected::Number
            }]
        );
    }

    #[test]
    fn correct_must_be_a_boolean() {
        let payload = with(attempt_payload(), "correct", json!(1));
        let err = validate_attempt(&payload, ValidationMode::Lenient).unwrap_err();
        assert_eq!(err.fields(), vec!["correct"]);
    }

    #[test]
    fn strict_mode_checks_interval_math_and_outcome() {
        let wrong_expected = with(attempt_payload(), "expected_note_midi", json!(65));
        let wrong_expected = with(wrong_expected, "played_note_midi", json!(65));
        let err = validate_attempt(&wrong_expected, ValidationMode::Strict).unwrap_err();
        assert_eq!(err.fields(), vec!["expected_note_midi"]);

        let abandoned_but_correct = without(
            without(attempt_payload(), "played_note_midi"),
            "played_note_name",
        );
        let err = validate_attempt(&abandoned_but_correct, ValidationMode::Strict).unwrap_err();
        assert_eq!(err.fields(), vec!["correct"]);

        let wrong_note_but_correct = with(attempt_payload(), "played_note_midi", json!(63));
        let err = validate_attempt(&wrong_note_but_correct, ValidationMode::Strict).unwrap_err();
        assert_eq!(err.fields(), vec!["correct"]);
        assert!(validate_attempt(&wrong_note_but_correct, ValidationMode::Lenient).is_ok());
    }

    #[test]
    fn strict_mode_checks_midi_range_and_timeline() {
        let payload = with(
            with(
                with(attempt_payload(), "root_note_midi", json!(130)),
                "expected_note_midi",
                json!(134),
            ),
            "played_note_midi",
            json!(134),
        );
        let payload = with(payload, "attempt_completed_at", json!(1699999999.0));
        let err = validate_attempt(&payload, ValidationMode::Strict).unwrap_err();
        assert_eq!(
            err.fields(),
            vec![
                "root_note_midi",
                "expected_note_midi",
                "played_note_midi",
                "attempt_completed_at"
            ]
        );
    }

    #[test]
    fn strict_mode_rejects_note_name_without_midi() {
        let payload = with(
            without(attempt_payload(), "played_note_midi"),
            "correct",
            json!(false),
        );
        let err = validate_attempt(&payload, ValidationMode::Strict).unwrap_err();
        assert_eq!(err.fields(), vec!["played_note_name"]);
        assert!(validate_attempt(&payload, ValidationMode::Lenient).is_ok());
    }

    #[test]
    fn descending_intervals_are_valid() {
        let payload = with(
            with(
                with(attempt_payload(), "interval_semitones", json!(-3)),
                "expected_note_midi",
                json!(57),
            ),
            "played_note_midi",
            json!(57),
        );
        let attempt = validate_attempt(&payload, ValidationMode::Strict).unwrap();
        assert_eq!(attempt.prompt.interval_semitones, -3);
    }

    #[test]
    fn error_display_joins_every_problem() {
        let payload = with(without(round_payload(), "lesson_type"), "started_at", json!(true));
        let err = validate_round(&payload, ValidationMode::Lenient).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid payload: `lesson_type` is required; `started_at` must be a number"
        );
    }

    #[test]
    fn error_display_lists_problems() {
        let err = validate_round(&without(round_payload(), "lesson_type"), ValidationMode::Lenient)
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid payload: `lesson_type` is required");
    }
}
