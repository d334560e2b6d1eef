//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `TelemetryStore` port from the `core` crate. It handles all interactions
//! with the SQLite database using `sqlx`.
//!
//! Every statement below is fixed text; sqlx prepares it once per connection and
//! reuses it from the connection's statement cache on later calls.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use ear_trainer_core::domain::{
    Attempt, AttemptPrompt, AttemptResponse, NewAttempt, NewRound, Round,
};
use ear_trainer_core::ports::{PortError, PortResult, TelemetryStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::info;

//=========================================================================================
// Schema
//=========================================================================================

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE rounds (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        lesson_type TEXT NOT NULL,
        total_attempts INTEGER NOT NULL,
        correct_count INTEGER NOT NULL,
        started_at REAL NOT NULL,
        completed_at REAL NOT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
    )
    "#,
    r#"
    CREATE TABLE attempts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        round_id INTEGER NOT NULL,
        root_note_midi INTEGER NOT NULL,
        root_note_name TEXT NOT NULL,
        interval_semitones INTEGER NOT NULL,
        expected_note_midi INTEGER NOT NULL,
        expected_note_name TEXT NOT NULL,
        played_note_midi INTEGER,
        played_note_name TEXT,
        correct BOOLEAN NOT NULL,
        prompt_displayed_at REAL NOT NULL,
        root_note_played_at REAL,
        interval_note_played_at REAL,
        attempt_completed_at REAL NOT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
        FOREIGN KEY (round_id) REFERENCES rounds(id)
    )
    "#,
    "CREATE INDEX idx_attempts_round ON attempts(round_id)",
    "CREATE INDEX idx_attempts_interval ON attempts(interval_semitones)",
    "CREATE INDEX idx_attempts_correct ON attempts(correct)",
    "CREATE INDEX idx_attempts_created ON attempts(created_at)",
];

const INSERT_ROUND: &str = r#"
    INSERT INTO rounds (lesson_type, total_attempts, correct_count, started_at, completed_at)
    VALUES (?, ?, ?, ?, ?)
"#;

const INSERT_ATTEMPT: &str = r#"
    INSERT INTO attempts (
        round_id,
        root_note_midi, root_note_name, interval_semitones,
        expected_note_midi, expected_note_name,
        played_note_midi, played_note_name,
        correct,
        prompt_displayed_at, root_note_played_at, interval_note_played_at, attempt_completed_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const SELECT_RECENT_ROUNDS: &str = r#"
    SELECT id, lesson_type, total_attempts, correct_count, started_at, completed_at, created_at
    FROM rounds
    ORDER BY created_at DESC, id DESC
    LIMIT ?
"#;

const SELECT_ROUND: &str = r#"
    SELECT id, lesson_type, total_attempts, correct_count, started_at, completed_at, created_at
    FROM rounds
    WHERE id = ?
"#;

const SELECT_ATTEMPTS_FOR_ROUND: &str = r#"
    SELECT id, round_id, root_note_midi, root_note_name, interval_semitones,
           expected_note_midi, expected_note_name, played_note_midi, played_note_name,
           correct, prompt_displayed_at, root_note_played_at, interval_note_played_at,
           attempt_completed_at, created_at
    FROM attempts
    WHERE round_id = ?
    ORDER BY id ASC
"#;

const COUNT_TABLES: &str = r#"
    SELECT COUNT(*) FROM sqlite_master
    WHERE type = 'table' AND name IN ('rounds', 'attempts')
"#;

//=========================================================================================
// Connection Setup
//=========================================================================================

/// Opens the single process-wide connection to the store.
///
/// The pool is capped at one connection that is never recycled, so an
/// in-memory database (`sqlite::memory:`) lives as long as the pool does.
/// Foreign-key enforcement is switched on for the connection.
pub async fn connect(
    database_url: &str,
    create_if_missing: bool,
) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(create_if_missing)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `TelemetryStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates both tables and their indexes in one transaction.
    ///
    /// This is not idempotent: it fails if the tables already exist.
    pub async fn create_schema(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA.iter().copied() {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        info!("Created rounds and attempts tables");
        Ok(())
    }

    /// Whether both tables have been created.
    pub async fn schema_exists(&self) -> Result<bool, sqlx::Error> {
        let tables: i64 = sqlx::query_scalar(COUNT_TABLES)
            .fetch_one(&self.pool)
            .await?;
        Ok(tables == 2)
    }

    /// Closes the underlying connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct RoundRecord {
    id: i64,
    lesson_type: String,
    total_attempts: i64,
    correct_count: i64,
    started_at: f64,
    completed_at: f64,
    created_at: NaiveDateTime,
}
impl RoundRecord {
    fn to_domain(self) -> Round {
        Round {
            id: self.id,
            lesson_type: self.lesson_type,
            total_attempts: self.total_attempts,
            correct_count: self.correct_count,
            started_at: self.started_at,
            completed_at: self.completed_at,
            created_at: self.created_at.and_utc(),
        }
    }
}

#[derive(FromRow)]
struct AttemptRecord {
    id: i64,
    round_id: i64,
    root_note_midi: i64,
    root_note_name: String,
    interval_semitones: i64,
    expected_note_midi: i64,
    expected_note_name: String,
    played_note_midi: Option<i64>,
    played_note_name: Option<String>,
    correct: bool,
    prompt_displayed_at: f64,
    root_note_played_at: Option<f64>,
    interval_note_played_at: Option<f64>,
    attempt_completed_at: f64,
    created_at: NaiveDateTime,
}
impl AttemptRecord {
    fn to_domain(self) -> Attempt {
        Attempt {
            id: self.id,
            round_id: self.round_id,
            prompt: AttemptPrompt {
                root_note_midi: self.root_note_midi,
                root_note_name: self.root_note_name,
                interval_semitones: self.interval_semitones,
                expected_note_midi: self.expected_note_midi,
                expected_note_name: self.expected_note_name,
            },
            response: AttemptResponse {
                played_note_midi: self.played_note_midi,
                played_note_name: self.played_note_name,
                correct: self.correct,
                prompt_displayed_at: self.prompt_displayed_at,
                root_note_played_at: self.root_note_played_at,
                interval_note_played_at: self.interval_note_played_at,
                attempt_completed_at: self.attempt_completed_at,
            },
            created_at: self.created_at.and_utc(),
        }
    }
}

//=========================================================================================
// `TelemetryStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl TelemetryStore for DbAdapter {
    async fn create_round(&self, round: NewRound) -> PortResult<i64> {
        let result = sqlx::query(INSERT_ROUND)
            .bind(round.lesson_type)
            .bind(round.total_attempts)
            .bind(round.correct_count)
            .bind(round.started_at)
            .bind(round.completed_at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(result.last_insert_rowid())
    }

    async fn get_rounds(&self, limit: u32) -> PortResult<Vec<Round>> {
        let records = sqlx::query_as::<_, RoundRecord>(SELECT_RECENT_ROUNDS)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let rounds = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(rounds)
    }

    async fn get_round(&self, round_id: i64) -> PortResult<Round> {
        let record = sqlx::query_as::<_, RoundRecord>(SELECT_ROUND)
            .bind(round_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Round {} not found", round_id))
                }
                _ => PortError::Unexpected(e.to_string()),
            })?;
        Ok(record.to_domain())
    }

    async fn create_attempt(&self, attempt: NewAttempt) -> PortResult<i64> {
        let round_id = attempt.round_id;
        let prompt = attempt.prompt;
        let response = attempt.response;

        let result = sqlx::query(INSERT_ATTEMPT)
            .bind(round_id)
            .bind(prompt.root_note_midi)
            .bind(prompt.root_note_name)
            .bind(prompt.interval_semitones)
            .bind(prompt.expected_note_midi)
            .bind(prompt.expected_note_name)
            .bind(response.played_note_midi)
            .bind(response.played_note_name)
            .bind(response.correct)
            .bind(response.prompt_displayed_at)
            .bind(response.root_note_played_at)
            .bind(response.interval_note_played_at)
            .bind(response.attempt_completed_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    PortError::InvalidReference(format!("Round {} does not exist", round_id))
                }
                _ => PortError::Unexpected(e.to_string()),
            })?;
        Ok(result.last_insert_rowid())
    }

    async fn get_attempts_for_round(&self, round_id: i64) -> PortResult<Vec<Attempt>> {
        let records = sqlx::query_as::<_, AttemptRecord>(SELECT_ATTEMPTS_FOR_ROUND)
            .bind(round_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let attempts = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(attempts)
    }
}
