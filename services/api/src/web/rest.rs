//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{ApiError, ErrorResponse};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use ear_trainer_core::{
    validate_attempt, validate_round, Attempt, Round, DEFAULT_ROUNDS_LIMIT,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_rounds_handler,
        create_round_handler,
        get_round_handler,
        list_attempts_handler,
        create_attempt_handler,
    ),
    components(
        schemas(
            RoundPayload,
            AttemptPayload,
            CreatedResponse,
            RoundResponse,
            AttemptResponse,
            ErrorResponse
        )
    ),
    tags(
        (
            name = "Ear Trainer API",
            description = "Practice-session telemetry for interval training."
        )
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The create-round payload. Handlers validate the raw JSON; this type only
/// documents the accepted shape.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct RoundPayload {
    #[schema(example = "intervals_ascending")]
    lesson_type: String,
    total_attempts: i64,
    correct_count: i64,
    /// Unix timestamp in fractional seconds.
    started_at: f64,
    completed_at: f64,
}

/// The create-attempt payload. Only the `Option` fields may be omitted.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct AttemptPayload {
    round_id: i64,
    root_note_midi: i64,
    #[schema(example = "C4")]
    root_note_name: String,
    /// Positive is ascending, negative is descending.
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
}

/// The response payload sent after a successful insert.
#[derive(Serialize, ToSchema)]
pub struct CreatedResponse {
    pub id: i64,
}

#[derive(Serialize, ToSchema)]
pub struct RoundResponse {
    pub id: i64,
    pub lesson_type: String,
    pub total_attempts: i64,
    pub correct_count: i64,
    pub started_at: f64,
    pub completed_at: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Round> for RoundResponse {
    fn from(round: Round) -> Self {
        Self {
            id: round.id,
            lesson_type: round.lesson_type,
            total_attempts: round.total_attempts,
            correct_count: round.correct_count,
            started_at: round.started_at,
            completed_at: round.completed_at,
            created_at: round.created_at,
        }
    }
}

/// A stored attempt, flattened back into the shape it was submitted in.
#[derive(Serialize, ToSchema)]
pub struct AttemptResponse {
    pub id: i64,
    pub round_id: i64,
    pub root_note_midi: i64,
    pub root_note_name: String,
    pub interval_semitones: i64,
    pub expected_note_midi: i64,
    pub expected_note_name: String,
    pub played_note_midi: Option<i64>,
    pub played_note_name: Option<String>,
    pub correct: bool,
    pub prompt_displayed_at: f64,
    pub root_note_played_at: Option<f64>,
    pub interval_note_played_at: Option<f64>,
    pub attempt_completed_at: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Attempt> for AttemptResponse {
    fn from(attempt: Attempt) -> Self {
        let prompt = attempt.prompt;
        let response = attempt.response;
        Self {
            id: attempt.id,
            round_id: attempt.round_id,
            root_note_midi: prompt.root_note_midi,
            root_note_name: prompt.root_note_name,
            interval_semitones: prompt.interval_semitones,
            expected_note_midi: prompt.expected_note_midi,
            expected_note_name: prompt.expected_note_name,
            played_note_midi: response.played_note_midi,
            played_note_name: response.played_note_name,
            correct: response.correct,
            prompt_displayed_at: response.prompt_displayed_at,
            root_note_played_at: response.root_note_played_at,
            interval_note_played_at: response.interval_note_played_at,
            attempt_completed_at: response.attempt_completed_at,
            created_at: attempt.created_at,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoundsQuery {
    /// Maximum number of rounds to return. Falls back to 10 when absent or not
    /// a non-negative integer.
    #[param(value_type = Option<u32>)]
    limit: Option<String>,
}

/// Resolves the `limit` query parameter, falling back to the default.
pub fn parse_limit(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_ROUNDS_LIMIT)
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the most recently created rounds, newest first.
#[utoipa::path(
    get,
    path = "/api/rounds",
    params(RoundsQuery),
    responses(
        (status = 200, description = "Recent rounds", body = Vec<RoundResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_rounds_handler(
    State(app_state): State<Arc<AppState>>,
    query: Result<Query<RoundsQuery>, QueryRejection>,
) -> Result<Json<Vec<RoundResponse>>, ApiError> {
    let raw_limit = query.ok().and_then(|Query(params)| params.limit);
    let limit = parse_limit(raw_limit.as_deref());

    let rounds = app_state.db.get_rounds(limit).await?;
    Ok(Json(rounds.into_iter().map(RoundResponse::from).collect()))
}

/// Record a finished practice round.
#[utoipa::path(
    post,
    path = "/api/rounds",
    request_body = RoundPayload,
    responses(
        (status = 200, description = "Round stored", body = CreatedResponse),
        (status = 400, description = "Invalid request format", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_round_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let round = validate_round(&payload, app_state.config.validation_mode)?;

    let id = app_state.db.create_round(round).await?;
    info!(round_id = id, "Stored round");
    Ok(Json(CreatedResponse { id }))
}

/// Fetch a single round.
#[utoipa::path(
    get,
    path = "/api/rounds/{id}",
    params(("id" = i64, Path, description = "The round id.")),
    responses(
        (status = 200, description = "The round", body = RoundResponse),
        (status = 404, description = "Round not found", body = ErrorResponse)
    )
)]
pub async fn get_round_handler(
    State(app_state): State<Arc<AppState>>,
    Path(round_id): Path<i64>,
) -> Result<Json<RoundResponse>, ApiError> {
    let round = app_state.db.get_round(round_id).await?;
    Ok(Json(round.into()))
}

/// List every attempt recorded for a round, in submission order.
#[utoipa::path(
    get,
    path = "/api/rounds/{id}/attempts",
    params(("id" = i64, Path, description = "The round id.")),
    responses(
        (status = 200, description = "Attempts of the round", body = Vec<AttemptResponse>),
        (status = 404, description = "Round not found", body = ErrorResponse)
    )
)]
pub async fn list_attempts_handler(
    State(app_state): State<Arc<AppState>>,
    Path(round_id): Path<i64>,
) -> Result<Json<Vec<AttemptResponse>>, ApiError> {
    // 404 for unknown rounds rather than an empty list.
    app_state.db.get_round(round_id).await?;

    let attempts = app_state.db.get_attempts_for_round(round_id).await?;
    Ok(Json(attempts.into_iter().map(AttemptResponse::from).collect()))
}

/// Record one interval prompt and the user's response.
#[utoipa::path(
    post,
    path = "/api/attempts",
    request_body = AttemptPayload,
    responses(
        (status = 200, description = "Attempt stored", body = CreatedResponse),
        (
            status = 400,
            description = "Invalid request format or unknown round",
            body = ErrorResponse
        ),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn create_attempt_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let attempt = validate_attempt(&payload, app_state.config.validation_mode)?;
    let round_id = attempt.round_id;

    let id = app_state.db.create_attempt(attempt).await?;
    info!(attempt_id = id, round_id, "Stored attempt");
    Ok(Json(CreatedResponse { id }))
}
