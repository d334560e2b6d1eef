//! crates/ear_trainer_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete storage engine.

use async_trait::async_trait;
use crate::domain::{Attempt, NewAttempt, NewRound, Round};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the storage engine.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A write referenced a row that does not exist (e.g. an unknown round).
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Number of rounds returned by `get_rounds` when the caller gives no limit.
pub const DEFAULT_ROUNDS_LIMIT: u32 = 10;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait TelemetryStore: Send + Sync {
    // --- Rounds ---
    /// Inserts a round and returns its generated id.
    async fn create_round(&self, round: NewRound) -> PortResult<i64>;

    /// Returns up to `limit` rounds, most recently created first.
    async fn get_rounds(&self, limit: u32) -> PortResult<Vec<Round>>;

    async fn get_round(&self, round_id: i64) -> PortResult<Round>;

    // --- Attempts ---
    /// Inserts an attempt and returns its generated id.
    ///
    /// Fails with `PortError::InvalidReference` when `round_id` names no round.
    async fn create_attempt(&self, attempt: NewAttempt) -> PortResult<i64>;

    async fn get_attempts_for_round(&self, round_id: i64) -> PortResult<Vec<Attempt>>;
}
