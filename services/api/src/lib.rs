//! services/api/src/lib.rs
//!
//! HTTP service that records ear-training rounds and attempts in SQLite.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
