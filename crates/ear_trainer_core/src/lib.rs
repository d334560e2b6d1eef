pub mod domain;
pub mod ports;
pub mod validation;

pub use domain::{Attempt, AttemptPrompt, AttemptResponse, NewAttempt, NewRound, Round};
pub use ports::{PortError, PortResult, TelemetryStore, DEFAULT_ROUNDS_LIMIT};
pub use validation::{
    validate_attempt, validate_round, Expected, FieldProblem, ValidationError, ValidationMode,
};
