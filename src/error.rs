use thiserror::Error;

pub type PairsimResult<T> = Result<T, PairsimError>;

#[derive(Debug, Error)]
pub enum PairsimError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    System(#[from] SystemError),
}

/// Errors related to serialization and export of diagnostic artifacts.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("Serialization failed")]
    Json(#[from] serde_json::Error),
}

/// Errors related to market data availability and domain types.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Week {week} is out of range (dataset has {total} weeks)")]
    WeekOutOfRange { week: usize, total: usize },

    #[error("Timestep {timestep} is out of range for week {week}")]
    TimestepOutOfRange { week: usize, timestep: usize },

    #[error("Invalid symbol string: '{0}'")]
    InvalidSymbol(String),

    #[error("Malformed market data: {0}")]
    Malformed(String),
}

/// Errors related to the gym environment configuration and execution loop.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("Invalid environment state: {0}")]
    InvalidState(String),

    #[error("Invalid environment configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown action id: {0}")]
    UnknownAction(usize),
}

/// Errors related to internal invariants and bugs.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Missing internal field: {0}")]
    MissingField(String),
}
