use std::collections::TryReserveError;

use thiserror::Error;

/// Error type for marshaling operations.
///
/// Build-time failures (`Config`) abort the whole table build. Per-step
/// failures (`Decode`, `Capacity`, `Adapter`) abort the remaining groups of
/// the pass in progress; groups already marshaled keep their values.
#[derive(Error, Debug)]
pub enum MarshalError {
    #[error("variable '{name}': {reason}")]
    Config { name: String, reason: String },
    #[error("codec '{codec}' could not decode payload: {reason}")]
    Decode { codec: String, reason: String },
    #[error("binary buffer reservation failed: {0}")]
    Capacity(#[from] TryReserveError),
    #[error("adapter call failed: {0}")]
    Adapter(String),
}

/// Convenience type for `Result<T, MarshalError>`.
pub type MarshalResult<T> = Result<T, MarshalError>;
