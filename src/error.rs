use thiserror::Error;

/// Errors surfaced at the persistence boundary when stored strings are
/// parsed back into engine types. Scoring and generation paths never return
/// errors; they are total over their input domain.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown operator symbol: {0}")]
    UnknownOperator(String),

    #[error("malformed fact key: {0}")]
    MalformedFactKey(String),
}
