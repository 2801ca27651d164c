use thiserror::Error;

/// Failure of an oracle to evaluate a position.
///
/// A failed evaluation aborts the current simulation only; the node that
/// was being expanded stays unexpanded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("policy vector has {actual} entries, expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("value estimate is not finite: {0}")]
    NonFiniteValue(f32),

    #[error("malformed position: {0}")]
    MalformedPosition(String),

    #[error("evaluator backend failed: {0}")]
    Backend(String),
}

/// Errors that can occur while setting up or running a search
#[derive(Error, Debug)]
pub enum Error {
    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("invalid position: {0}")]
    InvalidPosition(String),

    #[error("Invalid FEN string: {0}")]
    InvalidFen(String),

    #[error("Invalid move: {0}")]
    InvalidMove(String),
}

/// Convenience Result type for search operations
pub type Result<T> = std::result::Result<T, Error>;
