//! Error types for the pump heuristics.

use thiserror::Error;

/// Errors that can occur while running the heuristics.
///
/// Backend infeasibility and time-outs are deliberately *not* errors: LP and
/// MIP solve calls report them through [`crate::model::SolveStatus`] and the
/// caller inspects the status. Only hard failures unwind through this enum.
#[derive(Error, Debug)]
pub enum PumpError {
    /// File or stream I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Problem data is malformed
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// The backend solver reported a hard failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// Repeated numerical failures in the LP loop
    #[error("Numerical failure: {0}")]
    NumericalFailure(String),

    /// The original problem was proved infeasible
    #[error("Problem is infeasible")]
    Infeasible,

    /// Wall-clock limit exhausted
    #[error("Time limit exceeded")]
    TimeExceeded,

    /// Run interrupted by the user
    #[error("Aborted")]
    Aborted,

    /// An internal invariant was violated (a bug, not a user-facing failure)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for pump operations.
pub type PumpResult<T> = Result<T, PumpError>;
