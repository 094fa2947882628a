//! Error types for kernel selection.

use thiserror::Error;

/// Errors raised while selecting or instantiating a GEMM strategy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GemmError {
    /// The problem descriptor has an empty dimension or no threads.
    #[error("malformed GEMM problem: {0}")]
    MalformedProblem(String),

    /// Selection fell through to the terminal record.
    #[error("no viable GEMM strategy for M={m} N={n} K={k} (batches={nbatches}, multis={nmulti})")]
    NoViableStrategy {
        m: usize,
        n: usize,
        k: usize,
        nbatches: usize,
        nmulti: usize,
    },
}

/// Result type for selection operations.
pub type Result<T> = std::result::Result<T, GemmError>;
