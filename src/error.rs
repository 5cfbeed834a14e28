//! Unified error type for the scan pipeline.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScanError>;

/// All failure modes the pipeline can surface to a caller.
///
/// Recoverable conditions (the reflectance length mismatch) never appear
/// here: the pipeline degrades to an empty reflectance sequence instead of
/// failing the request.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The input scan buffer was empty; the foreign routine requires at
    /// least one byte and a zero-size raw allocation has no meaningful
    /// pointer contract.
    #[error("input scan buffer is empty")]
    EmptyInput,

    /// A result region had the wrong size for the fixed struct layout.
    #[error("result region size mismatch: expected {expected} bytes, got {got}")]
    RegionSize { expected: usize, got: usize },

    /// The engine was shut down (or never became ready) before the request.
    #[error("scan routine is not available")]
    RoutineUnavailable,

    /// Persistence or other I/O failure; propagated unretried.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV rendering failure from the report sink.
    #[error("CSV rendering failed: {0}")]
    Csv(#[from] csv::Error),
}
