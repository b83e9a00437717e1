use thiserror::Error;

pub type Result<T> = std::result::Result<T, CorepError>;

/// Errors raised by retrieval, generation and configuration.
///
/// Validation findings are never errors; they travel as warning strings on
/// the [`ReportOutput`](crate::models::ReportOutput).
#[derive(Error, Debug)]
pub enum CorepError {
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Dimension mismatch: {passages} passages but {vectors} vectors")]
    LengthMismatch { passages: usize, vectors: usize },

    #[error("Similarity index has not been built")]
    IndexNotBuilt,

    #[error("Embedding provider error: {0}")]
    EmbeddingFailure(String),

    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CorepError {
    /// True for the variants that signal a malformed index build.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            CorepError::DimensionMismatch { .. } | CorepError::LengthMismatch { .. }
        )
    }
}
