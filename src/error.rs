use thiserror::Error;

/// Failure taxonomy for one analysis invocation. Every variant aborts the
/// whole pipeline; no partial report is assembled or persisted after a
/// fatal condition.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Missing submission, undecodable payload, or an out-of-range
    /// confidence reaching the reconciler.
    #[error("invalid submission: {0}")]
    Input(String),

    /// Prediction service unreachable or returned a malformed payload.
    #[error("prediction service error: {0}")]
    Upstream(String),

    /// Missing submitter identity, rejected before any pipeline work.
    #[error("unauthorized: {0}")]
    Authorization(String),
}
