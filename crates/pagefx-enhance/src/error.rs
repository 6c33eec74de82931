//! Error types for page enhancement.

/// Error raised by an enhancement collaborator.
#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    /// Collaborator configuration could not be serialized.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// External collaborator reported a failure.
    #[error("{collaborator} failed: {message}")]
    Collaborator {
        /// Collaborator name (e.g., "mermaid").
        collaborator: String,
        /// Failure description.
        message: String,
    },
}
