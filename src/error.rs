//! Error types for the rendering pipeline.

use thiserror::Error;

/// Everything the dashboard can report to its caller.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// An optional payload field is absent or null.
    ///
    /// Recovered inside the orchestrator: the affected visual is skipped and
    /// its previous state is kept. Never returned from `Dashboard::render`.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// The payload as a whole is unusable (for example, no metadata).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The analysis service answered with a non-success response.
    #[error("{0}")]
    Upstream(String),

    /// A widget backend failed to construct a chart for a slot.
    #[error("Failed to render {slot}: {message}")]
    Render { slot: &'static str, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Result alias used across the library.
pub type DashboardResult<T> = std::result::Result<T, DashboardError>;

impl DashboardError {
    /// Whether the orchestrator recovers from this error on its own.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingField(_))
    }
}
