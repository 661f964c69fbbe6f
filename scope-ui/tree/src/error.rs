use thiserror::Error;

/// Errors emitted while loading tree data or settings.
#[derive(Debug, Error)]
pub enum TreeError {
    /// JSON deserialization failed.
    #[error("tree JSON failed: {0}")]
    Json(#[from] serde_json::Error),
    /// A node was supplied without a key.
    #[error("tree node {title:?} has no key")]
    MissingKey { title: String },
    /// A settings value did not pass validation.
    #[error("invalid tree settings: {message}")]
    InvalidSettings { message: String },
}
