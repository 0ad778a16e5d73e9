/// Convenience result type used across halo.
pub type HaloResult<T> = Result<T, HaloError>;

/// Top-level error taxonomy used by engine APIs.
///
/// The per-tick render path never produces these: missing scene data degrades to a black
/// frame instead. Errors only surface at the edges (config, persistence, sinks).
#[derive(thiserror::Error, Debug)]
pub enum HaloError {
    /// Invalid user-provided state, config or scene data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while evaluating engine state outside the render path.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Filesystem or device IO failures.
    #[error("io error: {0}")]
    Io(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HaloError {
    /// Build a [`HaloError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`HaloError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`HaloError::Io`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Build a [`HaloError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
