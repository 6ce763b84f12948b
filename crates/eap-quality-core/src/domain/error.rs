//! Error taxonomy for quality gate evaluation.
//!
//! Gates report failures through [`GateError`]; the engine converts those into
//! synthetic FAILED results and never hands them to the caller. [`QualityError`]
//! covers the boundary work around the engine: policy loading and report
//! artifacts on disk.

/// Errors a quality gate may return from `evaluate`.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("{gate}: {message}")]
    Evaluation { gate: String, message: String },

    #[error("invalid signal {key}={value}")]
    InvalidSignal { key: String, value: String },
}

impl GateError {
    /// Shorthand for an evaluation failure attributed to `gate`.
    pub fn evaluation(gate: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Evaluation {
            gate: gate.into(),
            message: message.into(),
        }
    }
}

/// Errors produced outside the engine's pure evaluation path.
#[derive(Debug, thiserror::Error)]
pub enum QualityError {
    #[error("invalid quality policy: {0}")]
    InvalidPolicy(String),

    #[error("failed to parse quality policy: {0}")]
    PolicyParse(#[from] toml::de::Error),

    #[error("failed to render quality policy: {0}")]
    PolicyRender(#[from] toml::ser::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for policy and reporting operations.
pub type Result<T> = std::result::Result<T, QualityError>;
