//! Error types for lilt_animation

use thiserror::Error;

/// Errors produced by the tween engine and by caller-supplied accessors
#[derive(Error, Debug)]
pub enum TweenError {
    /// An endpoint accessor could not produce a value (e.g. its target is gone)
    #[error("Tween target unavailable: {0}")]
    TargetUnavailable(String),

    /// Scheduler configuration could not be parsed
    #[error("Failed to parse scheduler config: {0}")]
    Config(#[from] toml::de::Error),

    /// Scheduler configuration parsed but is inconsistent
    #[error("Invalid scheduler config: {0}")]
    InvalidConfig(String),
}

impl TweenError {
    /// Shorthand for [`TweenError::TargetUnavailable`]
    pub fn target_unavailable(reason: impl Into<String>) -> Self {
        TweenError::TargetUnavailable(reason.into())
    }
}

/// Result type for lilt_animation operations
pub type Result<T> = std::result::Result<T, TweenError>;

/// Why an animation ended without completing naturally
#[derive(Debug)]
pub enum AbortReason {
    /// No apply-sink was ever supplied
    MissingApplySink,
    /// The start or end accessor failed when queried
    EndpointFailed(TweenError),
    /// The animation was cancelled through the scheduler
    Cancelled,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::MissingApplySink => write!(f, "no apply sink"),
            AbortReason::EndpointFailed(err) => write!(f, "endpoint failed: {err}"),
            AbortReason::Cancelled => write!(f, "cancelled"),
        }
    }
}
