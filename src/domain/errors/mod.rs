// Domain errors - Error types for the domain layer

use std::fmt;

use crate::domain::model::Task;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    BadArgs(String),
    /// A gated operation was started while another task is in flight
    Busy { active: Task, requested: Task },
    /// Task transition not allowed by the state machine
    InvalidTransition { from: Task, to: Task },
    /// File name unknown to the engine namespace
    MissingResource(String),
    /// Keyframe query made before any keyframe was discovered
    NoKeyframes,
    /// Aggregate playback operation on an empty track set
    NoTracks,
    /// Timeline used before media metadata was loaded
    NotReady(String),
    /// Media engine reported a failed run
    EngineFailure(String),
    /// Audio mixing failed
    MixFailure(String),
    /// File system operation failed
    FsFail(String),
    /// Configuration could not be loaded or is invalid
    ConfigFail(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::Busy { active, requested } => write!(
                f,
                "Cannot start {} while {} is in progress",
                requested, active
            ),
            DomainError::InvalidTransition { from, to } => {
                write!(f, "Invalid task transition: {} -> {}", from, to)
            }
            DomainError::MissingResource(name) => {
                write!(f, "Trying to read file that doesn't exist: {}", name)
            }
            DomainError::NoKeyframes => write!(f, "No keyframes have been discovered yet"),
            DomainError::NoTracks => write!(f, "There are no media tracks"),
            DomainError::NotReady(msg) => write!(f, "Timeline not ready: {}", msg),
            DomainError::EngineFailure(msg) => write!(f, "Media engine failure: {}", msg),
            DomainError::MixFailure(msg) => write!(f, "Audio mixing failed: {}", msg),
            DomainError::FsFail(msg) => write!(f, "File system error: {}", msg),
            DomainError::ConfigFail(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}
