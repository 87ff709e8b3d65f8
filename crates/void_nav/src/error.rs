//! Navigation errors

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a path computation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathStatus {
    /// Both ends are on the mesh but no route connects them
    NoPath,
    /// The start point is not on any walkable area
    StartUnreachable,
    /// The goal point is not on any walkable area
    GoalUnreachable,
    /// The query itself was malformed
    Invalid,
}

impl fmt::Display for PathStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PathStatus::NoPath => "NoPath",
            PathStatus::StartUnreachable => "StartUnreachable",
            PathStatus::GoalUnreachable => "GoalUnreachable",
            PathStatus::Invalid => "Invalid",
        };
        f.write_str(name)
    }
}

/// Failure reported by a path query. Never carries waypoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct PathFailure {
    pub status: PathStatus,
    pub message: String,
}

impl PathFailure {
    /// Create a new failure
    pub fn new(status: PathStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// No route between the two points
    pub fn no_path(message: impl Into<String>) -> Self {
        Self::new(PathStatus::NoPath, message)
    }
}

/// Navigation errors
#[derive(Debug, Error)]
pub enum NavError {
    #[error("No path found ({status}): {message}")]
    NoPathFound { status: PathStatus, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Agent is not following anything")]
    NotFollowing,

    #[error("Agent '{0}' used after destroy")]
    UseAfterDestroy(String),

    #[error("No tokio runtime available to run the follow loop")]
    NoRuntime,

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PathFailure> for NavError {
    fn from(failure: PathFailure) -> Self {
        NavError::NoPathFound {
            status: failure.status,
            message: failure.message,
        }
    }
}

pub type NavResult<T> = Result<T, NavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_failure_display() {
        let failure = PathFailure::no_path("blocked by wall");
        assert_eq!(failure.to_string(), "NoPath: blocked by wall");
    }

    #[test]
    fn test_failure_into_nav_error() {
        let err: NavError = PathFailure::new(PathStatus::GoalUnreachable, "off mesh").into();
        match err {
            NavError::NoPathFound { status, message } => {
                assert_eq!(status, PathStatus::GoalUnreachable);
                assert_eq!(message, "off mesh");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
