//! Prioritization failure taxonomy

use thiserror::Error;

/// Why a prioritization cycle did not commit
#[derive(Debug, Error)]
pub enum PrioritizationFailure {
    /// The project has no open tasks; nothing was sent or written
    #[error("No open tasks to prioritize")]
    NoWorkToDo,

    #[error("No project with id {0}")]
    UnknownProject(String),

    /// The model call failed or timed out
    #[error("Prioritization model unavailable: {0}")]
    ModelUnavailable(String),

    /// The model answered with something that is not the expected shape
    #[error("Malformed model response: {0}")]
    MalformedModelResponse(String),

    #[error("Failed to persist prioritization: {0}")]
    PersistenceError(String),
}

impl PrioritizationFailure {
    /// A no-op outcome rather than an error worth surfacing loudly
    pub fn is_no_op(&self) -> bool {
        matches!(self, PrioritizationFailure::NoWorkToDo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_no_op() {
        assert!(PrioritizationFailure::NoWorkToDo.is_no_op());
        assert!(!PrioritizationFailure::ModelUnavailable("timeout".to_string()).is_no_op());
        assert!(!PrioritizationFailure::PersistenceError("disk".to_string()).is_no_op());
    }

    #[test]
    fn test_display() {
        let err = PrioritizationFailure::MalformedModelResponse("missing prioritizedTasks".to_string());
        assert_eq!(
            err.to_string(),
            "Malformed model response: missing prioritizedTasks"
        );
    }
}
