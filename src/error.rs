use thiserror::Error;

/// Failure taxonomy shared by the pipeline, the service layer and the HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Malformed repository URL. Rejected before any task exists.
    #[error("{0}")]
    InvalidInput(String),

    /// The target repository does not exist or is not accessible.
    #[error("{0}")]
    NotFound(String),

    /// Every credential for an external dependency reported exhaustion.
    #[error("{0}")]
    Exhausted(String),

    /// Any other failure talking to an external dependency.
    #[error("{0}")]
    Transient(String),

    /// The repository exists but has nothing to analyze.
    #[error("{0}")]
    EmptyResource(String),

    /// Cache-only mode and the repository has not been analyzed before.
    #[error("Offline mode: only cached repositories are available. Try: [{}]", .available.join(", "))]
    Offline { available: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_message_lists_available_repositories() {
        let err = AnalysisError::Offline {
            available: vec![
                "https://github.com/a/b".to_string(),
                "https://github.com/c/d".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Offline mode: only cached repositories are available. Try: [https://github.com/a/b, https://github.com/c/d]"
        );
    }

    #[test]
    fn messages_are_preserved_verbatim() {
        let err = AnalysisError::NotFound("Repository not found or is private: a/b".to_string());
        assert_eq!(err.to_string(), "Repository not found or is private: a/b");
    }
}
