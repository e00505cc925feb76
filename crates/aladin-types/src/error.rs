use thiserror::Error;

/// Errors related to secret storage.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret not found")]
    NotFound,

    #[error("secret store is read-only")]
    ReadOnly,

    #[error("secret store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised when a commit would push daily usage past the limit.
///
/// The tokens are recorded regardless; this only tells the caller the
/// budget is now exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("daily token limit exceeded: {tokens_used_today} used of {daily_limit}")]
pub struct CommitError {
    pub tokens_used_today: u64,
    pub daily_limit: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_error_display() {
        let err = SecretError::Unavailable("no dbus session".to_string());
        assert_eq!(err.to_string(), "secret store unavailable: no dbus session");
    }

    #[test]
    fn test_commit_error_display() {
        let err = CommitError {
            tokens_used_today: 320,
            daily_limit: 300,
        };
        assert!(err.to_string().contains("320"));
        assert!(err.to_string().contains("300"));
    }
}
