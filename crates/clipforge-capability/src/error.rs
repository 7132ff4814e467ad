//! Capability error taxonomy.

use std::time::Duration;
use thiserror::Error;

pub type CapabilityResult<T> = Result<T, CapabilityError>;

#[derive(Debug, Error)]
pub enum CapabilityError {
    /// A single call exceeded its deadline. Transient, retried with backoff.
    #[error("{capability} call timed out after {timeout:?}")]
    Timeout {
        capability: String,
        timeout: Duration,
    },

    /// The backing service refused or dropped the call. Transient.
    #[error("{capability} unavailable: {reason}")]
    Unavailable { capability: String, reason: String },

    /// The capability rejected the input itself. Permanent, never retried.
    #[error("{capability} rejected input: {reason}")]
    InvalidInput { capability: String, reason: String },

    /// Retries exhausted; wraps the last transient error.
    #[error("{capability} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        capability: String,
        attempts: u32,
        #[source]
        source: Box<CapabilityError>,
    },
}

impl CapabilityError {
    pub fn timeout(capability: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            capability: capability.into(),
            timeout,
        }
    }

    pub fn unavailable(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            capability: capability.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_input(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            capability: capability.into(),
            reason: reason.into(),
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CapabilityError::Timeout { .. } | CapabilityError::Unavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(CapabilityError::timeout("asr", Duration::from_secs(30)).is_retryable());
        assert!(CapabilityError::unavailable("detect", "connection refused").is_retryable());
        assert!(!CapabilityError::invalid_input("asr", "empty audio").is_retryable());
    }
}
