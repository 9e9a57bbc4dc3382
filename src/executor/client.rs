//! Path client abstraction.
//!
//! The executor never talks to an upstream directly; each path id is bound
//! to a [`PathClient`] supplied by the embedding application.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::routing::OperationRequest;

/// Successful upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct PathResponse {
    pub payload: serde_json::Value,
    /// Upstream-reported latency; the executor measures its own as well
    pub latency_ms: u64,
    /// Cost of this call in the path's cost unit
    pub cost: f64,
}

impl PathResponse {
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            payload,
            latency_ms: 0,
            cost: 0.0,
        }
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }
}

/// Errors a path client can report for one attempt.
///
/// Display strings are what the failure analyzer classifies, so each
/// variant keeps a stable prefix.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathClientError {
    /// Network connectivity error (DNS, connection refused, reset).
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded its deadline.
    #[error("request timed out after {0}ms")]
    Timeout(u64),

    /// Upstream returned an error response.
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Upstream throttled the call.
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// Response doesn't match the expected format.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// One execution path's upstream client.
///
/// Object-safe; held as `Arc<dyn PathClient>`.
#[async_trait]
pub trait PathClient: Send + Sync + 'static {
    /// Perform the operation. `timeout` is the slice of the request budget
    /// granted to this attempt; the executor enforces it regardless.
    async fn invoke(
        &self,
        request: &OperationRequest,
        timeout: Duration,
    ) -> Result<PathResponse, PathClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ErrorCategory;

    #[test]
    fn error_messages_classify_to_matching_categories() {
        let cases = [
            (PathClientError::Timeout(500), ErrorCategory::Timeout),
            (
                PathClientError::Network("connection refused".into()),
                ErrorCategory::Network,
            ),
            (
                PathClientError::Upstream {
                    status: 503,
                    message: "overloaded".into(),
                },
                ErrorCategory::Upstream,
            ),
            (
                PathClientError::RateLimited("slow down".into()),
                ErrorCategory::RateLimited,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(ErrorCategory::classify(&error.to_string()), expected, "{}", error);
        }
    }
}
