//! Error classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse category of a failed attempt, derived from its error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Timeout,
    RateLimited,
    Upstream,
    Network,
    CircuitOpen,
    Budget,
    Unknown,
}

impl ErrorCategory {
    /// Classify an error message. Matching is case-insensitive and the first
    /// rule that fires wins.
    pub fn classify(message: &str) -> Self {
        let msg = message.to_lowercase();
        if msg.contains("timed out") || msg.contains("timeout") {
            ErrorCategory::Timeout
        } else if msg.contains("rate limit") || msg.contains("429") || msg.contains("too many requests")
        {
            ErrorCategory::RateLimited
        } else if msg.contains("circuit") && msg.contains("open") {
            ErrorCategory::CircuitOpen
        } else if msg.contains("budget") {
            ErrorCategory::Budget
        } else if msg.contains("network")
            || msg.contains("connection")
            || msg.contains("refused")
            || msg.contains("dns")
            || msg.contains("reset")
        {
            ErrorCategory::Network
        } else if msg.contains("upstream") || msg.contains("http 5") || msg.contains("status 5") {
            ErrorCategory::Upstream
        } else {
            ErrorCategory::Unknown
        }
    }

    pub fn suggested_action(&self) -> &'static str {
        match self {
            ErrorCategory::Timeout => {
                "Extend the circuit open duration or shorten the attempt timeout for affected paths"
            }
            ErrorCategory::RateLimited => "Reduce request rate or shift traffic to an alternate path",
            ErrorCategory::Upstream => {
                "Check upstream provider status and consider a lower failure threshold"
            }
            ErrorCategory::Network => "Verify network connectivity to affected paths",
            ErrorCategory::CircuitOpen => "Circuits are rejecting traffic; review failure thresholds",
            ErrorCategory::Budget => "Latency budgets are too tight for current path latency",
            ErrorCategory::Unknown => "Inspect raw error samples for the affected paths",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::RateLimited => "rate_limited",
            ErrorCategory::Upstream => "upstream",
            ErrorCategory::Network => "network",
            ErrorCategory::CircuitOpen => "circuit_open",
            ErrorCategory::Budget => "budget",
            ErrorCategory::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Normalize an error message into a grouping signature: lowercase,
/// digit runs collapsed to `#`, at most 80 chars.
pub fn signature(message: &str) -> String {
    let mut out = String::with_capacity(message.len().min(80));
    let mut in_digits = false;
    for c in message.trim().to_lowercase().chars() {
        if c.is_ascii_digit() {
            if !in_digits {
                out.push('#');
            }
            in_digits = true;
        } else {
            out.push(c);
            in_digits = false;
        }
        if out.chars().count() >= 80 {
            break;
        }
    }
    out
}
