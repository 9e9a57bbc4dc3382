//! Error types for routing failures

use thiserror::Error;

/// Why a candidate path was filtered out before scoring
#[derive(Debug, Clone, PartialEq)]
pub struct Exclusion {
    pub path_id: String,
    pub reason: String,
}

/// Errors that can occur during path selection
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Every candidate was filtered out
    #[error("No candidate path for operation '{operation}': {}", format_exclusions(.exclusions))]
    NoCandidate {
        operation: String,
        exclusions: Vec<Exclusion>,
    },
}

fn format_exclusions(exclusions: &[Exclusion]) -> String {
    if exclusions.is_empty() {
        return "no paths registered".to_string();
    }
    exclusions
        .iter()
        .map(|e| format!("{} ({})", e.path_id, e.reason))
        .collect::<Vec<_>>()
        .join(", ")
}
