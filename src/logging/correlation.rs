//! Correlation id generation

use uuid::Uuid;

/// Generate a new correlation ID using UUID v4
///
/// The id follows one operation through ranking, every attempt and
/// every fallback, and is attached to audit records.
///
/// # Examples
///
/// ```
/// use dualroute::logging::generate_correlation_id;
///
/// let correlation_id = generate_correlation_id();
/// assert!(!correlation_id.is_empty());
/// ```
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_correlation_id_format() {
        let id = generate_correlation_id();
        // UUID v4 format: xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx
        assert_eq!(id.len(), 36);
        assert_eq!(id.chars().filter(|&c| c == '-').count(), 4);
    }

    #[test]
    fn test_generate_correlation_id_uniqueness() {
        assert_ne!(generate_correlation_id(), generate_correlation_id());
    }

    #[test]
    fn test_generate_correlation_id_parseable() {
        assert!(Uuid::parse_str(&generate_correlation_id()).is_ok());
    }
}
