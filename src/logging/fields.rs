//! Field helpers for structured logging

/// Maximum length of an error detail carried in logs and health records
pub const MAX_DETAIL_LEN: usize = 256;

/// Maximum length of a logged payload preview
const PAYLOAD_PREVIEW_LEN: usize = 100;

/// Truncate an error detail so a noisy upstream cannot flood the logs
///
/// # Examples
///
/// ```
/// use dualroute::logging::truncate_detail;
///
/// assert_eq!(truncate_detail("refused"), "refused");
/// assert!(truncate_detail(&"x".repeat(1000)).ends_with("..."));
/// ```
pub fn truncate_detail(detail: &str) -> String {
    truncate_string(detail, MAX_DETAIL_LEN)
}

/// Render a short preview of an operation payload.
///
/// Returns None unless payload logging is enabled, or when the payload is null.
pub fn payload_preview(payload: &serde_json::Value, enable_payload_logging: bool) -> Option<String> {
    if !enable_payload_logging || payload.is_null() {
        return None;
    }
    Some(truncate_string(&payload.to_string(), PAYLOAD_PREVIEW_LEN))
}

/// Truncate on a char boundary so multi-byte text never panics
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_detail_short() {
        assert_eq!(truncate_detail("timeout"), "timeout");
    }

    #[test]
    fn test_truncate_detail_long() {
        let long = "e".repeat(MAX_DETAIL_LEN + 10);
        let truncated = truncate_detail(&long);
        assert_eq!(truncated.len(), MAX_DETAIL_LEN + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_multibyte_boundary() {
        let text = "é".repeat(MAX_DETAIL_LEN);
        let truncated = truncate_detail(&text);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_payload_preview_disabled() {
        assert!(payload_preview(&json!({"prompt": "hi"}), false).is_none());
    }

    #[test]
    fn test_payload_preview_enabled() {
        let preview = payload_preview(&json!({"prompt": "hi"}), true).unwrap();
        assert!(preview.contains("prompt"));
    }

    #[test]
    fn test_payload_preview_null() {
        assert!(payload_preview(&serde_json::Value::Null, true).is_none());
    }
}
