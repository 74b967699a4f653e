//! Server-Sent-Events decoding
//!
//! The message-stream endpoint returns `text/event-stream`, but the
//! gateway awaits the complete body before decoding, so this is a
//! whole-buffer decoder rather than an incremental one. Malformed
//! JSON in a single event is a documented skip-and-continue policy:
//! the event is dropped, counted, and decoding proceeds.

/// Result of decoding one SSE body
#[derive(Debug, Default, PartialEq)]
pub struct SseDecoded {
    /// JSON events in stream order
    pub events: Vec<serde_json::Value>,
    /// Events whose data failed to parse as JSON
    pub skipped: usize,
}

/// Decode an SSE body into its JSON data events
///
/// `data: ` lines belonging to one event are concatenated; a blank
/// line terminates the event. Non-data fields (`event:`, `id:`,
/// comments) are ignored.
pub fn decode(raw: &str) -> SseDecoded {
    let mut decoded = SseDecoded::default();
    let mut data = String::new();

    fn finish(data: &mut String, decoded: &mut SseDecoded) {
        if data.is_empty() {
            return;
        }
        match serde_json::from_str(data) {
            Ok(value) => decoded.events.push(value),
            Err(e) => {
                decoded.skipped += 1;
                tracing::debug!(error = %e, "Skipping malformed SSE event");
            },
        }
        data.clear();
    }

    for line in raw.lines() {
        if let Some(payload) = line.strip_prefix("data: ") {
            data.push_str(payload);
        } else if line.is_empty() {
            finish(&mut data, &mut decoded);
        }
    }
    // Stream may end without a trailing blank line.
    finish(&mut data, &mut decoded);

    decoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_event() {
        let decoded = decode("data: {\"a\":1}\n\n");
        assert_eq!(decoded.events, vec![json!({"a": 1})]);
        assert_eq!(decoded.skipped, 0);
    }

    #[test]
    fn test_two_events_in_order() {
        let decoded = decode("data: {\"a\":1}\n\ndata: {\"b\":2}\n\n");
        assert_eq!(decoded.events, vec![json!({"a": 1}), json!({"b": 2})]);
    }

    #[test]
    fn test_malformed_event_skipped_and_counted() {
        let decoded = decode("data: not-json\n\ndata: {\"ok\":true}\n\n");
        assert_eq!(decoded.events, vec![json!({"ok": true})]);
        assert_eq!(decoded.skipped, 1);
    }

    #[test]
    fn test_multiline_data_concatenated() {
        let decoded = decode("data: {\"a\":\ndata: 1}\n\n");
        assert_eq!(decoded.events, vec![json!({"a": 1})]);
    }

    #[test]
    fn test_non_data_fields_ignored() {
        let decoded = decode("event: message\nid: 3\ndata: {\"a\":1}\n\n");
        assert_eq!(decoded.events, vec![json!({"a": 1})]);
    }

    #[test]
    fn test_missing_trailing_blank_line() {
        let decoded = decode("data: {\"a\":1}");
        assert_eq!(decoded.events, vec![json!({"a": 1})]);
    }

    #[test]
    fn test_empty_input() {
        let decoded = decode("");
        assert!(decoded.events.is_empty());
        assert_eq!(decoded.skipped, 0);
    }
}
