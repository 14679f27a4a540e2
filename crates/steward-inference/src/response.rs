//! Splitting raw completion text into reply and payload.

use serde_json::Value;
use steward_core::defaults::PAYLOAD_SENTINEL;

/// Raw completion text split at the first sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReply<'a> {
    /// Conversational text before the sentinel, trimmed. The whole text when
    /// there is no sentinel.
    pub reply: String,
    /// Text after the sentinel, untrimmed. `None` without a sentinel.
    pub payload: Option<&'a str>,
}

/// Split `raw` at the first occurrence of the payload sentinel.
pub fn split_on_sentinel(raw: &str) -> SplitReply<'_> {
    match raw.find(PAYLOAD_SENTINEL) {
        Some(idx) => SplitReply {
            reply: raw[..idx].trim().to_string(),
            payload: Some(&raw[idx + PAYLOAD_SENTINEL.len()..]),
        },
        None => SplitReply {
            reply: raw.trim().to_string(),
            payload: None,
        },
    }
}

/// Parse the first JSON value in a payload segment.
///
/// A surrounding markdown code fence is tolerated, and anything after the
/// first complete value is ignored. Text before the value is not.
pub fn first_json_value(segment: &str) -> Result<Value, serde_json::Error> {
    let mut body = segment.trim_start();
    if let Some(fenced) = body.strip_prefix("```") {
        // Skip an optional language tag on the fence line.
        body = match fenced.find('\n') {
            Some(newline) if !fenced[..newline].contains('{') => &fenced[newline + 1..],
            _ => fenced,
        };
        body = body.trim_start();
    }

    let mut values = serde_json::Deserializer::from_str(body).into_iter::<Value>();
    match values.next() {
        Some(result) => result,
        None => serde_json::from_str::<Value>(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_sentinel_returns_full_text() {
        let split = split_on_sentinel("  Hello! How can I help?  ");
        assert_eq!(split.reply, "Hello! How can I help?");
        assert!(split.payload.is_none());
    }

    #[test]
    fn test_splits_at_first_sentinel() {
        let split = split_on_sentinel("Sure.\n__JSON_DATA__\n{\"a\":1}__JSON_DATA__{}");
        assert_eq!(split.reply, "Sure.");
        assert_eq!(split.payload, Some("\n{\"a\":1}__JSON_DATA__{}"));
    }

    #[test]
    fn test_first_json_value_plain() {
        let v = first_json_value("\n{\"action\":\"create_task\"}\n").unwrap();
        assert_eq!(v["action"], "create_task");
    }

    #[test]
    fn test_first_json_value_fenced() {
        let v = first_json_value("\n```json\n{\"a\": 1}\n```\n").unwrap();
        assert_eq!(v["a"], 1);
        let v = first_json_value("```\n{\"a\": 2}\n```").unwrap();
        assert_eq!(v["a"], 2);
    }

    #[test]
    fn test_first_json_value_ignores_trailing_prose() {
        let v = first_json_value("{\"a\": 1}\nLet me know if that works!").unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn test_first_json_value_malformed() {
        assert!(first_json_value("{\"a\": ").is_err());
        assert!(first_json_value("here you go: {\"a\":1}").is_err());
        assert!(first_json_value("   ").is_err());
    }
}
