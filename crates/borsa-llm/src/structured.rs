//! Structured output extraction from model text
//!
//! Models asked for JSON often wrap it in markdown fences or surround it
//! with prose. [`parse_json`] peels those layers off and deserializes the
//! first JSON value it can find into the requested type. Every agent wrapper
//! goes through this one function, so callers always receive the typed value
//! or a single well-defined error.

use crate::{LLMError, Result};
use serde::de::DeserializeOwned;

/// Parse a typed value out of free-form model text
///
/// Tries, in order: the whole text as JSON, the contents of a fenced code
/// block, and the first JSON object or array embedded in prose (trailing
/// text after the value is ignored).
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Ok(value);
    }

    if let Some(inner) = extract_fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str::<T>(inner.trim()) {
            return Ok(value);
        }
        if let Some(value) = parse_embedded(inner) {
            return Ok(value);
        }
    }

    if let Some(value) = parse_embedded(trimmed) {
        return Ok(value);
    }

    let snippet: String = trimmed.chars().take(200).collect();
    Err(LLMError::StructuredOutputFailed(format!(
        "no JSON value found in model output: {snippet}"
    )))
}

/// Contents of the first fenced code block, if any
fn extract_fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    // Skip the optional language tag on the fence line
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

/// Parse the first JSON object or array embedded in prose
///
/// Attempts a prefix parse from every `{` or `[` in the text; the stream
/// deserializer stops at the end of the value, so trailing prose is fine.
fn parse_embedded<T: DeserializeOwned>(text: &str) -> Option<T> {
    for (idx, ch) in text.char_indices() {
        if ch != '{' && ch != '[' {
            continue;
        }
        let mut stream = serde_json::Deserializer::from_str(&text[idx..]).into_iter::<T>();
        if let Some(Ok(value)) = stream.next() {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        done: bool,
        confidence: f64,
    }

    #[test]
    fn test_plain_json() {
        let v: Verdict = parse_json(r#"{"done": true, "confidence": 0.9}"#).unwrap();
        assert!(v.done);
    }

    #[test]
    fn test_fenced_json() {
        let text = "İşte sonuç:\n```json\n{\"done\": false, \"confidence\": 0.4}\n```\n";
        let v: Verdict = parse_json(text).unwrap();
        assert!(!v.done);
        assert!((v.confidence - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_embedded_in_prose() {
        let text = "Değerlendirme tamamlandı. {\"done\": true, \"confidence\": 0.8} Başka veri gerekmiyor.";
        let v: Verdict = parse_json(text).unwrap();
        assert!(v.done);
    }

    #[test]
    fn test_array_value() {
        let text = "Liste: [1, 2, 3] bitti";
        let v: Vec<u32> = parse_json(text).unwrap();
        assert_eq!(v, vec![1, 2, 3]);
    }

    #[test]
    fn test_no_json_is_an_error() {
        let result: Result<Verdict> = parse_json("burada json yok");
        assert!(matches!(result, Err(LLMError::StructuredOutputFailed(_))));
    }

    #[test]
    fn test_first_matching_value_wins() {
        let text = r#"{"unrelated": 1} {"done": true, "confidence": 1.0}"#;
        // The first object fails to deserialize as Verdict (missing fields),
        // so the scan continues to the second.
        let v: Verdict = parse_json(text).unwrap();
        assert!(v.done);
    }
}
