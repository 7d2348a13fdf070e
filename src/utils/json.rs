//! Helpers for pulling structured JSON out of free-form LLM responses.

use crate::types::{AppError, Result};
use serde::de::DeserializeOwned;

/// Parse the first JSON object or array embedded in `text`.
///
/// Models often wrap JSON in markdown fences or add a sentence before it, so
/// each opening bracket is tried in turn, sliced to the last matching closing
/// bracket, until one deserializes into `T`. A bracketed aside such as
/// `[Note]` ahead of an object is skipped this way. Failure is
/// [`AppError::Parse`], which the retry policy treats as worth another sample.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    let mut first_error = None;
    let candidates = text
        .char_indices()
        .filter(|(_, c)| *c == '{' || *c == '[')
        .take(MAX_CANDIDATES);

    for (start, open) in candidates {
        let close = if open == '{' { '}' } else { ']' };
        let Some(end) = text.rfind(close).filter(|end| *end > start) else {
            continue;
        };
        match serde_json::from_str(&text[start..=end]) {
            Ok(value) => return Ok(value),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(_) => {}
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None if text.contains(['{', '[']) => Err(AppError::Parse(format!(
            "Unterminated JSON in response: {}",
            preview(text)
        ))),
        None => Err(AppError::Parse(format!(
            "No JSON found in response: {}",
            preview(text)
        ))),
    }
}

const MAX_CANDIDATES: usize = 16;

fn preview(text: &str) -> String {
    text.chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Rule {
        rule: String,
    }

    #[test]
    fn test_extract_from_fenced_block() {
        let text = "Here you go:\n```json\n{\"rule\": \"Prefer .edu sources\"}\n```";
        let rule: Rule = extract_json(text).unwrap();
        assert_eq!(rule.rule, "Prefer .edu sources");
    }

    #[test]
    fn test_extract_array() {
        let values: Vec<u32> = extract_json("[1, 2, 3]").unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_json_is_parse_error() {
        let result: Result<Rule> = extract_json("no structure here");
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn test_bracketed_preamble_before_object() {
        let rule: Rule = extract_json("[Note] {\"rule\": \"Cite primary data\"}").unwrap();
        assert_eq!(rule.rule, "Cite primary data");

        let values: Vec<u32> = extract_json("Answer {draft}: [4, 5]").unwrap();
        assert_eq!(values, vec![4, 5]);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let result: Result<Rule> = extract_json("{\"rule\": }");
        assert!(matches!(result, Err(AppError::Parse(_))));
    }
}
