//! JSON extraction from raw controller output.
//!
//! Controllers are told to answer with exactly one JSON object, but small
//! models routinely wrap it in prose or markdown fences. The extractor
//! takes the substring between the first `{` and the last `}` and parses
//! that; everything outside is discarded. It is deliberately not a repair
//! pass -- a plan that does not parse after extraction falls back to the
//! deterministic planner.

use serde_json::Value;
use thiserror::Error;

/// Why extraction failed.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The text contains no `{ ... }` region at all.
    #[error("no JSON object found in controller output")]
    NoObject,

    /// The bracketed region did not parse as JSON.
    #[error("unparsable JSON object: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Extract and parse the first balanced-looking JSON object in `text`.
pub fn extract_object(text: &str) -> Result<Value, ExtractError> {
    let start = text.find('{').ok_or(ExtractError::NoObject)?;
    let end = text.rfind('}').ok_or(ExtractError::NoObject)?;
    if end < start {
        return Err(ExtractError::NoObject);
    }
    Ok(serde_json::from_str(&text[start..=end])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_object_parses() {
        let value = extract_object(r#"{"version": "1.0"}"#).unwrap();
        assert_eq!(value, json!({"version": "1.0"}));
    }

    #[test]
    fn surrounding_prose_is_discarded() {
        let value = extract_object("Here is the plan:\n{\"a\": 1}\nHope this helps!").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn markdown_fences_are_discarded() {
        let value = extract_object("```json\n{\"a\": 1}\n```").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn nested_objects_survive_first_to_last_bracketing() {
        let value = extract_object(r#"{"outer": {"inner": 2}}"#).unwrap();
        assert_eq!(value["outer"]["inner"], 2);
    }

    #[test]
    fn no_braces_is_no_object() {
        assert!(matches!(extract_object("no json here"), Err(ExtractError::NoObject)));
    }

    #[test]
    fn reversed_braces_is_no_object() {
        assert!(matches!(extract_object("} not it {"), Err(ExtractError::NoObject)));
    }

    #[test]
    fn garbage_between_braces_is_parse_error() {
        assert!(matches!(extract_object("{not json}"), Err(ExtractError::Parse(_))));
    }

    #[test]
    fn multibyte_text_around_object_is_safe() {
        let value = extract_object("план: {\"шаг\": \"один\"} готово").unwrap();
        assert_eq!(value["шаг"], "один");
    }
}
