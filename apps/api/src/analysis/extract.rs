//! Locates the JSON object inside a free-form model reply.
//!
//! The span runs from the first `{` to the last `}`. Brace balance is not
//! checked, so prose containing braces around the object is over-captured and
//! then fails to parse, which lands on the fallback path.

/// Parse candidate used when the reply holds no brace-delimited span.
pub const EMPTY_OBJECT: &str = "{}";

/// Greedy `{...}` span of `raw`, if any.
pub fn extract_json_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// The span to hand to the JSON parser, or `{}` when extraction fails.
pub fn json_candidate(raw: &str) -> &str {
    extract_json_span(raw).unwrap_or(EMPTY_OBJECT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_object_surrounded_by_prose() {
        let raw = "Here is your analysis:\n{\"skinType\": \"Dry\"}\nStay hydrated!";
        assert_eq!(extract_json_span(raw), Some("{\"skinType\": \"Dry\"}"));
    }

    #[test]
    fn test_extracts_from_markdown_fence() {
        let raw = "```json\n{\"a\": {\"b\": 1}}\n```";
        assert_eq!(extract_json_span(raw), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn test_span_is_greedy_first_to_last() {
        let raw = "{\"a\": 1} and also {\"b\": 2}";
        assert_eq!(extract_json_span(raw), Some(raw));
    }

    #[test]
    fn test_no_braces_yields_empty_object() {
        assert_eq!(extract_json_span("I cannot help with that."), None);
        assert_eq!(json_candidate("I cannot help with that."), EMPTY_OBJECT);
    }

    #[test]
    fn test_closing_before_opening_is_not_a_span() {
        assert_eq!(extract_json_span("} oops {"), None);
    }
}
