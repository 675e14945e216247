//! Best-effort recovery of a structured JSON value from a generative model's
//! free-text reply. Models asked to emit JSON routinely wrap it in markdown
//! fences, use single quotes, or add commentary before and after the payload;
//! this module peels all of that away before parsing.

use serde_json::Value;
use tracing::debug;

/// Top-level shape the caller expects from the model.
#[derive(Debug, Clone, Copy)]
pub enum ExpectedShape {
    /// A JSON object that must contain the named key (e.g. `"nodes"`).
    ObjectWithKey(&'static str),
    /// A JSON array.
    Array,
}

impl ExpectedShape {
    fn brackets(&self) -> (char, char) {
        match self {
            ExpectedShape::ObjectWithKey(_) => ('{', '}'),
            ExpectedShape::Array => ('[', ']'),
        }
    }
}

/// Why coercion failed. Callers map every variant to the same empty default
/// (the caller of the caller never learns whether the model declined or
/// produced garbage), but the cause stays distinguishable for logging and
/// tests.
#[derive(Debug, thiserror::Error)]
pub enum CoerceError {
    #[error("response is not valid JSON: {0}")]
    ParseFailed(#[from] serde_json::Error),

    #[error("parsed JSON does not match the expected top-level shape")]
    ShapeMismatch,
}

/// Coerce a raw model reply into a parsed JSON value of the expected shape.
///
/// Steps, in order:
/// 1. strip markdown code-fence markers;
/// 2. normalize single quotes to double quotes (lossy when a quoted value
///    legitimately contains an apostrophe; known limitation, kept for parity
///    with observed model output handling);
/// 3. slice from the first opening bracket of the expected kind to the last
///    closing one, dropping surrounding commentary. If no such pair exists
///    the whole cleaned string is attempted as-is.
pub fn coerce(raw: &str, shape: ExpectedShape) -> Result<Value, CoerceError> {
    let cleaned = strip_code_fences(raw);
    let cleaned = cleaned.replace('\'', "\"");
    let candidate = slice_to_bracket_pair(&cleaned, shape);

    debug!(
        candidate_length = candidate.len(),
        shape = ?shape,
        "Attempting to parse coerced model output"
    );

    let value: Value = serde_json::from_str(candidate)?;

    match shape {
        ExpectedShape::ObjectWithKey(key) => {
            if value.as_object().is_some_and(|obj| obj.contains_key(key)) {
                Ok(value)
            } else {
                Err(CoerceError::ShapeMismatch)
            }
        }
        ExpectedShape::Array => {
            if value.is_array() {
                Ok(value)
            } else {
                Err(CoerceError::ShapeMismatch)
            }
        }
    }
}

fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Slice to the outermost bracket pair of the expected kind. Uses the first
/// opening and last closing bracket, so trailing prose that itself contains
/// brackets can over-slice; that mirrors the tolerance contract.
fn slice_to_bracket_pair(cleaned: &str, shape: ExpectedShape) -> &str {
    let (open, close) = shape.brackets();
    match (cleaned.find(open), cleaned.rfind(close)) {
        (Some(start), Some(end)) if end > start => &cleaned[start..=end],
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_strict_json_unchanged() {
        let value = coerce(r#"{"nodes": [], "edges": []}"#, ExpectedShape::ObjectWithKey("nodes"))
            .unwrap();
        assert_eq!(value, json!({"nodes": [], "edges": []}));
    }

    #[test]
    fn fenced_json_with_commentary_equals_strict_json() {
        let strict = r#"{"nodes": [{"id": "1", "label": "Start"}], "edges": []}"#;
        let noisy = format!(
            "Here is the flowchart you asked for:\n```json\n{}\n```\nLet me know if you need changes.",
            strict
        );

        let from_strict = coerce(strict, ExpectedShape::ObjectWithKey("nodes")).unwrap();
        let from_noisy = coerce(&noisy, ExpectedShape::ObjectWithKey("nodes")).unwrap();
        assert_eq!(from_strict, from_noisy);
    }

    #[test]
    fn normalizes_single_quotes() {
        let value = coerce(
            "{'nodes': [{'id': '1', 'label': 'Start'}], 'edges': []}",
            ExpectedShape::ObjectWithKey("nodes"),
        )
        .unwrap();
        assert_eq!(value["nodes"][0]["label"], "Start");
    }

    #[test]
    fn apostrophe_inside_value_is_lossy() {
        // Known limitation: the quote normalization has no escaping logic, so
        // an apostrophe in the content corrupts the slice.
        let result = coerce(
            "{'nodes': [{'id': '1', 'label': 'Ohm's law'}], 'edges': []}",
            ExpectedShape::ObjectWithKey("nodes"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn slices_past_leading_and_trailing_prose() {
        let raw = "Sure! [\"A\", \"B\"] hope that helps";
        let value = coerce(raw, ExpectedShape::Array).unwrap();
        assert_eq!(value, json!(["A", "B"]));
    }

    #[test]
    fn no_bracket_pair_is_parse_failure() {
        let result = coerce("the model declined to answer", ExpectedShape::Array);
        assert!(matches!(result, Err(CoerceError::ParseFailed(_))));
    }

    #[test]
    fn invalid_json_inside_slice_is_parse_failure() {
        let result = coerce("{not json at all}", ExpectedShape::ObjectWithKey("nodes"));
        assert!(matches!(result, Err(CoerceError::ParseFailed(_))));
    }

    #[test]
    fn object_missing_required_key_is_shape_mismatch() {
        let result = coerce(r#"{"steps": []}"#, ExpectedShape::ObjectWithKey("nodes"));
        assert!(matches!(result, Err(CoerceError::ShapeMismatch)));
    }

    #[test]
    fn object_where_array_expected_is_shape_mismatch() {
        let result = coerce(r#"{"nodes": []}"#, ExpectedShape::Array);
        assert!(matches!(result, Err(CoerceError::ShapeMismatch)));
    }

    #[test]
    fn trailing_prose_with_braces_over_slices() {
        // First-open to last-close slicing grabs the brace in the trailing
        // prose too, which breaks the parse. The tolerance contract accepts
        // this: the caller degrades to the empty default.
        let raw = r#"{"nodes": []} and {another pair}"#;
        let result = coerce(raw, ExpectedShape::ObjectWithKey("nodes"));
        assert!(result.is_err());
    }
}
