//! # Batch Response Parser
//!
//! Parses the JSON value-list a provider returns for one `table.column`
//! batch-fill request.

use crate::error::{Result, SeedKitError};

/// Parse a raw LLM response into a list of generated strings.
///
/// Uses a two-tier extraction strategy since providers sometimes wrap the
/// array in markdown fences despite being asked not to:
/// 1. Markdown code fences (`\`\`\`json ... \`\`\`` or bare `\`\`\` ... \`\`\``)
/// 2. Raw trimmed response
pub fn parse_batch_response(response: &str) -> Result<Vec<String>> {
    let json_str = extract_json_array(response);

    let values: Vec<String> =
        serde_json::from_str(json_str).map_err(|e| SeedKitError::LlmError {
            message: format!(
                "Failed to parse LLM batch response as a JSON array of strings: {}. Response: {}",
                e,
                truncate(response, 200),
            ),
        })?;

    Ok(values)
}

fn extract_json_array(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }
    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    trimmed
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        &s[..max]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json_array() {
        let response = r#"["value one", "value two"]"#;
        let values = parse_batch_response(response).unwrap();
        assert_eq!(values, vec!["value one", "value two"]);
    }

    #[test]
    fn parses_markdown_fenced_json() {
        let response = "```json\n[\"a\", \"b\", \"c\"]\n```";
        let values = parse_batch_response(response).unwrap();
        assert_eq!(values, vec!["a", "b", "c"]);
    }

    #[test]
    fn parses_plain_fenced_json() {
        let response = "```\n[\"only one\"]\n```";
        let values = parse_batch_response(response).unwrap();
        assert_eq!(values, vec!["only one"]);
    }

    #[test]
    fn rejects_non_array_response() {
        let result = parse_batch_response("this is not json at all");
        assert!(result.is_err());
    }

    #[test]
    fn rejects_array_of_non_strings() {
        let result = parse_batch_response("[1, 2, 3]");
        assert!(result.is_err());
    }

    #[test]
    fn empty_array_parses_to_empty_vec() {
        let values = parse_batch_response("[]").unwrap();
        assert!(values.is_empty());
    }
}
