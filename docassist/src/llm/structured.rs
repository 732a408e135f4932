//! Structured output: pull a JSON object out of model text and deserialize it.
//!
//! Models wrap JSON in prose or ```json fences. `extract_json` finds the
//! outermost `{ ... }` span; `parse_structured` deserializes it.

use serde::de::DeserializeOwned;

use crate::error::AgentError;
use crate::llm::LlmClient;
use crate::message::Message;

/// Returns the first balanced `{...}` span in `text`, honoring JSON strings.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Deserializes the JSON object embedded in `text` into `T`.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, AgentError> {
    let json = extract_json(text).ok_or_else(|| {
        AgentError::ExecutionFailed("structured output: no JSON object in response".into())
    })?;
    serde_json::from_str(json)
        .map_err(|e| AgentError::ExecutionFailed(format!("structured output: {}", e)))
}

/// Invokes `llm` and parses its reply as `T`. Returns the raw text alongside
/// the parse result so callers can fall back to it.
pub async fn invoke_structured<T: DeserializeOwned>(
    llm: &dyn LlmClient,
    messages: &[Message],
) -> Result<(String, Result<T, AgentError>), AgentError> {
    let response = llm.invoke(messages).await?;
    let parsed = parse_structured(&response.content);
    if let Err(ref e) = parsed {
        tracing::debug!(error = %e, "structured output did not parse");
    }
    Ok((response.content, parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Label {
        intent_type: String,
        confidence: f64,
    }

    /// **Scenario**: JSON inside a fenced block surrounded by prose is found.
    #[test]
    fn extracts_from_code_fence() {
        let text = "Sure!\n```json\n{\"intent_type\": \"qa\", \"confidence\": 0.9}\n```\nDone.";
        let label: Label = parse_structured(text).unwrap();
        assert_eq!(label.intent_type, "qa");
    }

    /// **Scenario**: Braces inside string values do not end the object early.
    #[test]
    fn braces_in_strings_are_ignored() {
        let text = r#"{"a": "x}y", "b": {"c": 1}} trailing"#;
        assert_eq!(extract_json(text), Some(r#"{"a": "x}y", "b": {"c": 1}}"#));
    }

    /// **Scenario**: Text with no object, or an unbalanced one, is an error.
    #[test]
    fn missing_or_unbalanced_object_fails() {
        assert!(parse_structured::<Label>("no json here").is_err());
        assert!(extract_json("{\"a\": 1").is_none());
        assert!(parse_structured::<Label>("{\"other\": 1}").is_err());
    }
}
