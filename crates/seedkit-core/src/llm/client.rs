//! # LLM API Client
//!
//! Sends column batch-fill requests to Claude or OpenAI and returns the raw
//! response text. Supports auto-detection of the API key from environment
//! variables and optional model overrides via `--model`.

use crate::error::{Result, SeedKitError};

/// Supported LLM providers.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Claude { api_key: String, model: String },
    OpenAI { api_key: String, model: String },
}

impl LlmProvider {
    /// Auto-detect provider from environment variables.
    ///
    /// Checks `ANTHROPIC_API_KEY` first, then `OPENAI_API_KEY`. Falls back to
    /// a sensible default model for each provider unless `model_override` is
    /// specified.
    pub fn from_env(model_override: Option<&str>) -> Result<Self> {
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            return Ok(LlmProvider::Claude {
                api_key: key,
                model: model_override
                    .unwrap_or("claude-sonnet-4-20250514")
                    .to_string(),
            });
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            return Ok(LlmProvider::OpenAI {
                api_key: key,
                model: model_override.unwrap_or("gpt-4o").to_string(),
            });
        }

        Err(SeedKitError::LlmError {
            message: "No LLM API key found. Set ANTHROPIC_API_KEY or OPENAI_API_KEY environment variable.".to_string(),
        })
    }

    /// Send a batch-fill prompt to the LLM and return the raw response text.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        match self {
            LlmProvider::Claude { api_key, model } => call_claude(api_key, model, prompt).await,
            LlmProvider::OpenAI { api_key, model } => call_openai(api_key, model, prompt).await,
        }
    }
}

/// Maximum time to wait for an LLM API response before aborting.
const API_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(45);

/// Build an HTTP client with a strict timeout so requests never hang
/// indefinitely on flaky networks or partial API outages.
fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(API_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Call the Anthropic Messages API.
///
/// Uses assistant pre-fill (`{"values": [`) to force Claude to start its
/// response mid-object, avoiding markdown fences or preamble text.
async fn call_claude(api_key: &str, model: &str, prompt: &str) -> Result<String> {
    let client = build_http_client();
    const PREFILL: &str = r#"{"values": ["#;

    let body = serde_json::json!({
        "model": model,
        "max_tokens": 2048,
        "messages": [
            {
                "role": "user",
                "content": prompt
            },
            {
                "role": "assistant",
                "content": PREFILL
            }
        ]
    });

    let response = client
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", api_key)
        .header("anthropic-version", "2023-06-01")
        .header("content-type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| SeedKitError::LlmError {
            message: format!("Failed to call Claude API: {}", e),
        })?;

    let status = response.status();
    let response_text = response.text().await.map_err(|e| SeedKitError::LlmError {
        message: format!("Failed to read Claude API response: {}", e),
    })?;

    if !status.is_success() {
        return Err(SeedKitError::LlmError {
            message: format!(
                "Claude API returned {}: {}",
                status,
                truncate(&response_text, 500),
            ),
        });
    }

    let parsed: serde_json::Value =
        serde_json::from_str(&response_text).map_err(|e| SeedKitError::LlmError {
            message: format!("Failed to parse Claude API response JSON: {}", e),
        })?;

    let text = parsed["content"]
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|block| block["text"].as_str())
        .ok_or_else(|| SeedKitError::LlmError {
            message: "Claude API response missing content[0].text".to_string(),
        })?;

    // Prepend the pre-fill since Claude's response continues from that
    // point (the pre-fill text isn't included in the returned content).
    let full = format!("{}{}", PREFILL, text);
    let wrapped: serde_json::Value =
        serde_json::from_str(&full).map_err(|e| SeedKitError::LlmError {
            message: format!("Failed to parse Claude API content as JSON: {}", e),
        })?;
    let values = wrapped
        .get("values")
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    Ok(values.to_string())
}

/// Call the OpenAI Chat Completions API.
///
/// `response_format: json_object` only accepts a top-level object, so the
/// prompt asks for `{"values": [...]}` and this unwraps it before returning,
/// giving callers the same bare-array shape as the Claude path.
async fn call_openai(api_key: &str, model: &str, prompt: &str) -> Result<String> {
    let client = build_http_client();

    let body = serde_json::json!({
        "model": model,
        "messages": [
            {
                "role": "user",
                "content": prompt
            }
        ],
        "max_tokens": 2048,
        "response_format": { "type": "json_object" }
    });

    let response = client
        .post("https://api.openai.com/v1/chat/completions")
        .header("Authorization", format!("Bearer {}", api_key))
        .header("content-type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| SeedKitError::LlmError {
            message: format!("Failed to call OpenAI API: {}", e),
        })?;

    let status = response.status();
    let response_text = response.text().await.map_err(|e| SeedKitError::LlmError {
        message: format!("Failed to read OpenAI API response: {}", e),
    })?;

    if !status.is_success() {
        return Err(SeedKitError::LlmError {
            message: format!(
                "OpenAI API returned {}: {}",
                status,
                truncate(&response_text, 500),
            ),
        });
    }

    let parsed: serde_json::Value =
        serde_json::from_str(&response_text).map_err(|e| SeedKitError::LlmError {
            message: format!("Failed to parse OpenAI API response JSON: {}", e),
        })?;

    let text = parsed["choices"]
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(|choice| choice["message"]["content"].as_str())
        .ok_or_else(|| SeedKitError::LlmError {
            message: "OpenAI API response missing choices[0].message.content".to_string(),
        })?;

    let wrapped: serde_json::Value =
        serde_json::from_str(text).map_err(|e| SeedKitError::LlmError {
            message: format!("Failed to parse OpenAI content as JSON: {}", e),
        })?;
    let values = wrapped
        .get("values")
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    Ok(values.to_string())
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
    fn test_from_env_no_keys() {
        let anthropic = std::env::var("ANTHROPIC_API_KEY").ok();
        let openai = std::env::var("OPENAI_API_KEY").ok();
        std::env::remove_var("ANTHROPIC_API_KEY");
        std::env::remove_var("OPENAI_API_KEY");

        let result = LlmProvider::from_env(None);
        assert!(result.is_err());

        if let Some(k) = anthropic {
            std::env::set_var("ANTHROPIC_API_KEY", k);
        }
        if let Some(k) = openai {
            std::env::set_var("OPENAI_API_KEY", k);
        }
    }

    #[test]
    fn test_from_env_anthropic() {
        let original = std::env::var("ANTHROPIC_API_KEY").ok();
        std::env::set_var("ANTHROPIC_API_KEY", "test-key-123");

        let provider = LlmProvider::from_env(None).unwrap();
        match provider {
            LlmProvider::Claude { api_key, model } => {
                assert_eq!(api_key, "test-key-123");
                assert!(model.contains("claude"));
            }
            _ => panic!("Expected Claude provider"),
        }

        match original {
            Some(k) => std::env::set_var("ANTHROPIC_API_KEY", k),
            None => std::env::remove_var("ANTHROPIC_API_KEY"),
        }
    }

    #[test]
    fn test_from_env_model_override() {
        let original = std::env::var("ANTHROPIC_API_KEY").ok();
        std::env::set_var("ANTHROPIC_API_KEY", "test-key");

        let provider = LlmProvider::from_env(Some("claude-opus-4-20250514")).unwrap();
        match provider {
            LlmProvider::Claude { model, .. } => {
                assert_eq!(model, "claude-opus-4-20250514");
            }
            _ => panic!("Expected Claude provider"),
        }

        match original {
            Some(k) => std::env::set_var("ANTHROPIC_API_KEY", k),
            None => std::env::remove_var("ANTHROPIC_API_KEY"),
        }
    }

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long() {
        assert_eq!(truncate("hello world", 5), "hello");
    }

    #[test]
    fn test_http_client_has_timeout() {
        let client = build_http_client();
        assert!(std::mem::size_of_val(&client) > 0);
    }
}
