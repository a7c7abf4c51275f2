//! Single-shot LLM chat wrapper with lenient JSON extraction. Request
//! shape follows `OpenAICompatibleProvider`; the three-stage lenient
//! parse (fence-strip, balanced-array, balanced-object) tolerates chat
//! responses that don't come back as clean JSON.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use wayfare_cache::{CacheClient, CacheNamespace};

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Clone)]
pub struct LlmClient {
    cache: Arc<CacheClient>,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>, model: impl Into<String>, cache: Arc<CacheClient>) -> Self {
        Self {
            cache,
            api_key,
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().map(|k| !k.trim().is_empty()).unwrap_or(false)
    }

    /// Single chat-completion call at low temperature. Returns the raw
    /// text content, or `None` on any failure (missing credentials,
    /// transport error, malformed response) — callers fall back to
    /// heuristics, never panic.
    pub async fn complete(&self, messages: &[ChatMessage], json_mode: bool) -> Option<String> {
        let api_key = self.api_key.as_ref()?;
        if api_key.trim().is_empty() {
            return None;
        }

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": 0.2,
        });
        if json_mode {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        let headers = vec![("Authorization".to_string(), format!("Bearer {api_key}"))];
        let url = format!("{}/chat/completions", self.base_url);

        let doc = self.cache.post(CacheNamespace::Generic, &url, &body, &headers).await.ok()?;
        let parsed: ChatResponse = serde_json::from_value(doc).ok()?;
        parsed.choices.into_iter().next()?.message.content
    }
}

/// Three-stage lenient JSON extraction: (1) strip a Markdown fence if
/// present, (2) try parsing the outermost balanced `[...]`, (3) try the
/// outermost balanced `{...}`. Fails soft to `None` rather than raising.
pub fn lenient_parse_json(raw: &str) -> Option<Value> {
    let stripped = strip_fences(raw);
    let trimmed = stripped.trim();

    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        return Some(v);
    }
    if let Some(array_slice) = extract_balanced(trimmed, '[', ']') {
        if let Ok(v) = serde_json::from_str::<Value>(array_slice) {
            return Some(v);
        }
    }
    if let Some(obj_slice) = extract_balanced(trimmed, '{', '}') {
        if let Ok(v) = serde_json::from_str::<Value>(obj_slice) {
            return Some(v);
        }
    }
    None
}

fn strip_fences(raw: &str) -> String {
    let fence = Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap();
    if let Some(caps) = fence.captures(raw) {
        if let Some(m) = caps.get(1) {
            return m.as_str().to_string();
        }
    }
    raw.to_string()
}

fn extract_balanced(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0i32;
    for (offset, ch) in text[start..].char_indices() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                return Some(&text[start..start + offset + ch.len_utf8()]);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache() -> Arc<CacheClient> {
        Arc::new(CacheClient::in_memory())
    }

    #[test]
    fn parses_plain_json() {
        let v = lenient_parse_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn strips_markdown_fence() {
        let raw = "```json\n{\"a\": 1}\n```";
        let v = lenient_parse_json(raw).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn extracts_array_from_prose() {
        let raw = "Here is the plan: [1, 2, 3] — hope that helps.";
        let v = lenient_parse_json(raw).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 3);
    }

    #[test]
    fn fails_soft_on_garbage() {
        assert!(lenient_parse_json("not json at all").is_none());
    }

    #[tokio::test]
    async fn unconfigured_client_completes_to_none() {
        let client = LlmClient::new(None, "https://example.invalid", "gpt-4o-mini", test_cache());
        assert!(!client.is_configured());
    }
}
