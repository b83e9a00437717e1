use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::error::{CorepError, Result};

const JSON_INSTRUCTION: &str =
    "\n\nIMPORTANT: Output ONLY valid JSON code. Do not include any other text.";

/// External model that answers a system instruction plus a user prompt.
pub trait Generator: Send + Sync {
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: RequestConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct RequestConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Blocking client for the Gemini `generateContent` REST method.
pub struct GeminiClient {
    client: reqwest::blocking::Client,
    config: GenerationConfig,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            CorepError::Config(
                "Gemini API key not set. Set GEMINI_API_KEY environment variable.".to_string(),
            )
        })?;

        Ok(GeminiClient {
            client: reqwest::blocking::Client::new(),
            config,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl Generator for GeminiClient {
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        if user_prompt.trim().is_empty() {
            return Err(CorepError::GenerationUnavailable(
                "prompt cannot be empty".to_string(),
            ));
        }

        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![RequestPart {
                    text: system_prompt,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![RequestPart { text: user_prompt }],
            }],
            generation_config: RequestConfig {
                temperature: self.config.temperature,
            },
        };

        debug!(model = %self.config.model, "calling Gemini");
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .map_err(|e| CorepError::GenerationUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CorepError::GenerationUnavailable(format!(
                "Gemini API error {status}: {body}"
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| CorepError::GenerationUnavailable(e.to_string()))?;
        response_text(parsed)
    }
}

fn response_text(response: GenerateResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(CorepError::GenerationUnavailable(
            "Gemini returned no text".to_string(),
        ));
    }
    Ok(text)
}

/// Asks for JSON-only output and parses it. Transport failures and
/// unparseable text both yield `None`.
pub fn generate_json(
    generator: &dyn Generator,
    system_prompt: &str,
    user_prompt: &str,
) -> Option<Value> {
    let full_user_prompt = format!("{user_prompt}{JSON_INSTRUCTION}");
    match generator.generate(system_prompt, &full_user_prompt) {
        Ok(text) => {
            let parsed = extract_json(&text);
            if parsed.is_none() {
                warn!(chars = text.len(), "model response contained no JSON object");
            }
            parsed
        }
        Err(e) => {
            warn!(error = %e, "generation call failed");
            None
        }
    }
}

lazy_static! {
    static ref FENCED_BLOCK: Regex =
        Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("static regex");
    static ref OBJECT_SPAN: Regex = Regex::new(r"\{[\s\S]*\}").expect("static regex");
}

/// Pulls a JSON object out of model text: a fenced block if present, else
/// the whole text, else the outermost `{...}` span.
pub fn extract_json(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }

    let candidate = FENCED_BLOCK
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| text.trim(), |m| m.as_str());

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(candidate) {
        return Some(value);
    }

    let span = OBJECT_SPAN.find(candidate)?;
    match serde_json::from_str::<Value>(span.as_str()) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Canned(std::result::Result<&'static str, &'static str>);

    impl Generator for Canned {
        fn generate(&self, _system: &str, user: &str) -> Result<String> {
            assert!(user.ends_with(JSON_INSTRUCTION));
            self.0
                .map(str::to_string)
                .map_err(|e| CorepError::GenerationUnavailable(e.to_string()))
        }
    }

    #[test]
    fn test_extract_plain_json() {
        assert_eq!(extract_json(r#" {"a": 1} "#), Some(json!({"a": 1})));
    }

    #[test]
    fn test_extract_fenced_json() {
        let text = "Here you go:\n```json\n{\"own_funds\": {\"tier_2\": 3}}\n```\nThanks";
        assert_eq!(extract_json(text), Some(json!({"own_funds": {"tier_2": 3}})));
    }

    #[test]
    fn test_extract_embedded_object() {
        let text = "Result: {\"warnings\": [\"x\"]} end";
        assert_eq!(extract_json(text), Some(json!({"warnings": ["x"]})));
    }

    #[test]
    fn test_extract_rejects_garbage_and_non_objects() {
        assert_eq!(extract_json(""), None);
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("[1, 2]"), None);
        assert_eq!(extract_json("{ broken"), None);
    }

    #[test]
    fn test_generate_json() {
        let ok = Canned(Ok("```\n{\"own_funds\": {}}\n```"));
        assert_eq!(generate_json(&ok, "sys", "user"), Some(json!({"own_funds": {}})));

        let failing = Canned(Err("quota exceeded"));
        assert_eq!(generate_json(&failing, "sys", "user"), None);
    }

    #[test]
    fn test_client_requires_api_key() {
        let err = GeminiClient::new(GenerationConfig::default()).err().unwrap();
        assert!(matches!(err, CorepError::Config(_)));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}]}}]
        }))
        .unwrap();
        assert_eq!(response_text(response).unwrap(), "{\"a\": 1}");

        let empty: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response_text(empty).is_err());
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![RequestPart { text: "sys" }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![RequestPart { text: "hi" }],
            }],
            generation_config: RequestConfig { temperature: 0.5 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["systemInstruction"], json!({"parts": [{"text": "sys"}]}));
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn test_unreachable_endpoint_is_generation_unavailable() -> Result<()> {
        let client = GeminiClient::new(GenerationConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            api_key: Some("key".to_string()),
            ..GenerationConfig::default()
        })?;
        let err = client.generate("sys", "user").unwrap_err();
        assert!(matches!(err, CorepError::GenerationUnavailable(_)));
        Ok(())
    }
}
