//! Blocking client for an OpenAI Responses-style translation endpoint.
//!
//! The request constrains output to a strict JSON schema of
//! `{source, target}` pairs so association survives reordering by the
//! model. Any transport-level problem maps to a fatal `TranslateError`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{BatchRequest, TranslateError, TranslationProvider};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/responses";
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

const SYSTEM_PROMPT: &str = "You are a professional software localization translator. \
Translate user-facing strings from source language to target language. \
Preserve placeholders exactly (%d, %@, %1$d), Swift interpolation tokens like \\(...), \
units (°F/°C), and punctuation. Return only valid JSON matching schema.";

pub struct OpenAiProvider {
    api_key: String,
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, TranslateError> {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_MS)
    }

    pub fn with_endpoint(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<Self, TranslateError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            client,
        })
    }

    fn request_body(&self, req: &BatchRequest<'_>) -> serde_json::Value {
        let schema = json!({
            "type": "object",
            "properties": {
                "translations": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "source": {"type": "string"},
                            "target": {"type": "string"},
                        },
                        "required": ["source", "target"],
                        "additionalProperties": false,
                    },
                }
            },
            "required": ["translations"],
            "additionalProperties": false,
        });

        let user_payload = json!({
            "source_language": req.source_lang,
            "target_language": req.target_lang,
            "strings": req.sources,
            "validation_feedback": req.validation_feedback,
        });

        json!({
            "model": req.model,
            "temperature": 0,
            "input": [
                {
                    "role": "system",
                    "content": [{"type": "input_text", "text": SYSTEM_PROMPT}],
                },
                {
                    "role": "user",
                    "content": [{"type": "input_text", "text": user_payload.to_string()}],
                },
            ],
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": "translations",
                    "strict": true,
                    "schema": schema,
                }
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    content: Vec<ContentItem>,
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranslationsPayload {
    #[serde(default)]
    translations: Vec<TranslationPair>,
}

#[derive(Debug, Deserialize)]
struct TranslationPair {
    source: String,
    target: String,
}

fn output_text(envelope: &ResponseEnvelope) -> String {
    if let Some(text) = envelope.output_text.as_deref() {
        if !text.trim().is_empty() {
            return text.to_string();
        }
    }
    let mut chunks: Vec<&str> = Vec::new();
    for item in &envelope.output {
        if item.kind.as_deref() != Some("message") {
            continue;
        }
        for content in &item.content {
            if matches!(content.kind.as_deref(), Some("output_text") | Some("text")) {
                if let Some(text) = content.text.as_deref() {
                    if !text.is_empty() {
                        chunks.push(text);
                    }
                }
            }
        }
    }
    chunks.join("\n")
}

impl TranslationProvider for OpenAiProvider {
    fn translate(
        &self,
        req: &BatchRequest<'_>,
    ) -> Result<std::collections::HashMap<String, String>, TranslateError> {
        debug!(
            event = "openai_request",
            model = req.model,
            strings = req.sources.len(),
            has_feedback = req.validation_feedback.is_some()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(req))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(TranslateError::Http {
                status: status.as_u16(),
                detail,
            });
        }

        let envelope: ResponseEnvelope = response
            .json()
            .map_err(|e| TranslateError::MalformedResponse(e.to_string()))?;
        let text = output_text(&envelope);
        if text.trim().is_empty() {
            return Err(TranslateError::EmptyResponse);
        }

        let parsed: TranslationsPayload = serde_json::from_str(text.trim()).map_err(|e| {
            let sample: String = text.chars().take(500).collect();
            TranslateError::MalformedResponse(format!("{e}: {sample}"))
        })?;

        Ok(parsed
            .translations
            .into_iter()
            .map(|p| (p.source, p.target))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_text_prefers_the_top_level_field() {
        let envelope: ResponseEnvelope = serde_json::from_value(serde_json::json!({
            "output_text": "{\"translations\":[]}",
            "output": [],
        }))
        .unwrap();
        assert_eq!(output_text(&envelope), "{\"translations\":[]}");
    }

    #[test]
    fn output_text_falls_back_to_message_content_chunks() {
        let envelope: ResponseEnvelope = serde_json::from_value(serde_json::json!({
            "output": [
                {"type": "reasoning", "content": [{"type": "text", "text": "skip me"}]},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "{\"translations\":"},
                    {"type": "text", "text": "[]}"},
                ]},
            ],
        }))
        .unwrap();
        assert_eq!(output_text(&envelope), "{\"translations\":\n[]}");
    }
}
