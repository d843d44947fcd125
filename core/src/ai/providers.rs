//! HTTP adapters for the three text-generation APIs.

use super::{GenerationParams, ProviderKind, Purpose, TextGenerator};
use crate::{
    config::ProviderConfig,
    error::{GameError, GameResult},
};
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{json, Value};
use std::time::Duration;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub fn build(
    kind: ProviderKind,
    config: &ProviderConfig,
    api_key: String,
) -> GameResult<Box<dyn TextGenerator>> {
    let http = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    let endpoint = Endpoint {
        http,
        api_base: config.api_base.trim_end_matches('/').to_string(),
        model: config.model.clone(),
        translation_model: config
            .translation_model
            .clone()
            .unwrap_or_else(|| config.model.clone()),
        api_key,
    };
    Ok(match kind {
        ProviderKind::OpenAi => Box::new(OpenAiClient(endpoint)),
        ProviderKind::HuggingFace => Box::new(HuggingFaceClient(endpoint)),
        ProviderKind::Anthropic => Box::new(AnthropicClient(endpoint)),
    })
}

struct Endpoint {
    http:              Client,
    api_base:          String,
    model:             String,
    translation_model: String,
    api_key:           String,
}

impl Endpoint {
    fn model_for(&self, params: &GenerationParams) -> &str {
        match params.purpose {
            Purpose::Scenario => &self.model,
            Purpose::Translation => &self.translation_model,
        }
    }

    /// Send `req` and decode a 2xx JSON body.
    fn send(
        &self,
        provider: &'static str,
        req: RequestBuilder,
        params: &GenerationParams,
    ) -> GameResult<Value> {
        let req = match params.timeout {
            Some(t) => req.timeout(t),
            None => req,
        };
        let resp = req.send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(GameError::ProviderStatus {
                provider,
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json()?)
    }
}

fn non_empty(provider: &'static str, text: Option<&str>) -> GameResult<String> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t.to_string()),
        _ => Err(GameError::EmptyCompletion { provider }),
    }
}

// ── OpenAI ─────────────────────────────────────────────────────────

pub struct OpenAiClient(Endpoint);

impl TextGenerator for OpenAiClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn generate(&self, prompt: &str, params: &GenerationParams) -> GameResult<String> {
        let ep = &self.0;
        let mut messages = Vec::new();
        if let Some(system) = params.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));
        let body = json!({
            "model": ep.model_for(params),
            "messages": messages,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });
        let req = ep
            .http
            .post(format!("{}/chat/completions", ep.api_base))
            .bearer_auth(&ep.api_key)
            .json(&body);
        let resp = ep.send("openai", req, params)?;
        non_empty("openai", resp["choices"][0]["message"]["content"].as_str())
    }
}

// ── Hugging Face ───────────────────────────────────────────────────

pub struct HuggingFaceClient(Endpoint);

impl TextGenerator for HuggingFaceClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::HuggingFace
    }

    fn generate(&self, prompt: &str, params: &GenerationParams) -> GameResult<String> {
        let ep = &self.0;
        let body = json!({
            "inputs": prompt,
            "parameters": {
                "temperature": params.temperature,
                "max_new_tokens": params.max_tokens,
                "return_full_text": false,
            },
        });
        let req = ep
            .http
            .post(format!("{}/{}", ep.api_base, ep.model_for(params)))
            .bearer_auth(&ep.api_key)
            .json(&body);
        let resp = ep.send("huggingface", req, params)?;
        // Either [{"generated_text": ..}] or {"generated_text": ..}
        let text = match &resp {
            Value::Array(items) => items.first().and_then(|v| v["generated_text"].as_str()),
            other => other["generated_text"].as_str(),
        };
        non_empty("huggingface", text)
    }
}

// ── Anthropic ──────────────────────────────────────────────────────

pub struct AnthropicClient(Endpoint);

impl TextGenerator for AnthropicClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn generate(&self, prompt: &str, params: &GenerationParams) -> GameResult<String> {
        let ep = &self.0;
        let mut body = json!({
            "model": ep.model_for(params),
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });
        if let Some(system) = params.system {
            body["system"] = json!(system);
        }
        let req = ep
            .http
            .post(format!("{}/messages", ep.api_base))
            .header("x-api-key", &ep.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let resp = ep.send("anthropic", req, params)?;
        non_empty("anthropic", resp["content"][0]["text"].as_str())
    }
}
