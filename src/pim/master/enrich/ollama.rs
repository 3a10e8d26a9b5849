use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{instrument, warn};

use crate::pim::master::config::EnrichmentConfig;
use crate::pim::master::enrich::{DescriptionGenerator, build_prompt};
use crate::pim::master::error::{PimError, Result};

/// Blocking client for the Ollama `/api/chat` endpoint.
pub struct OllamaGenerator {
    http: reqwest::blocking::Client,
    url: String,
    model: String,
    system_prompt: String,
    prompt_template: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl OllamaGenerator {
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("pim-master/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: format!("{}/api/chat", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            prompt_template: config.prompt_template.clone(),
        })
    }
}

impl DescriptionGenerator for OllamaGenerator {
    #[instrument(level = "debug", skip_all, fields(model = %self.model))]
    fn generate(&self, desc_a: &str, desc_b: &str) -> Result<String> {
        let prompt = build_prompt(&self.prompt_template, desc_a, desc_b);
        let request = ChatRequest {
            model: &self.model,
            stream: false,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
        };

        let response = self.http.post(&self.url).json(&request).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(PimError::Enrichment(format!("{status}: {body}")));
        }
        Ok(extract_content(&body))
    }
}

/// Pulls `message.content` out of a chat response body, trimmed.
///
/// A body of any other shape is returned as-is after a warning, so a single
/// odd response does not stop the pass.
pub fn extract_content(body: &str) -> String {
    let content = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        json.get("message")
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .map(|content| content.trim().to_string())
    });

    content.unwrap_or_else(|| {
        warn!("unexpected chat response format, returning raw body");
        body.to_string()
    })
}
