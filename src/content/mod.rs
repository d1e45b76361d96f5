//! Client for the generative listing-copy API.
//!
//! Every call waits on the rate limit gate first and feeds the response's
//! quota headers back into the governor afterwards, so the next call
//! self-throttles without this client ever sleeping inline.

use reqwest::Client;
use reqwest::header::HeaderMap;
use std::time::Duration;
use tracing::debug;

use crate::config::{ContentConfig, GenerationParams};
use crate::error::Error;
use crate::governor::{QuotaSnapshot, RateLimitGovernor};
use crate::models::{ChatMessage, ChatRequest, ChatResponse, ContentPart, ResponseFormat};

const CONTENT_URL: &str = "https://api.openai.com/v1/chat/completions";

const LIMIT_HEADER: &str = "x-ratelimit-limit-tokens";
const REMAINING_HEADER: &str = "x-ratelimit-remaining-tokens";
const RESET_HEADER: &str = "x-ratelimit-reset-tokens";

/// Instructions for turning a raw product row into listing copy. The copy
/// itself is written in Brazilian Portuguese for the target marketplace.
const SYSTEM_PROMPT: &str = "You will receive a JSON object describing a product: \
name, description, brand, barcode and physical dimensions. Using what you know \
about products of this kind, write marketplace listing copy in Brazilian \
Portuguese: a short, objective description suitable for the product page and an \
attractive display name that customers will understand at a glance, plus the \
product type. Respond with a JSON object of the form \
{\"product_type\": \"...\", \"name\": \"...\", \"description\": \"...\"}.";

pub struct ContentClient {
    client: Client,
    api_url: String,
    api_key: String,
    params: GenerationParams,
    governor: RateLimitGovernor,
}

impl ContentClient {
    pub fn new(config: &ContentConfig, governor: RateLimitGovernor) -> Self {
        Self::with_url(config, governor, CONTENT_URL.to_string())
    }

    /// Creates a client against a custom completions endpoint.
    pub fn with_url(config: &ContentConfig, governor: RateLimitGovernor, api_url: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key: config.api_key.clone(),
            params: config.params.clone(),
            governor,
        }
    }

    /// Generates listing copy from a free-text seed.
    ///
    /// Returns the generated payload as a JSON value; validating its schema
    /// is the caller's job. No retries happen here.
    pub async fn generate(&self, seed: &str) -> Result<serde_json::Value, Error> {
        // Double quotes would corrupt the request encoding downstream.
        let seed = seed.replace('"', "'");

        self.governor.await_gate().await;

        let request = self.build_request(&seed);
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        match quota_snapshot(response.headers()) {
            Some(snapshot) => {
                self.governor.observe(snapshot).await;
                if !self.governor.gate_open() {
                    debug!("Rate limit gate closed until the quota window resets");
                }
            }
            None => debug!("Quota headers missing or unparseable, leaving gate open"),
        }

        let text = response.text().await?;
        let body: ChatResponse = serde_json::from_str(&text)?;
        let content = body
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or_else(|| Error::Parse("response contained no content choice".to_string()))?;

        // The generated payload arrives as a JSON-encoded string.
        let payload = serde_json::from_str(content)?;
        Ok(payload)
    }

    fn build_request(&self, seed: &str) -> ChatRequest {
        ChatRequest {
            model: self.params.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: vec![ContentPart::Text {
                        text: SYSTEM_PROMPT.to_string(),
                    }],
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: vec![ContentPart::Text {
                        text: seed.to_string(),
                    }],
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
            temperature: self.params.temperature,
            max_completion_tokens: self.params.max_completion_tokens,
            top_p: self.params.top_p,
            frequency_penalty: self.params.frequency_penalty,
            presence_penalty: self.params.presence_penalty,
            n: self.params.n,
            store: self.params.store,
        }
    }
}

/// Reads the quota triple from the rate limit headers. Any missing or
/// unparseable header yields `None` and the gate stays open.
fn quota_snapshot(headers: &HeaderMap) -> Option<QuotaSnapshot> {
    let limit = header_u64(headers, LIMIT_HEADER)?;
    let remaining = header_u64(headers, REMAINING_HEADER)?;
    let reset_after = parse_reset(headers.get(RESET_HEADER)?.to_str().ok()?)?;

    Some(QuotaSnapshot {
        limit,
        remaining,
        reset_after,
    })
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Parses the reset header's `"<seconds>s"` format, e.g. `"1.5s"`.
fn parse_reset(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().strip_suffix('s')?.parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(secs))
}
