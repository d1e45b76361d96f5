//! Data models for product rows, generated listing copy and API payloads

use serde::{Deserialize, Serialize};

/// A product row ingested from the spreadsheet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRow {
    pub name: String,
    /// Catalog identifier (GTIN/EAN), absent for unbranded goods
    pub code: Option<String>,
    pub brand: Option<String>,
    pub image_url: String,
    pub quantity: String,
    pub price: String,
    pub length: String,
    pub width: String,
    pub height: String,
    pub weight: String,
}

/// Listing copy produced by the generative API, validated by the caller
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedListing {
    pub name: String,
    pub description: String,
    pub product_type: Option<String>,
}

/// Identity endpoint response; extra fields are ignored
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Catalog search response, reduced to the match count
#[derive(Debug, Deserialize)]
pub struct CatalogSearchResult {
    #[serde(rename = "numberOfResults")]
    pub number_of_results: u64,
}

/// Chat completion request body
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub response_format: ResponseFormat,
    pub temperature: f32,
    pub max_completion_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub n: u32,
    pub store: bool,
}

/// Chat message with structured content parts
#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

/// Content part of a chat message
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
}

/// Response format specification
#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

/// Chat completion response body
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

/// Response choice
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

/// Response message; content is a JSON-encoded string needing a second parse
#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}
