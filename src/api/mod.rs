//! Payload types for the Ollama daemon API.
//!
//! Two endpoints are used: `POST /api/chat` with `stream: true`, which
//! yields newline-delimited JSON objects (one [`ChatChunk`] per line,
//! terminated by a line with `done: true`), and `GET /api/tags`, which
//! lists the locally available models. Neither endpoint takes
//! authentication headers.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

/// One incremental fragment of the assistant's reply.
#[derive(Deserialize)]
pub struct ChatChunkMessage {
    #[serde(default)]
    #[allow(dead_code)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// One NDJSON line of a streaming `/api/chat` response.
#[derive(Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub message: Option<ChatChunkMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub done_reason: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[allow(dead_code)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Response body of `GET /api/tags`.
#[derive(Deserialize)]
pub struct TagsResponse {
    pub models: Vec<ModelInfo>,
}

pub mod models;
