//! Ollama wire types.

use serde::{Deserialize, Serialize};

/// `POST /api/generate` body.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub system: &'a str,
    pub stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    #[serde(default)]
    pub eval_count: Option<u32>,
}

impl GenerateResponse {
    /// Prompt plus completion tokens, if Ollama reported either.
    pub fn total_tokens(&self) -> Option<u32> {
        match (self.prompt_eval_count, self.eval_count) {
            (None, None) => None,
            (prompt, eval) => Some(prompt.unwrap_or(0).saturating_add(eval.unwrap_or(0))),
        }
    }
}

/// `{"error": "..."}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<String>,
}

/// `GET /api/tags` response.
#[derive(Debug, Clone, Deserialize)]
pub struct TagList {
    pub models: Vec<TagEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagEntry {
    pub name: String,
}
