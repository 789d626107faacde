//! External collaborator traits — completion, extraction, and search.
//!
//! These services live outside the knowledge core; their only relevant
//! surface here is "accepts a prompt/text/file, returns text or a vector".
//! Implementations are injected behind `Arc<dyn ...>`; the chat pipeline
//! performs a single attempt per call with no retry or cancellation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExternalServiceError;
use crate::message::{Message, Role};

/// One turn of the prompt handed to the completion collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTurn {
    pub role: Role,
    pub content: String,
}

impl PromptTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

impl From<&Message> for PromptTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// A completion request: `(model, messages, temperature) → assistant text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<PromptTurn>,
    pub temperature: f32,
}

/// The completion collaborator.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// A human-readable name for this provider.
    fn name(&self) -> &str;

    /// Send a request and get the assistant's text back.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<String, ExternalServiceError>;
}

/// Input to the extraction collaborator: raw text or an uploaded file.
#[derive(Debug, Clone)]
pub enum ExtractionSource {
    Text(String),
    File { name: String, url: String },
}

/// Extraction output: plain text plus an optional embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<f32>>,
}

/// The content-extraction collaborator.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    fn name(&self) -> &str;

    async fn extract(
        &self,
        source: ExtractionSource,
    ) -> std::result::Result<ExtractedContent, ExternalServiceError>;
}

/// Options for a search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum number of results
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

/// A single ranked search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub score: f32,
}

/// The search collaborator.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> std::result::Result<Vec<SearchHit>, ExternalServiceError>;
}
