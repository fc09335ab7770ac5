use super::errors::{Result, SyncError};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const GEMINI_API: &str = "https://generativelanguage.googleapis.com";

/// Marker the model is asked to answer with when it cannot summarize a diff.
pub const SYNTAX_ERROR_MARKER: &str = "SYNTAX_ERROR";

/// Diffs are cut to this many characters before they are sent.
const MAX_DIFF_CHARS: usize = 30_000;

const PROMPT: &str = "Write a git commit message for the following diff. \
Answer with the message only: a short summary line, optionally followed by a blank line and \
a few bullet points. If the diff is not something you can summarize, answer exactly SYNTAX_ERROR.\n\n";

#[async_trait]
pub trait CommitMessageGenerator: Send + Sync {
    fn configure(&mut self, api_key: Option<String>, model: String);
    async fn generate_commit_message(&self, diff: &str) -> Result<String>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn first_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.iter().map(|part| part.text.as_str()).collect::<String>())
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}

/// Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct Gemini {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
}

impl Gemini {
    pub fn new(client: Client) -> Self {
        Self::with_endpoint(client, GEMINI_API)
    }

    pub fn with_endpoint(client: Client, api_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: None,
            model: String::new(),
        }
    }
}

#[async_trait]
impl CommitMessageGenerator for Gemini {
    fn configure(&mut self, api_key: Option<String>, model: String) {
        self.api_key = api_key.filter(|key| !key.is_empty());
        self.model = model;
    }

    async fn generate_commit_message(&self, diff: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(SyncError::NotConfigured("google api key"))?;

        let diff = truncate(diff, MAX_DIFF_CHARS);
        let prompt = format!("{PROMPT}{diff}");
        let url = format!("{}/v1beta/models/{}:generateContent", self.api_base, self.model);
        debug!("Asking {} for a commit message ({} diff chars)", self.model, diff.len());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&GenerateRequest {
                contents: vec![Content { parts: vec![Part { text: &prompt }] }],
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Api {
                service: "gemini",
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: GenerateResponse = response.json().await?;
        let message = body.first_text();
        if message.is_empty() {
            warn!("Gemini returned no candidate text");
        }
        Ok(message)
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
