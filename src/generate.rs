//! Test generation through a local Ollama server.
//!
//! The prompt is posted to `{url}/api/generate` with streaming enabled. Each
//! streamed chunk is forwarded to a sink as it arrives; the full completion
//! is then stripped of the echoed prompt and reduced to its first fenced
//! code block.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MODEL: &str = "llama2";
pub const DEFAULT_URL: &str = "http://localhost:11434";
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\n?(.*?)```").unwrap());

/// Errors from the generation backend.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("generation server returned HTTP {0}")]
    Status(u16),
    #[error("malformed response chunk: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("model error: {0}")]
    Model(String),
    #[error("cannot start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Produces a unit test from a prompt.
pub trait Generator {
    /// Generate a completion, passing streamed text to `sink` as it arrives.
    /// Returns the extracted test code.
    fn generate(&self, prompt: &str, sink: &mut dyn FnMut(&str)) -> Result<String, GenerateError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Client for Ollama's generate endpoint.
pub struct OllamaGenerator {
    http: reqwest::Client,
    url: String,
    model: String,
    temperature: f32,
    show_progress: bool,
}

impl OllamaGenerator {
    pub fn new(url: Option<&str>, model: Option<&str>) -> Result<Self, GenerateError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("dolphin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            url: url
                .filter(|u| !u.is_empty())
                .unwrap_or(DEFAULT_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_MODEL)
                .to_string(),
            temperature: DEFAULT_TEMPERATURE,
            show_progress: true,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Disable the spinner shown while waiting for the first token.
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn stream(
        &self,
        prompt: &str,
        sink: &mut dyn FnMut(&str),
    ) -> Result<String, GenerateError> {
        let endpoint = format!("{}/api/generate", self.url);
        tracing::debug!(
            "posting prompt ({} bytes) to {} with model {}",
            prompt.len(),
            endpoint,
            self.model
        );

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: true,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let spinner = self.spinner();
        let mut response = self.http.post(&endpoint).json(&request).send().await?;
        if !response.status().is_success() {
            spinner.finish_and_clear();
            return Err(GenerateError::Status(response.status().as_u16()));
        }

        let mut completion = String::new();
        let mut pending: Vec<u8> = Vec::new();
        let mut done = false;

        while !done {
            let Some(bytes) = response.chunk().await? else {
                break;
            };
            pending.extend_from_slice(&bytes);

            while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = pending.drain(..=pos).collect();
                if let Some(chunk) = decode_line(&line)? {
                    spinner.finish_and_clear();
                    sink(&chunk.response);
                    completion.push_str(&chunk.response);
                    done = chunk.done;
                }
            }
        }

        if !done {
            if let Some(chunk) = decode_line(&pending)? {
                sink(&chunk.response);
                completion.push_str(&chunk.response);
            }
        }

        spinner.finish_and_clear();
        Ok(completion)
    }

    fn spinner(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        pb.set_message(format!("waiting for {}", self.model));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

impl Generator for OllamaGenerator {
    fn generate(&self, prompt: &str, sink: &mut dyn FnMut(&str)) -> Result<String, GenerateError> {
        let runtime = tokio::runtime::Runtime::new()?;
        let completion = runtime.block_on(self.stream(prompt, sink))?;
        Ok(extract_code(&completion.replace(prompt, "")))
    }
}

/// Decode one NDJSON line; blank lines yield nothing.
fn decode_line(line: &[u8]) -> Result<Option<GenerateChunk>, GenerateError> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let mut chunk: GenerateChunk = serde_json::from_str(text)?;
    if let Some(message) = chunk.error.take() {
        return Err(GenerateError::Model(message));
    }
    Ok(Some(chunk))
}

/// Reduce a completion to the body of its first fenced code block.
///
/// An unterminated fence yields everything after it; no fence at all yields
/// the completion unchanged.
pub fn extract_code(completion: &str) -> String {
    if let Some(caps) = FENCED_BLOCK.captures(completion) {
        return caps[1].to_string();
    }
    match completion.split_once("```") {
        Some((_, rest)) => rest.to_string(),
        None => completion.to_string(),
    }
}
