//! LLM Client
//!
//! Blocking client for an Ollama-compatible `/api/generate` endpoint, plus a
//! scripted fake for tests and offline runs.
//!
//! Endpoints used:
//! - GET / - health check
//! - GET /api/tags - list available models
//! - POST /api/generate - generate response (stream disabled)

use crate::config::ModelConfig;
use crate::error::InferenceError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Timeout for health checks and model listing (ms)
pub const HEALTH_CHECK_TIMEOUT_MS: u64 = 2000;

/// Generic text generation backend
pub trait LlmClient: Send + Sync {
    /// Send a prompt and return the complete response text
    fn generate(&self, prompt: &str) -> Result<String, InferenceError>;
}

/// Request for /api/generate
#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

/// Response from /api/generate (non-streaming)
#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Debug, Clone, Deserialize)]
struct TagModel {
    name: String,
}

/// Real client over HTTP
pub struct HttpLlmClient {
    config: ModelConfig,
    client: reqwest::blocking::Client,
}

impl HttpLlmClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn map_transport_error(&self, e: reqwest::Error) -> InferenceError {
        if e.is_timeout() {
            InferenceError::Timeout(self.config.timeout_secs)
        } else if e.is_connect() {
            InferenceError::Unavailable(e.to_string())
        } else {
            InferenceError::Http(format!("Request failed: {}", e))
        }
    }

    /// Check if the endpoint answers at all
    pub fn is_available(&self) -> bool {
        self.client
            .get(self.base_url())
            .timeout(Duration::from_millis(HEALTH_CHECK_TIMEOUT_MS))
            .send()
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }

    /// List model names known to the server
    pub fn list_models(&self) -> Result<Vec<String>, InferenceError> {
        let url = format!("{}/api/tags", self.base_url());
        let resp = self
            .client
            .get(&url)
            .timeout(Duration::from_millis(HEALTH_CHECK_TIMEOUT_MS))
            .send()
            .map_err(|e| self.map_transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            });
        }

        let tags: TagsResponse = resp
            .json()
            .map_err(|e| InferenceError::MalformedBody(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Check if the configured model has been pulled
    pub fn has_model(&self) -> Result<bool, InferenceError> {
        let models = self.list_models()?;
        Ok(model_matches(&self.config.model, &models))
    }

    fn generate_once(&self, prompt: &str) -> Result<String, InferenceError> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: self
                .config
                .temperature
                .map(|temperature| GenerateOptions { temperature }),
        };

        let url = format!("{}/api/generate", self.base_url());
        let started = Instant::now();
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| self.map_transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            // A 404 without the model's name is a wrong URL or path, not a missing model
            if status.as_u16() == 404 && body.contains(&self.config.model) {
                return Err(InferenceError::ModelNotFound(self.config.model.clone()));
            }
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().map_err(|e| self.map_transport_error(e))?;
        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| InferenceError::MalformedBody(e.to_string()))?;

        tracing::debug!(
            model = %self.config.model,
            prompt_chars = prompt.len(),
            response_chars = parsed.response.len(),
            done = parsed.done,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generation complete"
        );

        Ok(parsed.response)
    }
}

impl LlmClient for HttpLlmClient {
    fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let mut attempt: u32 = 0;
        loop {
            match self.generate_once(prompt) {
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let delay = self
                        .config
                        .retry_backoff_ms
                        .saturating_mul(1u64 << attempt.min(16));
                    tracing::warn!(attempt = attempt + 1, delay_ms = delay, error = %e, "retrying generation");
                    std::thread::sleep(Duration::from_millis(delay));
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// Model names may include :latest or other tags
pub fn model_matches(wanted: &str, available: &[String]) -> bool {
    let wanted_base = wanted.split(':').next().unwrap_or(wanted);
    let wanted_has_tag = wanted.contains(':');
    available.iter().any(|m| {
        if m == wanted {
            return true;
        }
        let m_base = m.split(':').next().unwrap_or(m);
        !wanted_has_tag && m_base == wanted_base
    })
}

type Responder = Box<dyn Fn(&str) -> Result<String, InferenceError> + Send + Sync>;

enum Script {
    Queue(Mutex<Vec<Result<String, InferenceError>>>),
    Responder(Responder),
}

/// Fake LLM client for testing
pub struct FakeLlmClient {
    script: Script,
    prompts: Mutex<Vec<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FakeLlmClient {
    /// Create a fake client with pre-defined responses
    ///
    /// Responses are consumed in order; the last one is repeated.
    pub fn new(responses: Vec<Result<String, InferenceError>>) -> Self {
        Self {
            script: Script::Queue(Mutex::new(responses)),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a fake client that always returns the same text
    pub fn always(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(text.into())])
    }

    /// Create a fake client that always returns an error
    pub fn always_error(error: InferenceError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Create a fake client that answers from the prompt
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, InferenceError> + Send + Sync + 'static,
    {
        Self {
            script: Script::Responder(Box::new(responder)),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Get the number of calls made
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

impl LlmClient for FakeLlmClient {
    fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        lock(&self.prompts).push(prompt.to_string());

        match &self.script {
            Script::Responder(responder) => responder(prompt),
            Script::Queue(queue) => {
                let mut responses = lock(queue);
                match responses.len() {
                    0 => Err(InferenceError::MalformedBody("no scripted response".to_string())),
                    1 => responses[0].clone(),
                    _ => responses.remove(0),
                }
            }
        }
    }
}
