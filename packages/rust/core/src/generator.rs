//! Answer generation collaborator.
//!
//! Each annotation round compares the annotator's answer against one produced
//! by an [`AnswerGenerator`]. The implementation is chosen once at startup
//! from `[generator] mode` and injected into the [`crate::Curator`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use ragcurate_shared::{GeneratorConfig, GeneratorMode, RagCurateError, Result, validate_api_key};

/// User-Agent string for generation requests.
const USER_AGENT: &str = concat!("ragcurate/", env!("CARGO_PKG_VERSION"));

const SIMULATED_ANSWER: &str = "This is a simulated LLM answer that would normally come from the API. \
     It demonstrates how the system works without needing the actual LLM service.";

const SIMULATED_SOURCES: [&str; 2] = ["https://example.com/doc1", "https://example.com/doc2"];

const SYSTEM_PROMPT: &str = "You answer questions using the candidate source URLs provided. \
     Reply with a single JSON object of the form \
     {\"answer\": \"<answer text>\", \"sources\": [\"<url>\", ...]} and nothing else. \
     List only the URLs you actually relied on; you may add URLs not in the candidate list.";

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A generated comparison answer and the sources it cites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedAnswer {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Produces a comparison answer for a question from candidate source URLs.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer. Best-effort: failures are returned, never retried.
    async fn generate(&self, question: &str, candidate_urls: &[String]) -> Result<GeneratedAnswer>;

    /// Human-readable generator name for tracing.
    fn name(&self) -> &str;
}

/// Build the generator selected by configuration.
pub fn build_generator(config: &GeneratorConfig) -> Result<Arc<dyn AnswerGenerator>> {
    match config.mode {
        GeneratorMode::Simulated => Ok(Arc::new(SimulatedGenerator)),
        GeneratorMode::Chat => {
            let api_key = validate_api_key(config)?;
            Ok(Arc::new(ChatCompletionsGenerator::new(config, Some(api_key))?))
        }
    }
}

// ---------------------------------------------------------------------------
// Simulated
// ---------------------------------------------------------------------------

/// Returns a fixed answer and two example sources without any network call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedGenerator;

#[async_trait]
impl AnswerGenerator for SimulatedGenerator {
    async fn generate(&self, question: &str, candidate_urls: &[String]) -> Result<GeneratedAnswer> {
        debug!(
            question_len = question.len(),
            candidates = candidate_urls.len(),
            "simulating answer"
        );
        Ok(GeneratedAnswer {
            answer: SIMULATED_ANSWER.to_string(),
            sources: SIMULATED_SOURCES.iter().map(|s| s.to_string()).collect(),
        })
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible chat completions
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Calls an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionsGenerator {
    client: Client,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
}

impl ChatCompletionsGenerator {
    /// Create a generator from config. `api_key` is sent as a bearer token when present.
    pub fn new(config: &GeneratorConfig, api_key: Option<String>) -> Result<Self> {
        let endpoint = resolve_endpoint(&config.base_url)?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagCurateError::Generation(format!("failed to build HTTP client: {e}")))?;

        info!(%endpoint, model = %config.model, "chat completions generator configured");

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl AnswerGenerator for ChatCompletionsGenerator {
    #[instrument(skip_all, fields(model = %self.model, candidates = candidate_urls.len()))]
    async fn generate(&self, question: &str, candidate_urls: &[String]) -> Result<GeneratedAnswer> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(question, candidate_urls),
                },
            ],
            temperature: 0.3,
        };

        let mut req = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| RagCurateError::Generation(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(RagCurateError::Generation(format!(
                "endpoint returned HTTP {status}: {detail}"
            )));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| RagCurateError::Generation(format!("invalid response body: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RagCurateError::Generation("response contained no message".into()))?;

        Ok(parse_generated(&content))
    }

    fn name(&self) -> &str {
        "chat"
    }
}

/// Resolve the chat completions endpoint from a base URL.
fn resolve_endpoint(base_url: &str) -> Result<Url> {
    let base = base_url.trim_end_matches('/');
    let full = if base.ends_with("/chat/completions") {
        base.to_string()
    } else {
        format!("{base}/chat/completions")
    };
    Url::parse(&full).map_err(|e| {
        RagCurateError::config(format!("invalid generator base_url '{base_url}': {e}"))
    })
}

fn user_prompt(question: &str, candidate_urls: &[String]) -> String {
    let mut prompt = format!("Question: {question}\n\nCandidate sources:\n");
    if candidate_urls.is_empty() {
        prompt.push_str("(none)\n");
    }
    for url in candidate_urls {
        prompt.push_str("- ");
        prompt.push_str(url);
        prompt.push('\n');
    }
    prompt
}

/// Interpret the model's reply. Non-JSON replies become an answer with no sources.
fn parse_generated(content: &str) -> GeneratedAnswer {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    match serde_json::from_str::<GeneratedAnswer>(unfenced) {
        Ok(mut generated) => {
            generated.sources.retain(|s| !s.trim().is_empty());
            generated
        }
        Err(e) => {
            warn!(error = %e, "generator reply was not structured JSON; keeping raw text");
            GeneratedAnswer {
                answer: trimmed.to_string(),
                sources: Vec::new(),
            }
        }
    }
}
