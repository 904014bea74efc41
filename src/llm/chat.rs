use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::LanguageModel;
use crate::config::LlmConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.2;

/// Chat-completion backend chosen once from configuration.
#[derive(Debug, Clone)]
pub enum AnyChatModel {
    Ollama(HttpChatModel),
    OpenAi(HttpChatModel),
    Anthropic(HttpChatModel),
}

#[derive(Debug, Clone)]
pub struct HttpChatModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl AnyChatModel {
    pub fn from_config(client: &reqwest::Client, config: &LlmConfig) -> Result<Self> {
        let http = HttpChatModel {
            client: client.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.chat_model.clone(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        };

        match config.provider.as_str() {
            "ollama" => Ok(Self::Ollama(http)),
            "openai" => Ok(Self::OpenAi(http)),
            "anthropic" => {
                if http.api_key.is_none() {
                    anyhow::bail!("LLM_API_KEY is required for the anthropic provider");
                }
                Ok(Self::Anthropic(http))
            }
            other => anyhow::bail!("Unsupported LLM provider for chat: {other}"),
        }
    }
}

impl LanguageModel for AnyChatModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        match self {
            Self::Ollama(h) => complete_ollama(h, prompt).await,
            Self::OpenAi(h) => complete_openai(h, prompt).await,
            Self::Anthropic(h) => complete_anthropic(h, prompt).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Ollama(_) => "ollama",
            Self::OpenAi(_) => "openai",
            Self::Anthropic(_) => "anthropic",
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

fn user_message(prompt: &str) -> Vec<WireMessage> {
    vec![WireMessage {
        role: "user".to_string(),
        content: prompt.to_string(),
    }]
}

/// POST `body` and return the raw response text, failing on non-2xx.
async fn post_json<T: Serialize>(
    req: reqwest::RequestBuilder,
    body: &T,
    provider: &str,
) -> Result<String> {
    let resp = req
        .json(body)
        .send()
        .await
        .with_context(|| format!("Failed to connect to {provider} for chat"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("{provider} chat API returned {status}: {body}");
    }

    resp.text()
        .await
        .with_context(|| format!("Failed to read {provider} chat response"))
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: WireMessage,
}

async fn complete_ollama(h: &HttpChatModel, prompt: &str) -> Result<String> {
    let url = format!("{}/api/chat", h.base_url);
    let req = OllamaChatRequest {
        model: h.model.clone(),
        messages: user_message(prompt),
        stream: false,
    };

    let body = post_json(h.client.post(&url).timeout(h.timeout), &req, "Ollama").await?;
    parse_ollama(&body)
}

fn parse_ollama(body: &str) -> Result<String> {
    let resp: OllamaChatResponse =
        serde_json::from_str(body).context("Failed to parse Ollama chat response")?;
    Ok(resp.message.content)
}

// ─── OpenAI ──────────────────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

async fn complete_openai(h: &HttpChatModel, prompt: &str) -> Result<String> {
    let url = format!("{}/v1/chat/completions", h.base_url);
    let api_key = h.api_key.as_deref().unwrap_or_default();
    let req = OpenAiChatRequest {
        model: h.model.clone(),
        messages: user_message(prompt),
        temperature: TEMPERATURE,
    };

    let builder = h
        .client
        .post(&url)
        .timeout(h.timeout)
        .header("Authorization", format!("Bearer {api_key}"));
    let body = post_json(builder, &req, "OpenAI").await?;
    parse_openai(&body)
}

fn parse_openai(body: &str) -> Result<String> {
    let resp: OpenAiChatResponse =
        serde_json::from_str(body).context("Failed to parse OpenAI chat response")?;
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .context("OpenAI returned no choices")
}

// ─── Anthropic ───────────────────────────────────────────

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<WireMessage>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

async fn complete_anthropic(h: &HttpChatModel, prompt: &str) -> Result<String> {
    let url = format!("{}/v1/messages", h.base_url);
    let req = AnthropicRequest {
        model: h.model.clone(),
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
        messages: user_message(prompt),
    };

    let builder = h
        .client
        .post(&url)
        .timeout(h.timeout)
        .header("x-api-key", h.api_key.as_deref().unwrap_or_default())
        .header("anthropic-version", ANTHROPIC_VERSION);
    let body = post_json(builder, &req, "Anthropic").await?;
    parse_anthropic(&body)
}

fn parse_anthropic(body: &str) -> Result<String> {
    let resp: AnthropicResponse =
        serde_json::from_str(body).context("Failed to parse Anthropic response")?;
    let text: String = resp
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .map(|b| b.text)
        .collect();
    if text.is_empty() {
        anyhow::bail!("Anthropic returned no text content");
    }
    Ok(text)
}
