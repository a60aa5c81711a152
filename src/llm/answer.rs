use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::GeneratorConfig;

/// Rewrites retrieved resume text into an answer to the question.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Whether the backend has what it needs (endpoint, credentials) to run.
    fn is_configured(&self) -> bool;

    async fn generate_answer(&self, context: &str, question: &str) -> Result<String>;
}

/// Answer generator backed by an Ollama or OpenAI-compatible HTTP API.
pub struct LlmAnswerGenerator {
    client: reqwest::Client,
    config: GeneratorConfig,
}

impl LlmAnswerGenerator {
    pub fn new(client: reqwest::Client, config: GeneratorConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    fn is_configured(&self) -> bool {
        let Some(base_url) = self.config.base_url.as_deref() else {
            return false;
        };
        if base_url.trim().is_empty() {
            return false;
        }
        self.config.provider != "openai" || self.config.api_key.is_some()
    }

    async fn generate_answer(&self, context: &str, question: &str) -> Result<String> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .context("Answer generator base_url not configured")?
            .trim_end_matches('/');

        let system = build_system_prompt();
        let user = build_user_prompt(context, question);

        let answer = match self.config.provider.as_str() {
            "ollama" => call_ollama(&self.client, &self.config, base_url, &system, &user).await?,
            "openai" if is_completion_model(&self.config.model) => {
                call_openai_completion(&self.client, &self.config, base_url, &system, &user).await?
            }
            "openai" => {
                call_openai_chat(&self.client, &self.config, base_url, &system, &user).await?
            }
            other => anyhow::bail!("Unknown LLM provider: {other}"),
        };

        let answer = answer.trim();
        if answer.is_empty() {
            anyhow::bail!("Answer generator returned an empty completion");
        }
        Ok(answer.to_string())
    }
}

/// Strip chat-template control tokens so resume text or a question cannot
/// open a new turn in the prompt.
pub fn sanitize_for_prompt(text: &str) -> String {
    const CONTROL_TOKENS: &[&str] = &["<|im_start|>", "<|im_end|>", "<|endoftext|>"];
    let mut out = text.to_string();
    for token in CONTROL_TOKENS {
        out = out.replace(token, "");
    }
    out
}

fn build_system_prompt() -> String {
    String::from(
        "You answer questions about a candidate using excerpts from their resume.\n\
         Answer ONLY from the excerpts. Never invent employers, dates, or skills.\n\
         If the excerpts do not contain the answer, say that the resume does not mention it.\n\
         Keep answers short and factual.",
    )
}

fn build_user_prompt(context: &str, question: &str) -> String {
    format!(
        "Resume excerpts:\n{}\n---\nQuestion: {}",
        sanitize_for_prompt(context),
        sanitize_for_prompt(question)
    )
}

/// Instruct models only serve the legacy `/v1/completions` endpoint.
fn is_completion_model(model: &str) -> bool {
    model.ends_with("-instruct")
}

fn timeout(config: &GeneratorConfig) -> Duration {
    Duration::from_secs(config.timeout_secs.clamp(1, 120))
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Message,
}

async fn call_ollama(
    client: &reqwest::Client,
    config: &GeneratorConfig,
    base_url: &str,
    system: &str,
    user: &str,
) -> Result<String> {
    let url = format!("{base_url}/api/chat");

    let req = OllamaChatRequest {
        model: config.model.clone(),
        messages: vec![
            Message {
                role: "system".to_string(),
                content: system.to_string(),
            },
            Message {
                role: "user".to_string(),
                content: user.to_string(),
            },
        ],
        stream: false,
    };

    let resp = client
        .post(&url)
        .timeout(timeout(config))
        .json(&req)
        .send()
        .await
        .context("Failed to call Ollama chat API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama chat API returned {status}: {body}");
    }

    let body: OllamaChatResponse = resp
        .json()
        .await
        .context("Failed to parse Ollama chat response")?;
    Ok(body.message.content)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChatChoice>,
}

#[derive(Deserialize)]
struct OpenAiChatChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct OpenAiCompletionRequest {
    model: String,
    prompt: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiCompletionResponse {
    choices: Vec<OpenAiCompletionChoice>,
}

#[derive(Deserialize)]
struct OpenAiCompletionChoice {
    text: String,
}

async fn call_openai_chat(
    client: &reqwest::Client,
    config: &GeneratorConfig,
    base_url: &str,
    system: &str,
    user: &str,
) -> Result<String> {
    let url = format!("{base_url}/v1/chat/completions");

    let req = OpenAiChatRequest {
        model: config.model.clone(),
        messages: vec![
            Message {
                role: "system".to_string(),
                content: system.to_string(),
            },
            Message {
                role: "user".to_string(),
                content: user.to_string(),
            },
        ],
        temperature: 0.3,
    };

    let body: OpenAiChatResponse = post_openai(client, config, &url, &req).await?;
    Ok(body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}

async fn call_openai_completion(
    client: &reqwest::Client,
    config: &GeneratorConfig,
    base_url: &str,
    system: &str,
    user: &str,
) -> Result<String> {
    let url = format!("{base_url}/v1/completions");

    let req = OpenAiCompletionRequest {
        model: config.model.clone(),
        prompt: format!("{system}\n\n{user}\nAnswer:"),
        max_tokens: 500,
        temperature: 0.3,
    };

    let body: OpenAiCompletionResponse = post_openai(client, config, &url, &req).await?;
    Ok(body
        .choices
        .into_iter()
        .next()
        .map(|c| c.text)
        .unwrap_or_default())
}

async fn post_openai<Req: Serialize, Resp: DeserializeOwned>(
    client: &reqwest::Client,
    config: &GeneratorConfig,
    url: &str,
    req: &Req,
) -> Result<Resp> {
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let resp = client
        .post(url)
        .timeout(timeout(config))
        .header("Authorization", format!("Bearer {api_key}"))
        .json(req)
        .send()
        .await
        .context("Failed to call OpenAI API")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI API returned {status}: {body}");
    }

    resp.json()
        .await
        .context("Failed to parse OpenAI response")
}
