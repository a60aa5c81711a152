use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Embedding model served by the embedding provider (all-MiniLM-L6-v2).
pub const EMBEDDING_MODEL: &str = "all-minilm";

/// Chat/completion model used for answer generation.
pub const CHAT_MODEL: &str = "gpt-3.5-turbo-instruct";

/// Window size (characters) for semantic chunks.
pub const CHUNK_SIZE: usize = 1000;
/// Characters shared between consecutive semantic chunks.
pub const CHUNK_OVERLAP: usize = 200;

/// Number of chunks retrieved per question.
pub const DEFAULT_TOP_K: usize = 15;
/// Minimum cosine similarity for semantic hits.
pub const MIN_SIMILARITY_SCORE: f32 = 0.1;
/// Minimum normalized score for lexical hits.
pub const TEXT_MIN_SIMILARITY_SCORE: f32 = 0.1;

/// Questions longer than this many bytes are cut on a char boundary.
pub const MAX_QUESTION_BYTES: usize = 2000;

/// Upper bound for any outbound HTTP request, in seconds.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Resume data file, relative to the package root.
pub const RESUME_DATA_PATH: &str = "config/resume-data.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON file holding `resume_content`
    pub resume_path: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// Byte limit applied to incoming questions
    pub max_question_bytes: usize,
    /// Connect timeout for the shared HTTP client, in seconds
    pub connect_timeout_secs: u64,
    /// Whole-request timeout for the shared HTTP client, in seconds.
    /// Capped at [`MAX_REQUEST_TIMEOUT_SECS`].
    pub request_timeout_secs: u64,
    /// Embedding provider configuration
    pub llm: LlmConfig,
    /// Answer generation configuration
    pub generator: GeneratorConfig,
    /// Chunking and retrieval parameters
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the embedding API
    pub base_url: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
}

/// Configuration for the optional answer-generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the chat API.
    /// If None, answers are returned verbatim from retrieved chunks.
    pub base_url: Option<String>,
    /// Model name for completions
    pub model: String,
    /// API key (required for the openai provider)
    pub api_key: Option<String>,
    /// Request timeout in seconds (capped at 120).
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub min_similarity: f32,
    pub text_min_similarity: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resume_path: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(RESUME_DATA_PATH),
            bind_addr: "127.0.0.1:9000".to_string(),
            max_question_bytes: MAX_QUESTION_BYTES,
            connect_timeout_secs: 10,
            request_timeout_secs: MAX_REQUEST_TIMEOUT_SECS,
            llm: LlmConfig::default(),
            generator: GeneratorConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            embedding_model: EMBEDDING_MODEL.to_string(),
            api_key: None,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: None,
            model: CHAT_MODEL.to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            chunk_overlap: CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            min_similarity: MIN_SIMILARITY_SCORE,
            text_min_similarity: TEXT_MIN_SIMILARITY_SCORE,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("RESUME_QA_DATA_PATH") {
            config.resume_path = PathBuf::from(path);
        }
        if let Ok(addr) = std::env::var("RESUME_QA_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(val) = std::env::var("RESUME_QA_TOP_K") {
            if let Ok(v) = val.parse::<usize>() {
                config.search.top_k = v.max(1);
            }
        }
        if let Ok(val) = std::env::var("RESUME_QA_MAX_QUESTION_BYTES") {
            if let Ok(v) = val.parse::<usize>() {
                config.max_question_bytes = v.max(1);
            }
        }
        if let Ok(val) = std::env::var("RESUME_QA_CONNECT_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.connect_timeout_secs = v;
            }
        }
        if let Ok(val) = std::env::var("RESUME_QA_REQUEST_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.request_timeout_secs = v;
            }
        }

        // Embeddings
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }

        // Answer generation
        if let Ok(provider) = std::env::var("ANSWER_PROVIDER") {
            config.generator.provider = provider;
        }
        if let Ok(url) = std::env::var("ANSWER_BASE_URL") {
            config.generator.base_url = Some(url);
        }
        if let Ok(model) = std::env::var("ANSWER_MODEL") {
            config.generator.model = model;
        }
        if let Ok(key) = std::env::var("ANSWER_API_KEY") {
            config.generator.api_key = Some(key);
        }
        if let Ok(val) = std::env::var("ANSWER_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.generator.timeout_secs = v.min(MAX_REQUEST_TIMEOUT_SECS);
            }
        }

        config
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    /// Client-wide cap on a request; per-request timeouts may be shorter.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.clamp(1, MAX_REQUEST_TIMEOUT_SECS))
    }
}
