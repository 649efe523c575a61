// src/llm.rs
//! LLM client boundary: provider abstraction with a real Anthropic backend,
//! a deterministic mock for tests/local runs, and a disabled client.
//! All JSON-shape defensiveness for scoring responses lives one level up in
//! the curation response adapter; this layer only moves text.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use std::{env, fs};

pub const DEFAULT_LLM_CONFIG_PATH: &str = "config/llm.json";

pub const ENV_LLM_CONFIG_PATH: &str = "DIGEST_LLM_CONFIG_PATH";
pub const ENV_LLM_TEST_MODE: &str = "LLM_TEST_MODE";
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

fn default_model() -> String {
    "claude-haiku-4-5".to_string()
}

/// One completion exchange with the model. `max_tokens` bounds the response.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String>;
    /// Model name for diagnostics and the run log.
    fn model_name(&self) -> &str;
}

/// Convenient alias used by callers.
pub type DynLlmClient = Arc<dyn LlmClient>;

/// Build-time config loaded from `config/llm.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub enabled: bool,
    /// "anthropic" (case-insensitive)
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from ANTHROPIC_API_KEY
    pub api_key: String,
}

impl LlmConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(&path).with_context(|| {
            format!("reading llm config from {}", path.as_ref().display())
        })?;
        let mut cfg: LlmConfig = serde_json::from_str(&data).context("parsing llm config")?;

        // Normalize provider
        cfg.provider = cfg.provider.to_lowercase();

        // Resolve api key if "ENV"
        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = match cfg.provider.as_str() {
                "anthropic" => env::var(ENV_ANTHROPIC_API_KEY)
                    .map_err(|_| anyhow!("Missing ANTHROPIC_API_KEY env var"))?,
                other => bail!("Unsupported provider in config: {other}"),
            };
        }

        Ok(cfg)
    }

    /// Uses DIGEST_LLM_CONFIG_PATH or defaults to "config/llm.json".
    pub fn load_default() -> Result<Self> {
        let path = env::var(ENV_LLM_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_LLM_CONFIG_PATH));
        Self::load_from_file(path)
    }
}

/// Factory: build a client according to config and environment variables.
///
/// * If `LLM_TEST_MODE=mock`, returns a deterministic mock client.
/// * Else if `config.enabled==false`, returns a disabled client.
/// * Else builds the real Anthropic provider.
pub fn build_client_from_config(config: &LlmConfig) -> DynLlmClient {
    if env::var(ENV_LLM_TEST_MODE)
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockLlm::default());
    }

    if !config.enabled {
        return Arc::new(DisabledLlm);
    }

    match config.provider.as_str() {
        "anthropic" => Arc::new(AnthropicClient::new(config)),
        _ => Arc::new(DisabledLlm),
    }
}

/// Anthropic Messages API provider. Requires an API key.
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(config: &LlmConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("daily-digest/0.1 (+github.com/sumoseah/daily-digest)")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        if self.api_key.is_empty() {
            bail!("anthropic api key is empty");
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: u32,
            system: &'a str,
            messages: Vec<Msg<'a>>,
        }
        #[derive(Deserialize)]
        struct Resp {
            content: Vec<Block>,
        }
        #[derive(Deserialize)]
        struct Block {
            #[serde(default)]
            text: String,
        }

        let req = Req {
            model: &self.model,
            max_tokens,
            system,
            messages: vec![Msg {
                role: "user",
                content: user,
            }],
        };

        let resp = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&req)
            .send()
            .await
            .context("anthropic request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body: String = body.chars().take(300).collect();
            bail!("anthropic http {status}: {body}");
        }

        let body: Resp = resp.json().await.context("anthropic response body")?;
        let text = body
            .content
            .first()
            .map(|b| b.text.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            bail!("anthropic returned empty content");
        }
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Errors on every call; used when the LLM is disabled in config.
pub struct DisabledLlm;

#[async_trait]
impl LlmClient for DisabledLlm {
    async fn complete(&self, _system: &str, _user: &str, _max_tokens: u32) -> Result<String> {
        bail!("llm disabled in config")
    }

    fn model_name(&self) -> &str {
        "disabled"
    }
}

/// Simple mock client for tests/local runs: returns a fixed response.
#[derive(Clone)]
pub struct MockLlm {
    pub fixed: String,
}

impl Default for MockLlm {
    fn default() -> Self {
        Self {
            fixed: "{}".to_string(),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, _system: &str, _user: &str, _max_tokens: u32) -> Result<String> {
        Ok(self.fixed.clone())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_client_errors_on_every_call() {
        let client = DisabledLlm;
        let res = client.complete("sys", "user", 100).await;
        assert!(res.is_err());
        assert_eq!(client.model_name(), "disabled");
    }

    #[tokio::test]
    async fn mock_client_returns_fixed_text() {
        let client = MockLlm {
            fixed: "hello".into(),
        };
        assert_eq!(client.complete("sys", "user", 100).await.unwrap(), "hello");
    }

    #[test]
    fn config_parses_with_default_model() {
        let cfg: LlmConfig =
            serde_json::from_str(r#"{"enabled":true,"provider":"anthropic","api_key":"sk-test"}"#)
                .unwrap();
        assert_eq!(cfg.model, "claude-haiku-4-5");
    }
}
