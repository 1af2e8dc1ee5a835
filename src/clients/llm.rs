use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rig::completion::{CompletionError, Prompt, PromptError};
use rig::providers::openai;
use tracing::{debug, warn};

use crate::clients::ApiClient;
use crate::config::{Config, Service};
use crate::error::{ClientError, ClientResult};

pub const ANALYSIS_TEMPERATURE: f64 = 0.1;

/// Provider error markers for OpenAI failures that clear up on their own
const TRANSIENT_PROVIDER_ERRORS: [&str; 6] = [
    "rate_limit_exceeded",
    "server_error",
    "overloaded",
    "bad gateway",
    "service unavailable",
    "gateway timeout",
];

/// Chat completion backend used by the analyst agents
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Sends `prompt` with `preamble` as the system message and returns the reply text.
    async fn complete(&self, preamble: &str, prompt: &str) -> ClientResult<String>;
}

/// OpenAI chat model through rig, sharing the OpenAI rate limit and retry policy
pub struct OpenAiModel {
    client: openai::Client,
    model: String,
    timeout: Duration,
    api: Arc<ApiClient>,
}

impl OpenAiModel {
    pub fn new(config: &Config, api: Arc<ApiClient>) -> Self {
        let client = openai::Client::from_url(
            config.openai_api_key.expose(),
            &config.openai_api_base,
        );
        Self {
            client,
            model: config.openai_model.clone(),
            timeout: config.api_timeout(),
            api,
        }
    }

    /// Overrides the per-attempt deadline taken from `API_TIMEOUT`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(&self, preamble: &str, prompt: &str) -> ClientResult<String> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(preamble)
            .temperature(ANALYSIS_TEMPERATURE)
            .build();
        let agent = &agent;
        let limiter = self.api.limiter();
        let timeout = self.timeout;

        debug!("Prompting {} with {} characters", self.model, prompt.len());
        self.api
            .retry_policy()
            .run(Service::OpenAi.name(), || {
                let prompt = prompt.to_string();
                async move {
                    limiter.acquire(Service::OpenAi).await;
                    match tokio::time::timeout(timeout, agent.prompt(prompt).into_future()).await
                    {
                        Ok(reply) => reply.map_err(classify),
                        Err(_) => {
                            warn!("OpenAI call exceeded {:?}", timeout);
                            Err(ClientError::Timeout(Service::OpenAi.name().to_string()))
                        }
                    }
                }
            })
            .await
    }
}

/// Splits rig failures into transient outages and permanent request errors
fn classify(err: PromptError) -> ClientError {
    let transient = match &err {
        PromptError::CompletionError(CompletionError::HttpError(e)) => {
            e.is_timeout()
                || e.is_connect()
                || e
                    .status()
                    .is_some_and(|s| s.as_u16() == 429 || s.is_server_error())
        }
        PromptError::CompletionError(CompletionError::ProviderError(body)) => {
            is_transient_provider_error(body)
        }
        _ => false,
    };
    if transient {
        ClientError::LlmUnavailable(err.to_string())
    } else {
        ClientError::Llm(err.to_string())
    }
}

fn is_transient_provider_error(body: &str) -> bool {
    let body = body.to_ascii_lowercase();
    TRANSIENT_PROVIDER_ERRORS
        .iter()
        .any(|marker| body.contains(marker))
}
