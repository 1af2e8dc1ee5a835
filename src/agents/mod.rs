pub mod competitor;
pub mod financial;
pub mod prompts;
pub mod report;
pub mod seo;
pub mod social;

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::clients::LanguageModel;
use crate::error::ClientResult;
use prompts::PromptKind;

pub use competitor::CompetitorAgent;
pub use financial::FinancialAgent;
pub use report::ReportAgent;
pub use seo::SeoAgent;
pub use social::SocialAgent;

/// A language-model analyst with a fixed role and prompt template
#[derive(Clone)]
pub struct AnalystAgent {
    kind: PromptKind,
    model: Arc<dyn LanguageModel>,
}

impl AnalystAgent {
    pub fn new(kind: PromptKind, model: Arc<dyn LanguageModel>) -> Self {
        Self { kind, model }
    }

    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    /// Asks the model to analyse `data`. The reply is parsed as JSON when
    /// possible and wrapped as `{"raw_response": ...}` otherwise.
    pub async fn analyze(&self, data: &str, context: &str) -> ClientResult<Value> {
        let prompt = prompts::render(self.kind, data, context);
        info!("Running {:?} analysis ({} bytes of data)", self.kind, data.len());
        let reply = self.model.complete(self.kind.role(), &prompt).await?;
        debug!("Model reply: {}", reply);
        Ok(parse_reply(&reply))
    }
}

/// Parses a model reply, tolerating Markdown code fences around the JSON.
pub fn parse_reply(reply: &str) -> Value {
    let trimmed = reply.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    match serde_json::from_str::<Value>(unfenced) {
        Ok(value) if value.is_object() || value.is_array() => value,
        _ => json!({ "raw_response": reply }),
    }
}
