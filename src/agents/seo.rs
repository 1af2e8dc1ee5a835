use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::agents::AnalystAgent;
use crate::agents::prompts::PromptKind;
use crate::clients::{LanguageModel, SemrushClient, semrush};
use crate::error::{ClientError, ClientResult};
use crate::input;
use crate::models::SeoSection;

/// SEO and traffic analysis from SEMRush reports
#[derive(Clone)]
pub struct SeoAgent {
    analyst: AnalystAgent,
    semrush: SemrushClient,
}

impl SeoAgent {
    pub fn new(model: Arc<dyn LanguageModel>, semrush: SemrushClient) -> Self {
        Self {
            analyst: AnalystAgent::new(PromptKind::Semrush, model),
            semrush,
        }
    }

    pub async fn analyze_company(&self, user_input: &str) -> ClientResult<SeoSection> {
        let domain = input::domain_from_input(user_input).ok_or_else(|| {
            ClientError::InvalidInput(
                "could not determine the domain from the given input".to_string(),
            )
        })?;

        info!("Fetching SEMRush data for {}", domain);
        let semrush_raw = self.semrush.fetch_all(&domain).await?;

        let data = serde_json::to_string(&report_rows(&semrush_raw))?;
        let context = format!("Analisi SEMRush per il dominio: {}", domain);
        let analysis = self.analyst.analyze(&data, &context).await?;

        Ok(SeoSection {
            domain,
            semrush_raw,
            analysis,
        })
    }
}

/// Parsed rows per report, keeping the raw text for bodies that do not parse.
fn report_rows(semrush_raw: &BTreeMap<String, String>) -> BTreeMap<&str, Value> {
    semrush_raw
        .iter()
        .map(|(report, body)| {
            let rows = match semrush::parse_report(body) {
                Ok(rows) => serde_json::to_value(rows).unwrap_or_else(|_| Value::from(body.as_str())),
                Err(e) => {
                    warn!("Could not parse SEMRush {} report: {}", report, e);
                    Value::from(body.as_str())
                }
            };
            (report.as_str(), rows)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::ScriptedModel;
    use crate::clients::test_support::{api_client, serve};
    use crate::config::ApiKey;
    use axum::{Router, routing::get};

    #[tokio::test]
    async fn test_analyze_company_from_url() {
        let base = serve(Router::new().route(
            "/",
            get(|| async { "Dn;Or;Ot\nvenezianico.com;1520;8400".to_string() }),
        ))
        .await;
        let semrush = SemrushClient::new(Arc::new(api_client()), ApiKey::new("k"), base);
        let model = Arc::new(ScriptedModel::new().otherwise(r#"{"traffico_organico": 8400}"#));
        let agent = SeoAgent::new(model.clone(), semrush);

        let section = agent
            .analyze_company("https://www.venezianico.com")
            .await
            .unwrap();
        assert_eq!(section.domain, "venezianico.com");
        assert_eq!(section.semrush_raw.len(), 3);
        assert_eq!(section.analysis["traffico_organico"], 8400);
        assert_eq!(model.prompt_count(), 1);

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].1.contains(r#""Dn":"venezianico.com""#));
        assert!(prompts[0].1.contains(r#""Ot":"8400""#));
    }

    #[tokio::test]
    async fn test_company_name_without_domain_fails() {
        let semrush = SemrushClient::new(
            Arc::new(api_client()),
            ApiKey::new("k"),
            "http://127.0.0.1:9/",
        );
        let model = Arc::new(ScriptedModel::new());
        let agent = SeoAgent::new(model.clone(), semrush);

        let err = agent.analyze_company("Venezianico SRL").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
        assert_eq!(model.prompt_count(), 0);
    }
}
