use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::agents::AnalystAgent;
use crate::agents::prompts::{self, PromptKind};
use crate::clients::{LanguageModel, SerperClient};
use crate::error::ClientResult;
use crate::models::{CompetitorSection, QueryResults};
use crate::validation;

/// Competitor research through Google search results
#[derive(Clone)]
pub struct CompetitorAgent {
    analyst: AnalystAgent,
    serper: SerperClient,
}

impl CompetitorAgent {
    pub fn new(model: Arc<dyn LanguageModel>, serper: SerperClient) -> Self {
        Self {
            analyst: AnalystAgent::new(PromptKind::Competitor, model),
            serper,
        }
    }

    /// Runs the competitor searches concurrently; failed searches are skipped.
    pub async fn search_competitors(
        &self,
        company_name: &str,
        sector: &str,
    ) -> ClientResult<CompetitorSection> {
        let company_name = validation::sanitize_company_name(company_name);
        let company_name = company_name.as_str();
        let queries = prompts::competitor_queries(company_name, sector);
        let searches = queries.iter().map(|query| self.serper.search(query));
        let responses = join_all(searches).await;

        let search_results: Vec<QueryResults> = queries
            .into_iter()
            .zip(responses)
            .filter_map(|(query, response)| match response {
                Ok(results) => Some(QueryResults { query, results }),
                Err(e) => {
                    warn!("Serper search '{}' failed: {}", query, e);
                    None
                }
            })
            .collect();
        info!(
            "Collected {} competitor searches for {}",
            search_results.len(),
            company_name
        );

        let data = serde_json::to_string(&search_results)?;
        let context = format!("Ricerca competitor per: {}", company_name);
        let competitor_analysis = self.analyst.analyze(&data, &context).await?;

        Ok(CompetitorSection {
            search_results,
            competitor_analysis,
        })
    }
}
