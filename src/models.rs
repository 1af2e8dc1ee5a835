use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clients::{SearchResponse, WebsiteInfo};
use crate::error::ClientResult;
use crate::input::{self, InputAnalysis};

/// Request payload for the analysis endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub input: String,
}

impl AnalysisRequest {
    /// Validates if the input is not empty or just whitespace
    pub fn is_valid(&self) -> bool {
        !self.input.trim().is_empty()
    }
}

/// Response payload for the health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: "Service is healthy".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EnrichRequest {
    pub url: String,
}

/// Classification of an input without calling any upstream API
#[derive(Debug, Serialize)]
pub struct InputResponse {
    pub analysis: InputAnalysis,
    pub company_name: String,
    pub clean_company_name: String,
    pub partita_iva: String,
    pub partita_iva_valid: bool,
    pub domain_suggestions: Vec<String>,
}

/// Outcome of one analysis section. A failed section carries its error
/// and never aborts the rest of the pipeline.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SectionOutcome<T> {
    Completed(T),
    Failed { error: String },
}

impl<T> SectionOutcome<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            SectionOutcome::Completed(data) => Some(data),
            SectionOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            SectionOutcome::Completed(_) => None,
            SectionOutcome::Failed { error } => Some(error),
        }
    }
}

impl<T> From<ClientResult<T>> for SectionOutcome<T> {
    fn from(result: ClientResult<T>) -> Self {
        match result {
            Ok(data) => SectionOutcome::Completed(data),
            Err(e) => SectionOutcome::Failed {
                error: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeoSection {
    pub domain: String,
    pub semrush_raw: BTreeMap<String, String>,
    pub analysis: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResults {
    pub query: String,
    pub results: SearchResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompetitorSection {
    pub search_results: Vec<QueryResults>,
    pub competitor_analysis: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocialProfile {
    pub platform: String,
    pub profile_url: String,
    pub found: bool,
    pub followers: u64,
    pub posts: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SocialSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<WebsiteInfo>,
    pub social_profiles: BTreeMap<String, SocialProfile>,
    pub social_analysis: Value,
}

/// Result of looking a company up in the public business registries
#[derive(Debug, Clone, Serialize)]
pub struct RegistryLookup {
    pub source: String,
    pub partita_iva: String,
    pub partita_iva_valid: bool,
    pub company_name: String,
    pub sources_checked: Vec<String>,
    pub data_found: bool,
    pub financial_data: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinancialSection {
    pub financial_raw_data: RegistryLookup,
    pub financial_analysis: Value,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SectionResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semrush: Option<SectionOutcome<SeoSection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitors: Option<SectionOutcome<CompetitorSection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social: Option<SectionOutcome<SocialSection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financial: Option<SectionOutcome<FinancialSection>>,
}

impl SectionResults {
    pub fn seo(&self) -> Option<&SeoSection> {
        self.semrush.as_ref().and_then(SectionOutcome::data)
    }

    pub fn competitors(&self) -> Option<&CompetitorSection> {
        self.competitors.as_ref().and_then(SectionOutcome::data)
    }

    pub fn social(&self) -> Option<&SocialSection> {
        self.social.as_ref().and_then(SectionOutcome::data)
    }

    pub fn financial(&self) -> Option<&FinancialSection> {
        self.financial.as_ref().and_then(SectionOutcome::data)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProgressSummary {
    pub total_steps: usize,
    pub completed_steps: usize,
    pub total_time_seconds: f64,
    pub average_step_time: f64,
    pub step_descriptions: BTreeMap<usize, String>,
    pub success_rate: f64,
}

/// Everything gathered for one company
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResults {
    pub timestamp: DateTime<Utc>,
    pub input: String,
    pub input_analysis: InputAnalysis,
    pub company_name: String,
    pub website: String,
    pub partita_iva: String,
    pub analysis_results: SectionResults,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_report: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProgressSummary>,
}

impl AnalysisResults {
    /// Starts a result set, pre-filling what can be read from the input alone.
    pub fn new(user_input: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            input: user_input.trim().to_string(),
            input_analysis: input::identify(user_input),
            company_name: input::company_name_from_input(user_input),
            website: input::domain_from_input(user_input).unwrap_or_default(),
            partita_iva: input::partita_iva_from_input(user_input),
            analysis_results: SectionResults::default(),
            final_report: None,
            error: None,
            progress: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    #[test]
    fn test_request_validation() {
        assert!(AnalysisRequest { input: "Acme".into() }.is_valid());
        assert!(!AnalysisRequest { input: "   ".into() }.is_valid());
    }

    #[test]
    fn test_new_results_prefill_from_input() {
        let results = AnalysisResults::new("  https://www.venezianico.com ");
        assert_eq!(results.input, "https://www.venezianico.com");
        assert_eq!(results.website, "venezianico.com");
        assert_eq!(results.company_name, "venezianico");
        assert_eq!(results.partita_iva, "");

        let results = AnalysisResults::new("04427770278");
        assert_eq!(results.partita_iva, "04427770278");
        assert_eq!(results.website, "");
    }

    #[test]
    fn test_failed_section_serializes_as_error_object() {
        let outcome: SectionOutcome<SeoSection> =
            Err(ClientError::InvalidInput("no domain".into())).into();
        assert_eq!(outcome.error(), Some("invalid input: no domain"));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({"error": "invalid input: no domain"}));
    }
}
