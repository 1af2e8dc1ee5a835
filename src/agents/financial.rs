use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::agents::AnalystAgent;
use crate::agents::prompts::PromptKind;
use crate::clients::LanguageModel;
use crate::config::FINANCIAL_SOURCES;
use crate::error::ClientResult;
use crate::models::{FinancialSection, RegistryLookup};
use crate::validation;

const REGISTRY_SOURCE: &str = "Ricerca automatica dati finanziari";

/// Financial analysis keyed by Partita IVA
#[derive(Clone)]
pub struct FinancialAgent {
    analyst: AnalystAgent,
}

impl FinancialAgent {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            analyst: AnalystAgent::new(PromptKind::Financial, model),
        }
    }

    pub async fn analyze_financial_data(
        &self,
        partita_iva: &str,
        company_name: &str,
    ) -> ClientResult<FinancialSection> {
        let financial_raw_data = registry_lookup(partita_iva, company_name);
        info!(
            "Registry lookup for {} (P.IVA '{}', valid: {})",
            company_name, partita_iva, financial_raw_data.partita_iva_valid
        );

        let data = serde_json::to_string(&financial_raw_data)?;
        let context = format!(
            "Analisi finanziaria per: {} (P.IVA: {})",
            company_name, partita_iva
        );
        let financial_analysis = self.analyst.analyze(&data, &context).await?;

        Ok(FinancialSection {
            financial_raw_data,
            financial_analysis,
        })
    }
}

/// Business registry record for a company. No registry exposes a public
/// API, so the record lists the sources to check and carries no figures.
pub fn registry_lookup(partita_iva: &str, company_name: &str) -> RegistryLookup {
    RegistryLookup {
        source: REGISTRY_SOURCE.to_string(),
        partita_iva: partita_iva.to_string(),
        partita_iva_valid: validation::validate_partita_iva(partita_iva),
        company_name: company_name.to_string(),
        sources_checked: FINANCIAL_SOURCES.iter().map(|s| s.to_string()).collect(),
        data_found: false,
        financial_data: BTreeMap::new(),
    }
}
