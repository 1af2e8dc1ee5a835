use std::fmt::Write as _;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::agents::AnalystAgent;
use crate::agents::prompts::PromptKind;
use crate::clients::LanguageModel;
use crate::error::ClientResult;
use crate::format;
use crate::models::{AnalysisResults, CompetitorSection, FinancialSection, SeoSection, SocialSection};

const TOP_COMPETITORS: usize = 5;

/// Writes the final business intelligence report
#[derive(Clone)]
pub struct ReportAgent {
    analyst: AnalystAgent,
}

impl ReportAgent {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            analyst: AnalystAgent::new(PromptKind::Report, model),
        }
    }

    /// Asks the model for the narrative parts, then lays out the Markdown
    /// report around the collected section data.
    pub async fn generate(&self, results: &AnalysisResults) -> ClientResult<String> {
        let data = serde_json::to_string_pretty(results)?;
        let analysis = self
            .analyst
            .analyze(&data, "Generazione report business intelligence completo")
            .await?;
        info!("Formatting report for {}", results.company_name);
        Ok(format_report(&analysis, results))
    }
}

/// Renders a model-provided field as Markdown. Lists become bullet points and
/// objects become bold key lines.
fn text_field(analysis: &Value, key: &str) -> Option<String> {
    match analysis.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| format!("- {}", plain(item)))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Value::Object(map) if map.is_empty() => None,
        Value::Object(map) => Some(
            map.iter()
                .map(|(k, v)| format!("**{}:** {}", k, plain(v)))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        other => Some(other.to_string()),
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() { "N/A" } else { value }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn seo_section(seo: Option<&SeoSection>) -> String {
    let Some(seo) = seo else {
        return "Dati SEO non disponibili.".to_string();
    };
    let metric = |key: &str| match seo.analysis.get(key) {
        Some(Value::Number(n)) => n
            .as_f64()
            .map(format::format_large_number)
            .unwrap_or_else(|| n.to_string()),
        Some(Value::Null) | None => "N/A".to_string(),
        Some(other) => plain(other),
    };
    format!(
        "**Dominio:** {}\n**Traffico Organico:** {}\n**Keywords Posizionate:** {}\n**Backlinks:** {}\n**Domini Referenti:** {}",
        seo.domain,
        metric("traffico_organico"),
        metric("keywords_organiche"),
        metric("backlinks"),
        metric("domini_referenti"),
    )
}

fn competitor_section(competitors: Option<&CompetitorSection>) -> String {
    let Some(section) = competitors else {
        return "Analisi competitor non disponibile.".to_string();
    };
    let listed = section
        .competitor_analysis
        .get("competitors")
        .and_then(Value::as_array)
        .filter(|list| !list.is_empty());
    let Some(listed) = listed else {
        return "Nessun competitor identificato.".to_string();
    };

    let mut out = String::from("**Principali Competitor Identificati:**");
    for competitor in listed.iter().take(TOP_COMPETITORS) {
        let name = competitor
            .get("nome_azienda")
            .map(plain)
            .unwrap_or_else(|| plain(competitor));
        match competitor.get("sito_web").map(plain) {
            Some(site) if !site.is_empty() => {
                let _ = write!(out, "\n- {} ({})", name, site);
            }
            _ => {
                let _ = write!(out, "\n- {}", name);
            }
        }
    }
    out
}

fn social_section(social: Option<&SocialSection>) -> String {
    let Some(social) = social else {
        return "Dati social media non disponibili.".to_string();
    };
    let found: Vec<String> = social
        .social_profiles
        .values()
        .filter(|profile| profile.found)
        .map(|profile| {
            format!(
                "**{}:** {} follower ({})",
                title_case(&profile.platform),
                profile.followers,
                profile.profile_url
            )
        })
        .collect();
    if found.is_empty() {
        "Profili social non identificati.".to_string()
    } else {
        found.join("\n")
    }
}

fn financial_section(financial: Option<&FinancialSection>) -> String {
    let Some(financial) = financial else {
        return "Dati finanziari non disponibili.".to_string();
    };
    let revenue = financial
        .financial_analysis
        .get("fatturato_evolution")
        .and_then(Value::as_object)
        .filter(|evolution| !evolution.is_empty());

    match revenue {
        Some(evolution) => {
            let mut out = String::from("**Evoluzione Fatturato:**");
            let mut previous = None;
            for (year, amount) in evolution {
                let value = format::value_as_number(amount);
                let shown = value
                    .map(|a| format::format_currency(a, "EUR"))
                    .unwrap_or_else(|| plain(amount));
                let _ = write!(out, "\n- {}: {}", year, shown);
                if let (Some(current), Some(prev)) = (value, previous) {
                    let _ = write!(out, " {}", format::trend_indicator(current, prev));
                }
                previous = value.or(previous);
            }
            out
        }
        None => "Ricerca dati finanziari in corso. Risultati disponibili con accesso a database aziendali."
            .to_string(),
    }
}

/// Lays out the Markdown report. Sections without data show a fallback line.
pub fn format_report(analysis: &Value, results: &AnalysisResults) -> String {
    let sections = &results.analysis_results;
    let executive_summary = text_field(analysis, "executive_summary")
        .unwrap_or_else(|| format::executive_summary(sections));
    let sector = text_field(analysis, "sector").unwrap_or_else(|| "N/A".to_string());
    let swot = text_field(analysis, "swot_analysis")
        .unwrap_or_else(|| "Analisi SWOT da completare con dati aggiuntivi.".to_string());
    let recommendations = text_field(analysis, "strategic_recommendations").unwrap_or_else(|| {
        "Raccomandazioni da definire in base ai risultati dell'analisi.".to_string()
    });
    let conclusions = text_field(analysis, "conclusions").unwrap_or_else(|| {
        "Report generato automaticamente dal sistema di Business Intelligence.".to_string()
    });

    format!(
        r#"# BUSINESS INTELLIGENCE REPORT
## Data di generazione: {date}

### EXECUTIVE SUMMARY

{executive_summary}

### 1. PROFILO AZIENDALE

**Nome Azienda:** {company}
**Sito Web:** {website}
**Partita IVA:** {partita_iva}
**Settore:** {sector}

### 2. ANALISI DIGITALE E SEO

{seo}

### 3. ANALISI COMPETITOR

{competitors}

### 4. PRESENZA SOCIAL MEDIA

{social}

### 5. DATI FINANZIARI

{financial}

### 6. ANALISI SWOT

{swot}

### 7. RACCOMANDAZIONI STRATEGICHE

{recommendations}

### 8. CONCLUSIONI

{conclusions}

---
*Report generato automaticamente da Business Intelligence Analyzer*
"#,
        date = results.timestamp.format("%d/%m/%Y"),
        company = or_na(&results.company_name),
        website = or_na(&results.website),
        partita_iva = or_na(&results.partita_iva),
        seo = seo_section(sections.seo()),
        competitors = competitor_section(sections.competitors()),
        social = social_section(sections.social()),
        financial = financial_section(sections.financial()),
    )
}
