//! Roles and prompt templates for the analyst agents.
//!
//! Prompts are written in Italian: the analysed companies, the search
//! market and the final report are all Italian.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Semrush,
    Competitor,
    Social,
    Financial,
    Report,
}

impl PromptKind {
    /// System message describing the agent's expertise
    pub fn role(&self) -> &'static str {
        match self {
            PromptKind::Semrush => {
                "Sei un esperto analista SEO e digital marketing specializzato nell'interpretazione di dati SEMRush."
            }
            PromptKind::Competitor => {
                "Sei un esperto ricercatore di mercato specializzato nell'identificazione e analisi di competitor."
            }
            PromptKind::Social => "Sei un esperto analista di social media marketing.",
            PromptKind::Financial => {
                "Sei un esperto analista finanziario specializzato nell'interpretazione di bilanci aziendali."
            }
            PromptKind::Report => {
                "Sei un esperto consulente di business intelligence e marketing strategico."
            }
        }
    }

    fn template(&self) -> &'static str {
        match self {
            PromptKind::Semrush => SEMRUSH_ANALYZER,
            PromptKind::Competitor => COMPETITOR_ANALYZER,
            PromptKind::Social => SOCIAL_ANALYZER,
            PromptKind::Financial => FINANCIAL_ANALYZER,
            PromptKind::Report => REPORT_GENERATOR,
        }
    }
}

const SEMRUSH_ANALYZER: &str = r#"Analizza i seguenti dati SEMRush e fornisci insights strutturati.

DATI DA ANALIZZARE:
{data}

FORNISCI UN'ANALISI STRUTTURATA CHE INCLUDA:
1. Traffico organico e keyword posizionate
2. Backlinks e domini referenti
3. Competitor principali
4. Trend di crescita/decrescita
5. Opportunità SEO e raccomandazioni prioritizzate

Rispondi solo con un oggetto JSON con le chiavi:
traffico_organico, keywords_organiche, backlinks, domini_referenti,
competitors, trend_analisi, raccomandazioni
"#;

const COMPETITOR_ANALYZER: &str = r#"Analizza i risultati di ricerca per identificare e profilare i competitor.

RISULTATI RICERCA:
{data}

PER OGNI COMPETITOR IDENTIFICATO, ESTRAI:
1. Nome azienda e ragione sociale
2. Sito web principale
3. Servizi e prodotti principali
4. Presenza geografica

Rispondi solo con un oggetto JSON con la chiave "competitors": un array
ordinato per rilevanza, ogni elemento con nome_azienda, sito_web,
descrizione_business, servizi_principali, area_geografica
"#;

const SOCIAL_ANALYZER: &str = r#"Analizza la presenza social dell'azienda.

DATI SOCIAL:
{data}

ANALIZZA E FORNISCI, PER OGNI PIATTAFORMA:
1. Follower/fan count
2. Engagement rate medio
3. Frequenza di posting
4. Tipo di contenuti pubblicati
5. Performance e raccomandazioni

Rispondi solo con un oggetto JSON con una chiave per piattaforma, ognuna con:
platform, follower_count, engagement_rate, posting_frequency,
content_types, performance_insights
"#;

const FINANCIAL_ANALYZER: &str = r#"Analizza i dati finanziari e societari forniti.

DATI FINANZIARI:
{data}

CONDUCI ANALISI SU:
1. Fatturato degli ultimi anni disponibili
2. Crescita anno su anno (%)
3. Patrimonio netto e capitale sociale
4. Numero dipendenti
5. Indicatori di solidità finanziaria

Rispondi solo con un oggetto JSON con le chiavi:
fatturato_evolution (anno -> importo), growth_rates, financial_indicators,
employee_data, financial_health_assessment
"#;

const REPORT_GENERATOR: &str = r#"Crea un report esecutivo completo e professionale.

DATI COMPLETI RACCOLTI:
{data}

Rispondi solo con un oggetto JSON con le chiavi:
executive_summary (3-4 punti chiave), sector, swot_analysis,
strategic_recommendations (azionabili e prioritizzate), conclusions.
Ogni valore è testo Markdown comprensibile per executive non tecnici.
"#;

/// Fills the template for `kind` with `data`, appending `context` when present.
pub fn render(kind: PromptKind, data: &str, context: &str) -> String {
    let mut prompt = kind.template().replace("{data}", data);
    if !context.trim().is_empty() {
        prompt.push_str("\n\nCONTESTO AGGIUNTIVO:\n");
        prompt.push_str(context.trim());
    }
    prompt
}

/// The three searches the competitor agent runs
pub fn competitor_queries(company_name: &str, sector: &str) -> Vec<String> {
    let third = if sector.trim().is_empty() {
        format!("{company_name} simili aziende")
    } else {
        format!("{sector} aziende italiane")
    };
    vec![
        format!("{company_name} competitor"),
        format!("{company_name} alternative"),
        third,
    ]
}
