//! The analysis pipeline: SEO, competitors, social, financial, report.
//!
//! Each step owns one section of [`AnalysisResults`]. A failing section is
//! recorded in place and the remaining steps still run; the whole run is
//! bounded by the analysis deadline, after which partial results are kept.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::agents::{CompetitorAgent, FinancialAgent, ReportAgent, SeoAgent, SocialAgent};
use crate::clients::{ApiClient, LanguageModel, OpenAiModel, SemrushClient, SerperClient, WebsiteScraper};
use crate::config::Config;
use crate::error::ClientResult;
use crate::models::{AnalysisResults, ProgressSummary, SectionOutcome};
use crate::retry::with_deadline;

/// One stage of the pipeline
#[async_trait]
pub trait AnalysisStep: Send + Sync {
    fn name(&self) -> &'static str;

    /// Progress message shown while the step runs
    fn description(&self) -> &'static str;

    async fn run(&self, results: &mut AnalysisResults) -> ClientResult<()>;
}

pub struct SeoStep(pub SeoAgent);

#[async_trait]
impl AnalysisStep for SeoStep {
    fn name(&self) -> &'static str {
        "seo"
    }

    fn description(&self) -> &'static str {
        "Analisi SEO e traffico con SEMRush..."
    }

    async fn run(&self, results: &mut AnalysisResults) -> ClientResult<()> {
        let outcome = self.0.analyze_company(&results.input).await;
        if let Ok(section) = &outcome {
            results.website = section.domain.clone();
        }
        results.analysis_results.semrush = Some(SectionOutcome::from(outcome));
        Ok(())
    }
}

pub struct CompetitorStep(pub CompetitorAgent);

#[async_trait]
impl AnalysisStep for CompetitorStep {
    fn name(&self) -> &'static str {
        "competitors"
    }

    fn description(&self) -> &'static str {
        "Ricerca competitor con Serper.dev..."
    }

    async fn run(&self, results: &mut AnalysisResults) -> ClientResult<()> {
        let outcome = self.0.search_competitors(&results.company_name, "").await;
        results.analysis_results.competitors = Some(SectionOutcome::from(outcome));
        Ok(())
    }
}

pub struct SocialStep(pub SocialAgent);

#[async_trait]
impl AnalysisStep for SocialStep {
    fn name(&self) -> &'static str {
        "social"
    }

    fn description(&self) -> &'static str {
        "Analisi profili social media..."
    }

    async fn run(&self, results: &mut AnalysisResults) -> ClientResult<()> {
        let website = Some(results.website.as_str()).filter(|w| !w.is_empty());
        let outcome = self
            .0
            .find_social_profiles(&results.company_name, website)
            .await;
        results.analysis_results.social = Some(SectionOutcome::from(outcome));
        Ok(())
    }
}

pub struct FinancialStep(pub FinancialAgent);

#[async_trait]
impl AnalysisStep for FinancialStep {
    fn name(&self) -> &'static str {
        "financial"
    }

    fn description(&self) -> &'static str {
        "Ricerca dati finanziari..."
    }

    async fn run(&self, results: &mut AnalysisResults) -> ClientResult<()> {
        let outcome = self
            .0
            .analyze_financial_data(&results.partita_iva, &results.company_name)
            .await;
        results.analysis_results.financial = Some(SectionOutcome::from(outcome));
        Ok(())
    }
}

pub struct ReportStep(pub ReportAgent);

#[async_trait]
impl AnalysisStep for ReportStep {
    fn name(&self) -> &'static str {
        "report"
    }

    fn description(&self) -> &'static str {
        "Generazione report finale..."
    }

    async fn run(&self, results: &mut AnalysisResults) -> ClientResult<()> {
        let report = self.0.generate(results).await?;
        results.final_report = Some(report);
        Ok(())
    }
}

/// Upstream clients and the language model shared by all agents
#[derive(Clone)]
pub struct Services {
    pub semrush: SemrushClient,
    pub serper: SerperClient,
    pub scraper: WebsiteScraper,
    pub model: Arc<dyn LanguageModel>,
}

impl Services {
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let api = Arc::new(ApiClient::new(config)?);
        Ok(Self {
            semrush: SemrushClient::new(
                api.clone(),
                config.semrush_api_key.clone(),
                config.semrush_api_base.as_str(),
            ),
            serper: SerperClient::new(
                api.clone(),
                config.serper_api_key.clone(),
                config.serper_api_base.as_str(),
            ),
            scraper: WebsiteScraper::new()?,
            model: Arc::new(OpenAiModel::new(config, api)),
        })
    }
}

/// Snapshot of pipeline progress, sent to listeners as steps start and finish
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub current_step: usize,
    pub total_steps: usize,
    pub progress_percent: f64,
    pub description: String,
    pub elapsed_seconds: f64,
    pub eta: String,
}

/// Step counter with elapsed time and a naive ETA
pub struct ProgressTracker {
    total_steps: usize,
    current_step: usize,
    step_descriptions: BTreeMap<usize, String>,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(total_steps: usize) -> Self {
        Self {
            total_steps,
            current_step: 0,
            step_descriptions: BTreeMap::new(),
            started: Instant::now(),
        }
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Marks one more step as done.
    pub fn update(&mut self, description: &str) -> ProgressUpdate {
        self.current_step += 1;
        if !description.is_empty() {
            self.step_descriptions
                .insert(self.current_step, description.to_string());
        }
        let update = self.snapshot(self.current_step, description);
        info!(
            "Progress: {:.1}% - {}{}",
            update.progress_percent, description, update.eta
        );
        update
    }

    /// Announces the next step without counting it as done.
    pub fn starting(&self, description: &str) -> ProgressUpdate {
        self.snapshot(self.current_step + 1, description)
    }

    fn snapshot(&self, step: usize, description: &str) -> ProgressUpdate {
        let elapsed = self.started.elapsed().as_secs_f64();
        let done = self.current_step;
        let percent = if self.total_steps == 0 {
            100.0
        } else {
            done as f64 / self.total_steps as f64 * 100.0
        };
        ProgressUpdate {
            current_step: step,
            total_steps: self.total_steps,
            progress_percent: percent,
            description: description.to_string(),
            elapsed_seconds: elapsed,
            eta: eta_string(elapsed, done, self.total_steps),
        }
    }

    pub fn summary(&self) -> ProgressSummary {
        let total_time = self.started.elapsed().as_secs_f64();
        ProgressSummary {
            total_steps: self.total_steps,
            completed_steps: self.current_step,
            total_time_seconds: total_time,
            average_step_time: total_time / self.current_step.max(1) as f64,
            step_descriptions: self.step_descriptions.clone(),
            success_rate: self.current_step as f64 / self.total_steps.max(1) as f64 * 100.0,
        }
    }
}

/// `" (ETA: 1m 30s)"`, or empty before the first step completes or after the last.
fn eta_string(elapsed_secs: f64, done: usize, total: usize) -> String {
    if done == 0 || done >= total {
        return String::new();
    }
    let eta = (elapsed_secs / done as f64 * (total - done) as f64) as u64;
    if eta == 0 {
        return String::new();
    }
    format!(" (ETA: {}m {}s)", eta / 60, eta % 60)
}

/// Runs the analysis steps in order for one input
pub struct BusinessAnalyzer {
    steps: Vec<Box<dyn AnalysisStep>>,
    deadline: Duration,
}

impl BusinessAnalyzer {
    pub fn new(services: &Services, deadline: Duration) -> Self {
        let model = &services.model;
        Self::from_steps(
            vec![
                Box::new(SeoStep(SeoAgent::new(model.clone(), services.semrush.clone()))),
                Box::new(CompetitorStep(CompetitorAgent::new(
                    model.clone(),
                    services.serper.clone(),
                ))),
                Box::new(SocialStep(SocialAgent::new(
                    model.clone(),
                    services.scraper.clone(),
                ))),
                Box::new(FinancialStep(FinancialAgent::new(model.clone()))),
                Box::new(ReportStep(ReportAgent::new(model.clone()))),
            ],
            deadline,
        )
    }

    pub fn from_steps(steps: Vec<Box<dyn AnalysisStep>>, deadline: Duration) -> Self {
        Self { steps, deadline }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Runs every step and always returns the results gathered so far.
    /// Progress snapshots go to `progress` when a listener is attached.
    pub async fn analyze(
        &self,
        input: &str,
        progress: Option<mpsc::Sender<ProgressUpdate>>,
    ) -> AnalysisResults {
        let mut results = AnalysisResults::new(input);
        let mut tracker = ProgressTracker::new(self.steps.len());
        info!(
            "Starting analysis of '{}' ({:?}, confidence {:.1})",
            results.input, results.input_analysis.input_type, results.input_analysis.confidence
        );

        let run = self.run_steps(&mut results, &mut tracker, progress.as_ref());
        if let Err(e) = with_deadline(self.deadline, run).await {
            warn!("Analysis of '{}' stopped early: {}", input, e);
            results.error = Some(e.to_string());
        }

        results.progress = Some(tracker.summary());
        info!(
            "Analysis of '{}' finished ({} of {} steps)",
            results.input,
            tracker.current_step(),
            self.steps.len()
        );
        results
    }

    async fn run_steps(
        &self,
        results: &mut AnalysisResults,
        tracker: &mut ProgressTracker,
        progress: Option<&mpsc::Sender<ProgressUpdate>>,
    ) {
        for step in &self.steps {
            if let Some(tx) = progress {
                let _ = tx.send(tracker.starting(step.description())).await;
            }

            if let Err(e) = step.run(results).await {
                error!("Step {} failed: {}", step.name(), e);
                results.error = Some(format!("{}: {}", step.name(), e));
            }

            let update = tracker.update(step.description());
            if let Some(tx) = progress {
                let _ = tx.send(update).await;
            }
        }
    }
}
