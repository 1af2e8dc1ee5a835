use axum::{
    extract::{Json, State},
    http::{HeaderValue, header},
    response::{Html, IntoResponse, Json as ResponseJson, Response},
};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use crate::clients::WebsiteInfo;
use crate::error::{AppError, AppResult};
use crate::models::{AnalysisRequest, AnalysisResults, EnrichRequest, HealthResponse, InputResponse};
use crate::state::AppState;
use crate::{export, format, input, validation};

const DASHBOARD_HTML: &str = include_str!("../assets/index.html");

/// GET / - Serve the dashboard.
pub async fn dashboard() -> impl IntoResponse {
    Html(DASHBOARD_HTML)
}

/// Health check handler
/// Returns the service status and health information
pub async fn health_check() -> AppResult<ResponseJson<HealthResponse>> {
    debug!("Health check endpoint called");

    let response = HealthResponse::ok();

    info!("Health check successful");
    Ok(ResponseJson(response))
}

fn validated(payload: &AnalysisRequest) -> AppResult<&str> {
    if !payload.is_valid() {
        return Err(AppError::ValidationError(
            "Input cannot be empty or only whitespace".to_string(),
        ));
    }
    Ok(payload.input.trim())
}

async fn run_analysis(state: &AppState, payload: &AnalysisRequest) -> AppResult<AnalysisResults> {
    let user_input = validated(payload)?;
    info!("Analysis requested for: {}", user_input);
    Ok(state.analyzer.analyze(user_input, None).await)
}

fn attachment(content_type: &'static str, filename: &str, body: String) -> AppResult<Response> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|e| AppError::InternalServerError(format!("Invalid filename: {}", e)))?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// POST /api/analyze - Run the full pipeline and return every section.
/// Failed sections are reported inside the results, not as an HTTP error.
pub async fn analyze_handler(
    State(state): State<AppState>,
    Json(payload): Json<AnalysisRequest>,
) -> AppResult<ResponseJson<AnalysisResults>> {
    let results = run_analysis(&state, &payload).await?;
    Ok(ResponseJson(results))
}

/// POST /api/report - Run the pipeline and download the Markdown report
pub async fn report_handler(
    State(state): State<AppState>,
    Json(payload): Json<AnalysisRequest>,
) -> AppResult<Response> {
    let results = run_analysis(&state, &payload).await?;
    let Some(report) = results.final_report else {
        return Err(AppError::Upstream(results.error.unwrap_or_else(|| {
            "The report could not be generated".to_string()
        })));
    };

    let filename = format::report_filename(&results.company_name, "business_analysis", Utc::now());
    info!("Report ready: {}.md ({} bytes)", filename, report.len());
    attachment(
        "text/markdown; charset=utf-8",
        &format!("{}.md", filename),
        report,
    )
}

/// POST /api/export/csv - Run the pipeline and download the metrics table
pub async fn export_csv_handler(
    State(state): State<AppState>,
    Json(payload): Json<AnalysisRequest>,
) -> AppResult<Response> {
    let results = run_analysis(&state, &payload).await?;
    let csv = export::to_csv(&results)?;
    let filename = format::report_filename(&results.company_name, "data_export", Utc::now());
    attachment("text/csv; charset=utf-8", &format!("{}.csv", filename), csv)
}

/// POST /api/export/results/csv - Metrics table from results returned by an earlier analysis
pub async fn export_results_csv_handler(Json(results): Json<Value>) -> AppResult<Response> {
    if !results.is_object() {
        return Err(AppError::ValidationError(
            "Expected the analysis results object".to_string(),
        ));
    }
    let csv = export::results_json_to_csv(&results)?;
    let company_name = results
        .get("company_name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let filename = format::report_filename(company_name, "data_export", Utc::now());
    attachment("text/csv; charset=utf-8", &format!("{}.csv", filename), csv)
}

/// POST /api/export/json - Run the pipeline and download the raw results
pub async fn export_json_handler(
    State(state): State<AppState>,
    Json(payload): Json<AnalysisRequest>,
) -> AppResult<Response> {
    let results = run_analysis(&state, &payload).await?;
    let json = export::to_json(&results, true)?;
    let filename = format::report_filename(&results.company_name, "raw_data", Utc::now());
    attachment("application/json", &format!("{}.json", filename), json)
}

/// POST /api/input - Classify an input without calling any external service
pub async fn input_handler(Json(payload): Json<AnalysisRequest>) -> AppResult<ResponseJson<InputResponse>> {
    let user_input = validated(&payload)?;
    debug!("Classifying input: {}", user_input);

    let analysis = input::identify(user_input);
    let company_name = input::company_name_from_input(user_input);
    let clean_company_name = input::clean_company_name(&company_name);
    let partita_iva = input::partita_iva_from_input(user_input);

    Ok(ResponseJson(InputResponse {
        analysis,
        partita_iva_valid: validation::validate_partita_iva(&partita_iva),
        domain_suggestions: input::domain_suggestions(&clean_company_name),
        company_name,
        clean_company_name,
        partita_iva,
    }))
}

/// POST /api/enrich - Scrape a company website for title, contacts and social links
pub async fn enrich_handler(
    State(state): State<AppState>,
    Json(payload): Json<EnrichRequest>,
) -> AppResult<ResponseJson<WebsiteInfo>> {
    info!("Enrich endpoint called for URL: {}", payload.url);

    if payload.url.trim().is_empty() {
        return Err(AppError::ValidationError("URL cannot be empty".to_string()));
    }

    let info = state.scraper.scrape(&payload.url).await?;

    info!(
        "Scraped {}: {} social links, {} emails",
        info.url,
        info.social_links.len(),
        info.emails.len()
    );
    Ok(ResponseJson(info))
}
