use crate::handlers::{
    analyze_handler, dashboard, enrich_handler, export_csv_handler, export_json_handler,
    export_results_csv_handler, health_check, input_handler, report_handler,
};
use crate::state::AppState;
use axum::{Router, routing::get, routing::post};

/// Creates and configures all application routes
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health_check))
        .route("/api/input", post(input_handler))
        .route("/api/enrich", post(enrich_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/report", post(report_handler))
        .route("/api/export/csv", post(export_csv_handler))
        .route("/api/export/results/csv", post(export_results_csv_handler))
        .route("/api/export/json", post(export_json_handler))
}
