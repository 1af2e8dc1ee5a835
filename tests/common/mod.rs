//! Local stand-ins for SEMRush, Serper, a company website and the language model.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::Query;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use bi_analyzer::analyzer::{BusinessAnalyzer, Services};
use bi_analyzer::cache::ResponseCache;
use bi_analyzer::clients::{ApiClient, LanguageModel, SemrushClient, SerperClient, WebsiteScraper};
use bi_analyzer::config::ApiKey;
use bi_analyzer::error::ClientResult;
use bi_analyzer::rate_limit::RateLimiter;
use bi_analyzer::retry::RetryPolicy;
use bi_analyzer::state::AppState;

pub const HOMEPAGE: &str = r#"<html>
<head><title>Venezianico Orologi</title><meta name="description" content="Orologi da Venezia"></head>
<body>
  <a href="https://www.instagram.com/venezianico">Instagram</a>
  <a href="mailto:info@venezianico.com">Contatti</a>
</body>
</html>"#;

/// Replies by agent role, the way the real model would answer each prompt
#[derive(Default)]
pub struct FakeModel {
    pub calls: AtomicUsize,
}

impl FakeModel {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    async fn complete(&self, preamble: &str, _prompt: &str) -> ClientResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = if preamble.contains("SEO") {
            r#"{"traffico_organico": 8400, "keywords_organiche": 1520, "backlinks": 320}"#
        } else if preamble.contains("competitor") {
            "```json\n{\"competitors\": [{\"nome_azienda\": \"Rivale\", \"sito_web\": \"rivale.it\"}]}\n```"
        } else if preamble.contains("social") {
            r#"{"instagram": {"platform": "instagram", "follower_count": 0}}"#
        } else if preamble.contains("finanziario") {
            r#"{"fatturato_evolution": {"2022": 900000, "2023": 1250000}}"#
        } else {
            r#"{"executive_summary": "Azienda in crescita nel digitale", "sector": "Orologeria"}"#
        };
        Ok(reply.to_string())
    }
}

async fn semrush(Query(params): Query<HashMap<String, String>>) -> String {
    match params.get("type").map(String::as_str) {
        Some("domain_organic") => "Dn;Cr;Np;Or;Ot;Oc;Ad;At;Ac\nvenezianico.com;1;0;1520;8400;1200;0;0;0",
        Some("backlinks_overview") => "ERROR 50 :: NOTHING FOUND",
        _ => "Dn;Cr;Np;Or\nrivale.it;0.31;120;900",
    }
    .to_string()
}

async fn serper(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "searchParameters": {"q": body["q"], "type": "search"},
        "organic": [
            {"title": "Rivale - Orologi", "link": "https://rivale.it", "snippet": "Orologi italiani", "position": 1}
        ]
    }))
}

/// Starts the stub upstream server and returns its base URL
pub async fn start_upstream() -> String {
    let router = Router::new()
        .route("/semrush", get(semrush))
        .route("/serper/search", post(serper))
        .route("/site", get(|| async { Html(HOMEPAGE) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn services(upstream: &str, model: Arc<FakeModel>) -> Services {
    let api = Arc::new(ApiClient::from_parts(
        reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap(),
        RateLimiter::new(),
        ResponseCache::new(Duration::from_secs(60)),
        RetryPolicy::new(2).with_base_delay(Duration::from_millis(1)),
    ));
    Services {
        semrush: SemrushClient::new(api.clone(), ApiKey::new("semrush-key"), format!("{}/semrush", upstream)),
        serper: SerperClient::new(api, ApiKey::new("serper-key"), format!("{}/serper/", upstream)),
        scraper: WebsiteScraper::new().unwrap(),
        model,
    }
}

pub fn analyzer(upstream: &str, model: Arc<FakeModel>) -> BusinessAnalyzer {
    BusinessAnalyzer::new(&services(upstream, model), Duration::from_secs(30))
}

pub fn app_state(upstream: &str, model: Arc<FakeModel>) -> AppState {
    let services = services(upstream, model);
    let analyzer = BusinessAnalyzer::new(&services, Duration::from_secs(30));
    AppState::new(analyzer, services.scraper)
}
