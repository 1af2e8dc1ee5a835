use std::collections::BTreeMap;
use std::sync::Arc;

use csv::{ReaderBuilder, Trim};
use tracing::{info, warn};

use crate::clients::ApiClient;
use crate::config::{ApiKey, SEMRUSH_DATABASE, SemrushReport, Service};
use crate::error::{ClientError, ClientResult};

/// Reports fetched for every analysed domain
pub const DEFAULT_REPORTS: [SemrushReport; 3] = [
    SemrushReport::Organic,
    SemrushReport::Backlinks,
    SemrushReport::Competitors,
];

pub type ReportRow = BTreeMap<String, String>;

/// SEMRush analytics API. Responses are `;`-separated text with a header line.
#[derive(Clone)]
pub struct SemrushClient {
    api: Arc<ApiClient>,
    api_key: ApiKey,
    base_url: String,
}

impl SemrushClient {
    pub fn new(api: Arc<ApiClient>, api_key: ApiKey, base_url: impl Into<String>) -> Self {
        Self {
            api,
            api_key,
            base_url: base_url.into(),
        }
    }

    fn report_url(&self, domain: &str, report: SemrushReport) -> String {
        format!(
            "{}?type={}&key={}&display_limit={}&export_columns={}&domain={}&database={}",
            self.base_url,
            report.api_type(),
            urlencoding::encode(self.api_key.expose()),
            report.display_limit(),
            urlencoding::encode(report.export_columns()),
            urlencoding::encode(domain),
            SEMRUSH_DATABASE
        )
    }

    /// Raw report text. SEMRush reports failures as `ERROR ...` bodies with HTTP 200.
    pub async fn fetch_report(&self, domain: &str, report: SemrushReport) -> ClientResult<String> {
        if self.api_key.is_blank() {
            return Err(ClientError::MissingKey(Service::Semrush));
        }
        if domain.trim().is_empty() {
            return Err(ClientError::InvalidInput("invalid domain".to_string()));
        }

        self.api
            .get_text_checked(
                Service::Semrush,
                &self.report_url(domain, report),
                &urlencoding::encode(self.api_key.expose()),
                check_report_body,
            )
            .await
    }

    /// Fetches organic, backlinks and competitors reports, keyed by report name.
    /// A failing report is skipped; the call only fails when every report does.
    pub async fn fetch_all(&self, domain: &str) -> ClientResult<BTreeMap<String, String>> {
        let mut reports = BTreeMap::new();
        let mut last_error = None;

        for report in DEFAULT_REPORTS {
            match self.fetch_report(domain, report).await {
                Ok(body) => {
                    reports.insert(report.key().to_string(), body);
                }
                Err(e) => {
                    warn!("SEMRush {} report failed for {}: {}", report.key(), domain, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if reports.is_empty() => Err(e),
            _ => {
                info!("Fetched {} SEMRush reports for {}", reports.len(), domain);
                Ok(reports)
            }
        }
    }
}

fn check_report_body(body: &str) -> ClientResult<()> {
    if body.trim_start().starts_with("ERROR") {
        return Err(ClientError::Api {
            service: Service::Semrush.to_string(),
            message: body.trim().to_string(),
        });
    }
    Ok(())
}

/// Parses a SEMRush report body into header -> value rows.
pub fn parse_report(body: &str) -> ClientResult<Vec<ReportRow>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .trim(Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::test_support::{api_client, serve};
    use axum::{Router, extract::Query, routing::get};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn fake_semrush(Query(params): Query<HashMap<String, String>>) -> String {
        assert_eq!(params.get("key").map(String::as_str), Some("sem key"));
        assert_eq!(params.get("database").map(String::as_str), Some("it"));
        match params.get("type").map(String::as_str) {
            Some("domain_organic") => {
                assert_eq!(params.get("display_limit").map(String::as_str), Some("50"));
                "Domain;Rank;Organic Keywords;Organic Traffic\nvenezianico.com;120345;1520;8400".to_string()
            }
            Some("domain_organic_organic") => {
                assert_eq!(params.get("display_limit").map(String::as_str), Some("20"));
                "Domain;Competitor Relevance\nrivale.it;0.42\naltro.it;0.31".to_string()
            }
            _ => "ERROR 50 :: NOTHING FOUND".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_all_skips_failed_reports() {
        let base = serve(Router::new().route("/", get(fake_semrush))).await;
        let client = SemrushClient::new(
            Arc::new(api_client()),
            ApiKey::new("sem key"),
            format!("{}/", base),
        );

        let reports = client.fetch_all("venezianico.com").await.unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.contains_key("organic"));
        assert!(reports.contains_key("competitors"));
        assert!(!reports.contains_key("backlinks"));

        let competitors = parse_report(&reports["competitors"]).unwrap();
        assert_eq!(competitors.len(), 2);
        assert_eq!(competitors[0]["Domain"], "rivale.it");
    }

    #[tokio::test]
    async fn test_error_body_is_an_api_error() {
        let base = serve(Router::new().route("/", get(fake_semrush))).await;
        let client =
            SemrushClient::new(Arc::new(api_client()), ApiKey::new("sem key"), base);

        let err = client
            .fetch_report("venezianico.com", SemrushReport::Paid)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { .. }));
        assert!(err.to_string().contains("NOTHING FOUND"));
    }

    #[tokio::test]
    async fn test_error_bodies_are_not_cached() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        "ERROR 132 :: API UNITS BALANCE IS ZERO".to_string()
                    } else {
                        "Dn;Or\nvenezianico.com;1520".to_string()
                    }
                }
            }),
        );
        let base = serve(router).await;
        let client = SemrushClient::new(Arc::new(api_client()), ApiKey::new("k"), base);

        let first = client
            .fetch_report("venezianico.com", SemrushReport::Organic)
            .await;
        assert!(matches!(first, Err(ClientError::Api { .. })));

        let second = client
            .fetch_report("venezianico.com", SemrushReport::Organic)
            .await
            .unwrap();
        assert_eq!(second, "Dn;Or\nvenezianico.com;1520");
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        client
            .fetch_report("venezianico.com", SemrushReport::Organic)
            .await
            .unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_domain_is_rejected() {
        let client = SemrushClient::new(
            Arc::new(api_client()),
            ApiKey::new("k"),
            "http://127.0.0.1:9/",
        );
        let err = client.fetch_report(" ", SemrushReport::Organic).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_blank_key_fails_before_calling_semrush() {
        let client = SemrushClient::new(
            Arc::new(api_client()),
            ApiKey::new(" "),
            "http://127.0.0.1:9/",
        );
        let err = client
            .fetch_report("acme.it", SemrushReport::Organic)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingKey(Service::Semrush)));
    }

    #[test]
    fn test_parse_report() {
        let rows = parse_report("Dn;Or;Ot\nacme.it; 150 ;3200\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Dn"], "acme.it");
        assert_eq!(rows[0]["Or"], "150");
        assert!(parse_report("").unwrap().is_empty());
    }
}
