pub mod llm;
pub mod semrush;
pub mod serper;
pub mod website;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use tracing::{debug, info};

use crate::cache::ResponseCache;
use crate::config::{Config, Service};
use crate::error::{ClientError, ClientResult};
use crate::rate_limit::RateLimiter;
use crate::retry::RetryPolicy;

pub use llm::{LanguageModel, OpenAiModel};
pub use semrush::SemrushClient;
pub use serper::{OrganicResult, SearchParameters, SearchResponse, SerperClient};
pub use website::{WebsiteInfo, WebsiteScraper};

/// HTTP plumbing shared by every upstream client: one connection pool,
/// one rate limiter, one response cache and one retry policy.
pub struct ApiClient {
    http: reqwest::Client,
    limiter: RateLimiter,
    cache: ResponseCache,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(config: &Config) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.api_timeout())
            .build()?;
        Ok(Self::from_parts(
            http,
            RateLimiter::new(),
            ResponseCache::new(config.cache_ttl()),
            RetryPolicy::new(config.max_retries),
        ))
    }

    pub fn from_parts(
        http: reqwest::Client,
        limiter: RateLimiter,
        cache: ResponseCache,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http,
            limiter,
            cache,
            retry,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// GET `url` and return the body. `secret` is masked in logs and cache keys.
    pub async fn get_text(&self, service: Service, url: &str, secret: &str) -> ClientResult<String> {
        self.get_text_checked(service, url, secret, |_| Ok(())).await
    }

    /// Like [`ApiClient::get_text`], but `check` inspects the body first.
    /// Bodies rejected by `check` are returned as errors and never cached.
    pub async fn get_text_checked<C>(
        &self,
        service: Service,
        url: &str,
        secret: &str,
        check: C,
    ) -> ClientResult<String>
    where
        C: Fn(&str) -> ClientResult<()>,
    {
        let masked = mask(url, secret);
        let cache_key = ResponseCache::key(service.name(), &[("url", masked.as_str())]);
        if let Some(body) = self.cache.get(&cache_key).await {
            return Ok(body);
        }

        info!("Calling {}: GET {}", service, masked);
        let body = self
            .retry
            .run(service.name(), || async move {
                self.limiter.acquire(service).await;
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| transport_error(service, e))?;
                read_body(service, response).await
            })
            .await?;

        check(&body)?;
        self.cache.set(cache_key, body.clone()).await;
        Ok(body)
    }

    /// POST a JSON body and return the response body.
    pub async fn post_json(
        &self,
        service: Service,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> ClientResult<String> {
        let payload = serde_json::to_string(body)?;
        let cache_key = ResponseCache::key(
            service.name(),
            &[("url", url), ("body", payload.as_str())],
        );
        if let Some(body) = self.cache.get(&cache_key).await {
            return Ok(body);
        }

        let mut header_map = HeaderMap::new();
        header_map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in headers {
            let value = HeaderValue::from_str(value).map_err(|e| ClientError::Api {
                service: service.to_string(),
                message: format!("invalid header {}: {}", name, e),
            })?;
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| ClientError::Api {
                service: service.to_string(),
                message: format!("invalid header name {}: {}", name, e),
            })?;
            header_map.insert(name, value);
        }

        info!("Calling {}: POST {}", service, url);
        let response_body = self
            .retry
            .run(service.name(), || {
                let headers = header_map.clone();
                let payload = payload.clone();
                async move {
                    self.limiter.acquire(service).await;
                    let response = self
                        .http
                        .post(url)
                        .headers(headers)
                        .body(payload)
                        .send()
                        .await
                        .map_err(|e| transport_error(service, e))?;
                    read_body(service, response).await
                }
            })
            .await?;

        self.cache.set(cache_key, response_body.clone()).await;
        Ok(response_body)
    }
}

fn mask(url: &str, secret: &str) -> String {
    if secret.is_empty() {
        url.to_string()
    } else {
        url.replace(secret, "***API_KEY***")
    }
}

fn transport_error(service: Service, e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout(service.to_string())
    } else {
        ClientError::Http(e.without_url())
    }
}

async fn read_body(service: Service, response: reqwest::Response) -> ClientResult<String> {
    let status = response.status();
    debug!("{} responded with {}", service, status);
    if status == StatusCode::TOO_MANY_REQUESTS {
        let wait_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        return Err(ClientError::RateLimited {
            service: service.to_string(),
            wait_secs,
        });
    }
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(service, e))?;
    if !status.is_success() {
        return Err(ClientError::Status {
            service: service.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Joins a base URL and a path with exactly one slash
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::time::Duration;

    use axum::Router;

    use super::ApiClient;
    use crate::cache::ResponseCache;
    use crate::rate_limit::RateLimiter;
    use crate::retry::RetryPolicy;

    /// Client with short retry delays for tests talking to local stub servers
    pub(crate) fn api_client() -> ApiClient {
        ApiClient::from_parts(
            reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("test http client"),
            RateLimiter::new(),
            ResponseCache::new(Duration::from_secs(60)),
            RetryPolicy::new(3).with_base_delay(Duration::from_millis(1)),
        )
    }

    /// Serves `router` on an ephemeral local port and returns its base URL
    pub(crate) async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
