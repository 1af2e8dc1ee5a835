use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ClientError, ClientResult};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const SCRAPE_TIMEOUT: Duration = Duration::from_secs(10);
const EXCERPT_CHARS: usize = 2000;

static SOCIAL_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("facebook", r#"(?i)facebook\.com/[^/\s"'?#]+"#),
        ("instagram", r#"(?i)instagram\.com/[^/\s"'?#]+"#),
        ("linkedin", r#"(?i)linkedin\.com/company/[^/\s"'?#]+"#),
        ("youtube", r#"(?i)youtube\.com/[^/\s"'?#]+"#),
        ("twitter", r#"(?i)twitter\.com/[^/\s"'?#]+"#),
        ("tiktok", r#"(?i)tiktok\.com/@[^/\s"'?#]+"#),
    ]
    .into_iter()
    .map(|(platform, pattern)| (platform, Regex::new(pattern).expect("valid social regex")))
    .collect()
});

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\+39\s?)?[\d\s\-()]{8,15}").expect("valid phone regex"));

/// What a company homepage tells us about the company
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WebsiteInfo {
    pub url: String,
    pub website_title: String,
    pub website_description: String,
    pub social_links: BTreeMap<String, String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub text_excerpt: String,
}

/// Check if a URL is likely to be scrapeable (HTML content)
pub fn is_scrapeable_url(url: &str) -> bool {
    let url_lower = url.to_lowercase();

    let non_scrapeable_extensions = [
        ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".zip", ".rar", ".tar", ".gz",
        ".7z", ".mp3", ".mp4", ".avi", ".mov", ".wav", ".jpg", ".jpeg", ".png", ".gif", ".bmp",
        ".svg", ".exe", ".dmg",
    ];

    !non_scrapeable_extensions
        .iter()
        .any(|ext| url_lower.ends_with(ext))
}

/// Fetches company homepages over plain HTTP and extracts contact details
#[derive(Clone)]
pub struct WebsiteScraper {
    http: reqwest::Client,
}

impl WebsiteScraper {
    pub fn new() -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(SCRAPE_TIMEOUT)
            .cookie_store(true)
            .build()?;
        Ok(Self { http })
    }

    /// Scrapes a domain or URL; bare domains are fetched over https.
    pub async fn scrape(&self, domain_or_url: &str) -> ClientResult<WebsiteInfo> {
        let target = domain_or_url.trim();
        if target.is_empty() {
            return Err(ClientError::InvalidInput("URL cannot be empty".to_string()));
        }
        let url = if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            format!("https://{}", target)
        };
        if !is_scrapeable_url(&url) {
            return Err(ClientError::InvalidInput(format!(
                "{} does not point to an HTML page",
                url
            )));
        }

        info!("Scraping website {}", url);
        let response = self.http.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(url.clone())
            } else {
                ClientError::Http(e)
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            warn!("Website {} answered {}", url, status);
            return Err(ClientError::Status {
                service: url,
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let html = response.text().await?;
        Ok(extract_page_info(&url, &html))
    }
}

/// Extracts title, description, social links and contacts from a page.
pub fn extract_page_info(url: &str, html: &str) -> WebsiteInfo {
    let document = Html::parse_document(html);
    let mut info = WebsiteInfo {
        url: url.to_string(),
        ..Default::default()
    };

    if let Ok(selector) = Selector::parse("title") {
        if let Some(title) = document.select(&selector).next() {
            info.website_title = clean_text(&title.text().collect::<String>());
        }
    }
    if let Ok(selector) = Selector::parse(r#"meta[name="description"]"#) {
        if let Some(meta) = document.select(&selector).next() {
            info.website_description = meta.value().attr("content").unwrap_or("").trim().to_string();
        }
    }

    // links live in href attributes far more often than in visible text
    let mut haystack: Vec<String> = Vec::new();
    if let Ok(selector) = Selector::parse("a[href]") {
        haystack.extend(
            document
                .select(&selector)
                .filter_map(|a| a.value().attr("href"))
                .map(str::to_string),
        );
    }
    let text = visible_text(&document);
    haystack.push(text.clone());
    let haystack = haystack.join("\n");

    for (platform, pattern) in SOCIAL_PATTERNS.iter() {
        if let Some(m) = pattern.find(&haystack) {
            info.social_links
                .insert(platform.to_string(), format!("https://{}", m.as_str()));
        }
    }

    let emails: BTreeSet<String> = EMAIL_RE
        .find_iter(&haystack.replace("mailto:", " "))
        .map(|m| m.as_str().to_string())
        .collect();
    info.emails = emails.into_iter().collect();

    let phones: BTreeSet<String> = PHONE_RE
        .find_iter(&text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|p| p.chars().filter(char::is_ascii_digit).count() >= 8)
        .collect();
    info.phones = phones.into_iter().collect();

    info.text_excerpt = text.chars().take(EXCERPT_CHARS).collect();
    info
}

/// Text nodes of the document, skipping script and style content
fn visible_text(document: &Html) -> String {
    let mut lines = Vec::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_string()))
            .is_some_and(|name| matches!(name.as_str(), "script" | "style" | "noscript"));
        if !hidden {
            lines.push(text.trim().to_string());
        }
    }
    clean_text(&lines.join("\n"))
}

/// Clean and normalize extracted text
fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && line.len() > 2)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::test_support::serve;
    use axum::{Router, response::Html as HtmlResponse, routing::get};

    const PAGE: &str = r#"<html>
        <head>
            <title> Venezianico | Orologi </title>
            <meta name="description" content=" Orologi ispirati a Venezia ">
            <style>.x { color: red }</style>
            <script>var tracking = "ignored@script.js";</script>
        </head>
        <body>
            <a href="https://www.instagram.com/venezianico/">Instagram</a>
            <a href="https://it.linkedin.com/company/venezianico">LinkedIn</a>
            <a href="mailto:info@venezianico.com">Scrivici</a>
            <p>Seguici su tiktok.com/@venezianico</p>
            <p>Telefono: +39 041 5223344</p>
            <p>Ordini: ordini@venezianico.com</p>
        </body>
    </html>"#;

    #[test]
    fn test_extract_page_info() {
        let info = extract_page_info("https://venezianico.com", PAGE);
        assert_eq!(info.website_title, "Venezianico | Orologi");
        assert_eq!(info.website_description, "Orologi ispirati a Venezia");
        assert_eq!(
            info.social_links.get("instagram").map(String::as_str),
            Some("https://instagram.com/venezianico")
        );
        assert_eq!(
            info.social_links.get("linkedin").map(String::as_str),
            Some("https://linkedin.com/company/venezianico")
        );
        assert_eq!(
            info.social_links.get("tiktok").map(String::as_str),
            Some("https://tiktok.com/@venezianico")
        );
        assert!(!info.social_links.contains_key("facebook"));
        assert_eq!(
            info.emails,
            vec!["info@venezianico.com", "ordini@venezianico.com"]
        );
        assert!(info.phones.iter().any(|p| p.contains("041 5223344")));
        assert!(!info.text_excerpt.contains("tracking"));
    }

    #[test]
    fn test_is_scrapeable_url() {
        assert!(is_scrapeable_url("https://example.com"));
        assert!(is_scrapeable_url("https://news.com/story.html"));
        assert!(!is_scrapeable_url("https://example.com/file.pdf"));
        assert!(!is_scrapeable_url("https://site.com/FILE.PDF"));
        assert!(!is_scrapeable_url("https://site.com/image.jpg"));
    }

    #[tokio::test]
    async fn test_scrape_fetches_and_extracts() {
        let base = serve(Router::new().route("/", get(|| async { HtmlResponse(PAGE) }))).await;
        let scraper = WebsiteScraper::new().unwrap();

        let info = scraper.scrape(&base).await.unwrap();
        assert_eq!(info.website_title, "Venezianico | Orologi");
        assert_eq!(info.url, base);

        let err = scraper.scrape("https://example.com/report.pdf").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }
}
