//! Runs the competitor searches for a company against Serper.dev and prints
//! what comes back. Needs only SERPER_API_KEY.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bi_analyzer::agents::prompts::competitor_queries;
use bi_analyzer::cache::ResponseCache;
use bi_analyzer::clients::{ApiClient, SerperClient};
use bi_analyzer::config::{ApiKey, DEFAULT_SERPER_API_BASE};
use bi_analyzer::rate_limit::RateLimiter;
use bi_analyzer::retry::RetryPolicy;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let company = std::env::args()
        .nth(1)
        .context("usage: serper-search <company name> [sector]")?;
    let sector = std::env::args().nth(2).unwrap_or_default();

    let api_key = std::env::var("SERPER_API_KEY").context("SERPER_API_KEY not set")?;
    let base_url =
        std::env::var("SERPER_API_BASE").unwrap_or_else(|_| DEFAULT_SERPER_API_BASE.to_string());

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let api = Arc::new(ApiClient::from_parts(
        http,
        RateLimiter::new(),
        ResponseCache::new(Duration::from_secs(3600)),
        RetryPolicy::new(3),
    ));
    let serper = SerperClient::new(api, ApiKey::new(api_key), base_url);

    println!("🚀 Serper.dev competitor search for {}", company);
    println!("{}", "=".repeat(50));

    for query in competitor_queries(&company, &sector) {
        println!("\n{}", "─".repeat(40));
        println!("🔍 Query: {}", query);

        match serper.search(&query).await {
            Ok(response) => {
                println!("📋 Results Count: {}", response.organic.len());
                for (i, item) in response.organic.iter().enumerate().take(5) {
                    println!("\n{}. {}", i + 1, item.title);
                    println!("   🔗 {}", item.link);
                    let snippet: String = item.snippet.chars().take(100).collect();
                    println!("   📝 {}", snippet);
                }
                if let Some(related) = response.related_searches.as_ref().and_then(|r| r.as_array()) {
                    println!("\n💡 Related searches: {}", related.len());
                }
            }
            Err(error) => println!("❌ Search failed: {}", error),
        }
    }

    println!("\n{}", "=".repeat(50));
    println!("🏁 Done");
    Ok(())
}
