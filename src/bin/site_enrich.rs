//! Scrapes a company website and prints the contact details and social
//! links found on it.

use std::time::Instant;

use anyhow::{Context, Result};
use bi_analyzer::clients::WebsiteScraper;
use bi_analyzer::input;

#[tokio::main]
async fn main() -> Result<()> {
    let target = std::env::args()
        .nth(1)
        .context("usage: site-enrich <url, domain or company input>")?;
    let site = input::domain_from_input(&target).unwrap_or(target);

    let scraper = WebsiteScraper::new()?;
    let started = Instant::now();
    let info = scraper.scrape(&site).await?;
    println!(
        "✅ Scraped {} in {:.2}s",
        info.url,
        started.elapsed().as_secs_f64()
    );

    println!("Title: {}", info.website_title);
    println!("Description: {}", info.website_description);
    for (platform, link) in &info.social_links {
        println!("🔗 {}: {}", platform, link);
    }
    for email in &info.emails {
        println!("✉️  {}", email);
    }
    for phone in &info.phones {
        println!("📞 {}", phone);
    }

    println!("\n📄 Text excerpt:");
    println!("{}", "─".repeat(60));
    println!("{}", info.text_excerpt);
    println!("{}", "─".repeat(60));
    Ok(())
}
