use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::agents::AnalystAgent;
use crate::agents::prompts::PromptKind;
use crate::clients::{LanguageModel, WebsiteInfo, WebsiteScraper};
use crate::error::ClientResult;
use crate::models::{SocialProfile, SocialSection};

/// Platforms looked up for every company
pub const PROFILE_PLATFORMS: [&str; 5] = ["instagram", "facebook", "linkedin", "youtube", "tiktok"];

/// Social media presence discovery
#[derive(Clone)]
pub struct SocialAgent {
    analyst: AnalystAgent,
    scraper: WebsiteScraper,
}

impl SocialAgent {
    pub fn new(model: Arc<dyn LanguageModel>, scraper: WebsiteScraper) -> Self {
        Self {
            analyst: AnalystAgent::new(PromptKind::Social, model),
            scraper,
        }
    }

    /// Builds one profile per platform. Links found on the company website
    /// win over guessed profile URLs.
    pub async fn find_social_profiles(
        &self,
        company_name: &str,
        website: Option<&str>,
    ) -> ClientResult<SocialSection> {
        let website = match website.map(str::trim).filter(|w| !w.is_empty()) {
            Some(site) => match self.scraper.scrape(site).await {
                Ok(info) => Some(info),
                Err(e) => {
                    warn!("Could not scrape {} for social links: {}", site, e);
                    None
                }
            },
            None => None,
        };

        let social_profiles = build_profiles(company_name, website.as_ref());
        let found = social_profiles.values().filter(|p| p.found).count();
        info!(
            "Found {} of {} social profiles for {}",
            found,
            social_profiles.len(),
            company_name
        );

        let data = serde_json::to_string(&social_profiles)?;
        let context = format!("Analisi profili social per: {}", company_name);
        let social_analysis = self.analyst.analyze(&data, &context).await?;

        Ok(SocialSection {
            website,
            social_profiles,
            social_analysis,
        })
    }
}

/// Profiles for every platform in [`PROFILE_PLATFORMS`]
pub fn build_profiles(
    company_name: &str,
    website: Option<&WebsiteInfo>,
) -> BTreeMap<String, SocialProfile> {
    let handle: String = company_name
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    PROFILE_PLATFORMS
        .iter()
        .map(|platform| {
            let linked = website.and_then(|site| site.social_links.get(*platform));
            let profile = SocialProfile {
                platform: platform.to_string(),
                profile_url: linked
                    .cloned()
                    .unwrap_or_else(|| format!("https://{}.com/{}", platform, handle)),
                found: linked.is_some(),
                followers: 0,
                posts: 0,
            };
            (platform.to_string(), profile)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::ScriptedModel;
    use crate::clients::test_support::serve;
    use axum::{Router, response::Html, routing::get};

    #[test]
    fn test_guessed_profiles_without_website() {
        let profiles = build_profiles("Venezianico Orologi", None);
        assert_eq!(profiles.len(), 5);
        let instagram = &profiles["instagram"];
        assert_eq!(
            instagram.profile_url,
            "https://instagram.com/venezianicoorologi"
        );
        assert!(!instagram.found);
        assert!(!profiles.contains_key("twitter"));
    }

    #[test]
    fn test_website_links_are_used_when_present() {
        let mut site = WebsiteInfo::default();
        site.social_links.insert(
            "linkedin".to_string(),
            "https://linkedin.com/company/venezianico".to_string(),
        );
        let profiles = build_profiles("Venezianico", Some(&site));
        assert!(profiles["linkedin"].found);
        assert_eq!(
            profiles["linkedin"].profile_url,
            "https://linkedin.com/company/venezianico"
        );
        assert!(!profiles["facebook"].found);
    }

    #[tokio::test]
    async fn test_find_profiles_scrapes_website() {
        let base = serve(Router::new().route(
            "/",
            get(|| async {
                Html(r#"<html><head><title>Venezianico</title></head>
                <body><a href="https://www.instagram.com/venezianico">IG</a></body></html>"#)
            }),
        ))
        .await;
        let model = Arc::new(ScriptedModel::new().otherwise(r#"{"instagram": {"platform": "instagram"}}"#));
        let agent = SocialAgent::new(model.clone(), WebsiteScraper::new().unwrap());

        let section = agent
            .find_social_profiles("Venezianico", Some(&base))
            .await
            .unwrap();
        assert_eq!(section.website.as_ref().unwrap().website_title, "Venezianico");
        assert!(section.social_profiles["instagram"].found);
        assert!(!section.social_profiles["tiktok"].found);
        assert_eq!(section.social_analysis["instagram"]["platform"], "instagram");
    }

    #[tokio::test]
    async fn test_unreachable_website_falls_back_to_guesses() {
        let model = Arc::new(ScriptedModel::new().otherwise("{}"));
        let agent = SocialAgent::new(model, WebsiteScraper::new().unwrap());

        let section = agent
            .find_social_profiles("Acme", Some("http://127.0.0.1:9"))
            .await
            .unwrap();
        assert!(section.website.is_none());
        assert!(section.social_profiles.values().all(|p| !p.found));
    }
}
