//! Application state.

use std::sync::Arc;

use crate::analyzer::{BusinessAnalyzer, Services};
use crate::clients::WebsiteScraper;
use crate::config::Config;
use crate::error::ClientResult;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<BusinessAnalyzer>,
    pub scraper: WebsiteScraper,
}

impl AppState {
    pub fn new(analyzer: BusinessAnalyzer, scraper: WebsiteScraper) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            scraper,
        }
    }

    /// Wires the production clients from the configuration.
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let services = Services::from_config(config)?;
        let analyzer = BusinessAnalyzer::new(&services, config.analysis_timeout());
        Ok(Self::new(analyzer, services.scraper))
    }
}
