use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::clients::{ApiClient, endpoint};
use crate::config::{ApiKey, SERPER_GL, SERPER_HL, SERPER_NUM_RESULTS, Service};
use crate::error::{ClientError, ClientResult};

// -- data structures that capture the search results

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(rename = "searchParameters", default)]
    pub search_parameters: Option<SearchParameters>,
    #[serde(default)]
    pub organic: Vec<OrganicResult>,
    #[serde(
        rename = "knowledgeGraph",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub knowledge_graph: Option<serde_json::Value>,
    #[serde(
        rename = "relatedSearches",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub related_searches: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchParameters {
    pub q: String,
    #[serde(rename = "type", default)]
    pub search_type: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrganicResult {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub position: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Google search through Serper.dev, localised for Italy
#[derive(Clone)]
pub struct SerperClient {
    api: Arc<ApiClient>,
    api_key: ApiKey,
    base_url: String,
}

impl SerperClient {
    pub fn new(api: Arc<ApiClient>, api_key: ApiKey, base_url: impl Into<String>) -> Self {
        Self {
            api,
            api_key,
            base_url: base_url.into(),
        }
    }

    pub async fn search(&self, query: &str) -> ClientResult<SearchResponse> {
        if self.api_key.is_blank() {
            return Err(ClientError::MissingKey(Service::Serper));
        }
        let payload = json!({
            "q": query,
            "gl": SERPER_GL,
            "hl": SERPER_HL,
            "num": SERPER_NUM_RESULTS,
        });

        let body = self
            .api
            .post_json(
                Service::Serper,
                &endpoint(&self.base_url, "search"),
                &[("X-API-KEY", self.api_key.expose())],
                &payload,
            )
            .await?;

        let response: SearchResponse = serde_json::from_str(&body)?;
        info!(
            "Serper returned {} organic results for '{}'",
            response.organic.len(),
            query
        );
        Ok(response)
    }
}
