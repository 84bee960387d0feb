//! External Reference Lookup
//!
//! Thin client over the Wikipedia action API: given a company name, return
//! an intro extract and an optional thumbnail, or `NotFound` when no page
//! exists. The endpoint is injectable so tests can point it elsewhere.

use crate::error::ApiError;
use serde::Serialize;

pub const WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";

#[derive(Debug, Clone, Serialize)]
pub struct CompanyDetails {
    pub company_name: String,
    pub description: String,
    pub thumbnail: String,
}

#[derive(Debug, Clone)]
pub struct ReferenceLookup {
    client: reqwest::Client,
    endpoint: String,
}

impl ReferenceLookup {
    pub fn new() -> Self {
        Self::with_endpoint(WIKIPEDIA_API_URL)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub async fn fetch(&self, company_name: &str) -> Result<CompanyDetails, ApiError> {
        let response: serde_json::Value = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("titles", company_name),
                ("prop", "extracts|pageimages"),
                ("exintro", "true"),
                ("explaintext", "true"),
                ("pithumbsize", "500"),
            ])
            .send()
            .await?
            .json()
            .await?;

        let not_found = || ApiError::NotFound("Company details not found".to_string());

        let pages = response
            .get("query")
            .and_then(|q| q.get("pages"))
            .and_then(|p| p.as_object())
            .ok_or_else(not_found)?;
        let page = pages.values().next().ok_or_else(not_found)?;
        if page.get("missing").is_some() {
            return Err(not_found());
        }

        let description = page
            .get("extract")
            .and_then(|v| v.as_str())
            .unwrap_or("No description available")
            .to_string();
        let thumbnail = page
            .get("thumbnail")
            .and_then(|t| t.get("source"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Ok(CompanyDetails {
            company_name: company_name.to_string(),
            description,
            thumbnail,
        })
    }
}

impl Default for ReferenceLookup {
    fn default() -> Self {
        Self::new()
    }
}
