//! Mathematics Genealogy Project HTTP client
//!
//! Implements [`RecordSource`] against the public site: record pages are
//! `GET {base}/id.php?id=N`, name searches are `POST {base}/query-prep.php`
//! with a `family_name` form field. Pages are parsed by
//! [`page_parser`](super::page_parser).

use async_trait::async_trait;
use mathgen_common::config::RemoteConfig;
use std::time::Duration;

use super::page_parser;
use crate::types::{FetchError, PersonId, RawNode, RecordSource, SearchOutcome};

/// HTTP record source
pub struct GenealogyClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GenealogyClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn record_url(&self, id: PersonId) -> String {
        format!("{}/id.php?id={}", self.base_url, id)
    }

    fn search_url(&self) -> String {
        format!("{}/query-prep.php", self.base_url)
    }

    /// Map a request failure to the retry classification
    fn classify_send_error(err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Transient(format!("request timed out: {}", err))
        } else if err.is_connect() {
            FetchError::Network(err.to_string())
        } else if err.is_body() || err.is_decode() {
            // Connection dropped mid-page
            FetchError::Transient(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }

    /// Read the body of a response, classifying the status first
    async fn read_page(response: reqwest::Response) -> Result<String, FetchError> {
        let status = response.status();

        if status.is_server_error() {
            return Err(FetchError::Transient(format!("server answered {}", status)));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FetchError::Api(status.as_u16(), error_text));
        }

        response.text().await.map_err(Self::classify_send_error)
    }
}

#[async_trait]
impl RecordSource for GenealogyClient {
    async fn fetch(&self, id: PersonId) -> Result<RawNode, FetchError> {
        let url = self.record_url(id);
        tracing::debug!(id, url = %url, "Fetching record page");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(Self::classify_send_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(id));
        }

        let page = Self::read_page(response).await?;
        let node = page_parser::parse_node(id, &page)?;

        tracing::debug!(
            id,
            name = %node.name,
            dissertations = node.titles.len(),
            students = node.students.len(),
            "Parsed record page"
        );

        Ok(node)
    }

    async fn search(&self, last_name: &str) -> Result<SearchOutcome, FetchError> {
        let url = self.search_url();
        tracing::debug!(last_name, url = %url, "Searching by last name");

        let response = self
            .http_client
            .post(&url)
            .form(&[("family_name", last_name)])
            .send()
            .await
            .map_err(Self::classify_send_error)?;

        let page = Self::read_page(response).await?;
        let outcome = page_parser::parse_search(&page)?;

        match &outcome {
            SearchOutcome::Candidates(hits) => {
                tracing::debug!(last_name, candidates = hits.len(), "Search answered")
            }
            SearchOutcome::TooMany => {
                tracing::debug!(last_name, "Search refused: too many records")
            }
        }

        Ok(outcome)
    }
}
