use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::models::RawBlogPost;

/// Where fresh posts come from when the cached snapshot is stale.
#[async_trait]
pub trait BlogSource: Send + Sync {
    async fn fetch_posts(&self) -> Result<Vec<RawBlogPost>>;
}

/// Single GET against the dev.to articles endpoint. No retries and no
/// timeout beyond whatever the `Client` was built with.
pub struct DevToSource {
    client: Client,
    endpoint: String,
}

impl DevToSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl BlogSource for DevToSource {
    async fn fetch_posts(&self) -> Result<Vec<RawBlogPost>> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.endpoint))?
            .error_for_status()
            .with_context(|| format!("{} returned an error status", self.endpoint))?;

        response
            .json::<Vec<RawBlogPost>>()
            .await
            .with_context(|| format!("failed to decode posts from {}", self.endpoint))
    }
}
