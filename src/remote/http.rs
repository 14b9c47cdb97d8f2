use super::CatalogClient;
use crate::config::SyncConfig;
use crate::core::{Entity, PageResponse, Result, SyncError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{Level, event};

/// [`CatalogClient`] over the catalog's REST endpoint.
///
/// Pages are requested as `GET <base>?page=<n>[&name=<filter>]`, single
/// entities as `GET <base>/<id>`.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Self::new(&config.base_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        not_found: Option<i64>,
    ) -> Result<Option<T>> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        event!(Level::DEBUG, %url, status = status.as_u16(), "catalog response");

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = not_found {
                return Err(SyncError::NotFound(id));
            }
        }
        if !status.is_success() {
            return Err(SyncError::RemoteFetch(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&body).map_err(|e| {
            SyncError::RemoteFetch(format!("Malformed payload from {}: {}", url, e))
        })
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn fetch_page(
        &self,
        page: u32,
        name_filter: Option<&str>,
    ) -> Result<Option<PageResponse>> {
        let mut query = vec![("page", page.to_string())];
        if let Some(name) = name_filter.filter(|name| !name.is_empty()) {
            query.push(("name", name.to_string()));
        }
        let request = self.http.get(&self.base_url).query(&query);
        self.get_json(request, None).await
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Option<Entity>> {
        let request = self.http.get(format!("{}/{}", self.base_url, id));
        self.get_json(request, Some(id)).await
    }
}
