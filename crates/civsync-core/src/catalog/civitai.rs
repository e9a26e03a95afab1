//! Catalog source backed by the public REST API.

use super::query::{model_url, version_by_hash_url, version_url, CatalogRequest};
use super::CatalogSource;
use crate::config::NetworkSettings;
use crate::models::{CatalogPage, ModelRecord, ModelVersion};
use crate::network::{CatalogHttpClient, RequestOptions};
use crate::Result;
use async_trait::async_trait;
use tracing::info;

/// REST client for the model catalog.
#[derive(Clone)]
pub struct CivitaiClient {
    http: CatalogHttpClient,
    api_base: String,
}

impl CivitaiClient {
    pub fn new(settings: &NetworkSettings) -> Result<Self> {
        Ok(Self::with_http(CatalogHttpClient::new(settings)?, &settings.api_base))
    }

    pub(crate) fn with_http(http: CatalogHttpClient, api_base: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a model with the model page as referer, as the site itself does.
    pub async fn fetch_model_with_referer(&self, model_id: u64) -> Result<ModelRecord> {
        self.http
            .get_json(
                &model_url(&self.api_base, model_id),
                RequestOptions {
                    referer_model: Some(model_id),
                    anonymous: false,
                },
            )
            .await
    }
}

#[async_trait]
impl CatalogSource for CivitaiClient {
    fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn fetch_page(&self, request: &CatalogRequest) -> Result<CatalogPage> {
        let page: CatalogPage = self
            .http
            .get_json(request.as_str(), RequestOptions::default())
            .await?;
        info!("Fetched {} models", page.items.len());
        Ok(page)
    }

    async fn fetch_version(&self, version_id: u64) -> Result<ModelVersion> {
        self.http
            .get_json(
                &version_url(&self.api_base, version_id),
                RequestOptions::default(),
            )
            .await
    }

    async fn fetch_version_by_hash(&self, hash: &str) -> Result<ModelVersion> {
        self.http
            .get_json(
                &version_by_hash_url(&self.api_base, hash),
                RequestOptions::default(),
            )
            .await
    }

    async fn fetch_model(&self, model_id: u64) -> Result<ModelRecord> {
        self.fetch_model_with_referer(model_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::lookup_by_hash;
    use crate::network::local_server::{local_client, reply, serve};
    use crate::CivsyncError;

    #[test]
    fn test_api_base_trimmed() {
        let settings = NetworkSettings {
            api_base: "https://catalog.test/api/v1/".into(),
            ..Default::default()
        };
        let client = CivitaiClient::new(&settings).unwrap();
        assert_eq!(client.api_base(), "https://catalog.test/api/v1");
    }

    #[tokio::test]
    async fn test_hash_lookup_404_is_hash_not_found() {
        let base = serve(vec![reply("404 Not Found", r#"{"error": "Model not found"}"#)]).await;
        let settings = NetworkSettings::default();
        let client = CivitaiClient::with_http(local_client(&settings), &base);

        let input = "ab".repeat(32);
        let err = lookup_by_hash(&client, &input).await.unwrap_err();
        assert!(
            matches!(err, CivsyncError::HashNotFound { ref hash } if hash == &"AB".repeat(32))
        );
    }
}
