//! HTTP client for the catalog API.
//!
//! Provides a wrapper around reqwest with:
//! - The fixed browser-like header set the catalog expects
//! - Optional bearer credential and per-model `Referer`
//! - Connect/read timeouts and proxy support
//! - Classification of failures into timeout / error / offline

use crate::config::{NetworkConfig, NetworkSettings, ProxySettings};
use crate::{CivsyncError, Result};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Certificate, Client, Proxy, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest slice of a non-JSON body kept in the error message.
const BODY_PREVIEW_CHARS: usize = 200;

/// Per-request header options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions {
    /// Model id to send as `Referer: <site>/models/<id>`.
    pub referer_model: Option<u64>,
    /// Suppress the bearer credential even when one is configured.
    pub anonymous: bool,
}

/// HTTP client for catalog requests.
#[derive(Clone)]
pub struct CatalogHttpClient {
    client: Client,
    api_key: Option<String>,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl CatalogHttpClient {
    /// Create a client from network settings.
    pub fn new(settings: &NetworkSettings) -> Result<Self> {
        let client = client_builder(settings)?
            .build()
            .map_err(|e| CivsyncError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                status: None,
            })?;
        Ok(Self::with_client(client, settings))
    }

    /// Wrap an already configured reqwest client.
    pub(crate) fn with_client(client: Client, settings: &NetworkSettings) -> Self {
        Self {
            client,
            api_key: settings.api_key().map(str::to_string),
            connect_timeout: settings.connect_timeout(),
            read_timeout: settings.read_timeout(),
        }
    }

    /// GET a URL and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, opts: RequestOptions) -> Result<T> {
        debug!("GET {}", url);

        let headers = request_headers(self.api_key.as_deref(), opts)?;
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| self.transport_error(url, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(url, &e))?;

        decode_body(url, status, &body)
    }

    fn transport_error(&self, url: &str, err: &reqwest::Error) -> CivsyncError {
        self.transport_failure(url, err.is_timeout(), err.is_connect(), err.to_string())
    }

    /// A timeout reports the limit that fired; anything else is a network error.
    fn transport_failure(
        &self,
        url: &str,
        timed_out: bool,
        connecting: bool,
        detail: String,
    ) -> CivsyncError {
        if timed_out {
            let limit = if connecting {
                self.connect_timeout
            } else {
                self.read_timeout
            };
            warn!("GET {} timed out after {:?}", url, limit);
            CivsyncError::Timeout(limit)
        } else {
            CivsyncError::Network {
                message: format!("GET {} failed: {}", url, detail),
                status: None,
            }
        }
    }
}

/// Turn a completed response into a value or a classified error.
///
/// - A non-2xx status is [`CivsyncError::Network`] carrying the status.
/// - A body that is not JSON at all means the service is down
///   ([`CivsyncError::ServiceUnavailable`]).
/// - JSON of the wrong shape is a [`CivsyncError::Json`] error.
fn decode_body<T: DeserializeOwned>(url: &str, status: StatusCode, body: &str) -> Result<T> {
    if !status.is_success() {
        return Err(CivsyncError::Network {
            message: format!("GET {} returned {}", url, status),
            status: Some(status.as_u16()),
        });
    }

    let value: serde_json::Value = serde_json::from_str(body).map_err(|_| {
        warn!("Catalog returned a non-JSON body for {}", url);
        CivsyncError::ServiceUnavailable {
            message: body.chars().take(BODY_PREVIEW_CHARS).collect(),
        }
    })?;

    serde_json::from_value(value).map_err(|e| CivsyncError::Json {
        message: format!("Unexpected response shape from {}: {}", url, e),
        source: Some(e),
    })
}

/// reqwest builder carrying timeouts, fixed headers and proxy settings.
pub(crate) fn client_builder(settings: &NetworkSettings) -> Result<reqwest::ClientBuilder> {
    let builder = Client::builder()
        .connect_timeout(settings.connect_timeout())
        .read_timeout(settings.read_timeout())
        .user_agent(NetworkConfig::USER_AGENT)
        .default_headers(fixed_headers());
    apply_proxy(builder, &settings.proxy)
}

/// Headers sent with every request.
fn fixed_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        HeaderName::from_static("sec-ch-ua-platform"),
        HeaderValue::from_static(NetworkConfig::PLATFORM_HINT),
    );
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers
}

/// Headers that vary per request: bearer credential and referer.
pub fn request_headers(api_key: Option<&str>, opts: RequestOptions) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    if let Some(model_id) = opts.referer_model {
        let referer = format!("{}/models/{}", NetworkConfig::SITE_BASE, model_id);
        headers.insert(
            header::REFERER,
            HeaderValue::from_str(&referer).map_err(|e| CivsyncError::Validation {
                field: "referer".into(),
                message: e.to_string(),
            })?,
        );
    }

    if let Some(key) = api_key.filter(|_| !opts.anonymous) {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|_| {
            CivsyncError::Config {
                message: "API key contains characters not allowed in a header".into(),
            }
        })?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
    }

    Ok(headers)
}

fn apply_proxy(
    mut builder: reqwest::ClientBuilder,
    proxy: &ProxySettings,
) -> Result<reqwest::ClientBuilder> {
    let Some(url) = proxy.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
        return Ok(builder);
    };

    let proxy_url = if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    };
    let reqwest_proxy = Proxy::all(&proxy_url).map_err(|e| CivsyncError::Config {
        message: format!("Invalid proxy URL {}: {}", proxy_url, e),
    })?;
    builder = builder.proxy(reqwest_proxy);
    debug!("Routing catalog requests through proxy {}", proxy_url);

    if proxy.disable_ssl {
        warn!("Certificate verification disabled for proxied catalog requests");
        builder = builder.danger_accept_invalid_certs(true);
    } else if let Some(bundle) = &proxy.ca_bundle {
        let pem = std::fs::read(bundle).map_err(|e| CivsyncError::io_with_path(e, bundle))?;
        let certs = Certificate::from_pem_bundle(&pem).map_err(|e| CivsyncError::Config {
            message: format!("Invalid CA bundle {}: {}", bundle.display(), e),
        })?;
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
    }

    Ok(builder)
}
