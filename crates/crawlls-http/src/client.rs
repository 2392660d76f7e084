//! HTTP client implementation

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::{
    config::HttpConfig,
    error::{HttpError, Result},
};

/// A fetched page: final URL after redirects, status and decoded body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// URL the body was served from
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Response body decoded as text
    pub body: String,
}

/// Mockable HTTP client trait
#[async_trait]
pub trait HttpClientTrait: Send + Sync {
    /// Execute a GET request and return the body of a 2xx response
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// Production HTTP client
pub struct HttpClient {
    inner: reqwest::Client,
    config: HttpConfig,
}

impl HttpClient {
    /// Create a new HTTP client with configuration
    pub fn new(config: HttpConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .redirect(if config.max_redirects > 0 {
                reqwest::redirect::Policy::limited(config.max_redirects)
            } else {
                reqwest::redirect::Policy::none()
            });

        if let Some(proxy_url) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| HttpError::InvalidProxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let inner = builder
            .build()
            .map_err(|e| HttpError::BuildError(e.to_string()))?;

        Ok(Self { inner, config })
    }

    /// Create HTTP client with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(HttpConfig::default())
    }

    /// Get configuration
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn classify(&self, err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(self.config.timeout)
        } else {
            HttpError::RequestFailed(err)
        }
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        debug!("HTTP GET: {}", url);

        let url = url
            .parse::<url::Url>()
            .map_err(|e| HttpError::InvalidUrl(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HttpError::UnsupportedScheme(url.scheme().to_string()));
        }

        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::HttpStatus {
                status,
                message: status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string(),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        debug!("HTTP GET {} -> {} ({} bytes)", final_url, status, body.len());

        Ok(HttpResponse {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}

/// Create a shared HTTP client (Arc-wrapped for cloning)
pub fn shared_client(config: HttpConfig) -> Result<Arc<dyn HttpClientTrait>> {
    Ok(Arc::new(HttpClient::new(config)?))
}
