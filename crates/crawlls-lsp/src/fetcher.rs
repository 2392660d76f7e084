//! Fetch-and-convert pipeline
//!
//! Resolves a link target to either a local Markdown snapshot or a decision to
//! open it externally. Each step may short-circuit:
//!
//! 1. classify the URL (unfetchable schemes, denylisted hosts)
//! 2. look up the content cache
//! 3. fetch the page over HTTP
//! 4. extract the article and convert it to Markdown
//! 5. reject pages whose content is too short to be useful
//! 6. persist the snapshot
//!
//! Steps 2 to 6 run under the per-entry cache lock, so concurrent resolutions
//! of one URL perform at most one fetch.

use std::{path::PathBuf, sync::Arc};

use crawlls_cache::ContentCache;
use crawlls_http::HttpClientTrait;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    extract::ContentExtractor,
    types::{LspError, LspResult},
};

/// Default minimum length, in characters, of extracted content worth caching
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 200;

/// Hosts whose pages are always opened externally
pub const DEFAULT_DENYLIST: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "vimeo.com",
    "twitter.com",
    "x.com",
];

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Trimmed content shorter than this is rejected
    pub min_content_length: usize,
    /// Hosts never fetched; subdomains are included
    pub denylist: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_content_length: DEFAULT_MIN_CONTENT_LENGTH,
            denylist: DEFAULT_DENYLIST.iter().map(|h| h.to_string()).collect(),
        }
    }
}

impl PipelineConfig {
    /// Set the minimum content length
    pub fn with_min_content_length(mut self, min_content_length: usize) -> Self {
        self.min_content_length = min_content_length;
        self
    }

    /// Replace the denylist
    pub fn with_denylist<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denylist = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `host` is a denylisted host or a subdomain of one
    pub fn is_denylisted(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.denylist.iter().any(|denied| {
            host == *denied
                || host
                    .strip_suffix(denied.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

/// Why a link is handed to the client instead of being opened locally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalReason {
    /// Host is on the denylist
    Denylisted,
    /// Not an absolute http(s) URL
    Unfetchable,
    /// Network error, timeout, or non-success status
    FetchFailed,
    /// Extracted content below the minimum length
    ContentTooShort,
}

/// Result of resolving a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Snapshot already on disk
    Cached(PathBuf),
    /// Snapshot fetched and written by this resolution
    Fetched(PathBuf),
    /// Open the URL in the client's external handler
    External(ExternalReason),
}

impl FetchOutcome {
    /// Local snapshot path, if the URL resolved to one
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            FetchOutcome::Cached(path) | FetchOutcome::Fetched(path) => Some(path),
            FetchOutcome::External(_) => None,
        }
    }
}

/// Fetch-and-convert pipeline over a cache, an HTTP client and an extractor
#[derive(Clone)]
pub struct FetchPipeline {
    cache: Arc<ContentCache>,
    http: Arc<dyn HttpClientTrait>,
    extractor: Arc<dyn ContentExtractor>,
    config: PipelineConfig,
}

impl FetchPipeline {
    /// Create a new pipeline
    pub fn new(
        cache: Arc<ContentCache>,
        http: Arc<dyn HttpClientTrait>,
        extractor: Arc<dyn ContentExtractor>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            cache,
            http,
            extractor,
            config,
        }
    }

    /// The cache snapshots are written to
    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    /// Pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resolve `url` to a local snapshot or an external redirect.
    ///
    /// Expected failures (denylist, network, short content) are reported as
    /// [`FetchOutcome::External`]; only cache I/O and internal faults are errors.
    pub async fn resolve(&self, url: &str) -> LspResult<FetchOutcome> {
        let parsed = match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
            _ => {
                debug!("Not fetchable: {}", url);
                return Ok(FetchOutcome::External(ExternalReason::Unfetchable));
            }
        };

        let Some(host) = parsed.host_str() else {
            return Ok(FetchOutcome::External(ExternalReason::Unfetchable));
        };
        if self.config.is_denylisted(host) {
            debug!("Denylisted host {}: {}", host, url);
            return Ok(FetchOutcome::External(ExternalReason::Denylisted));
        }

        let _guard = self.cache.lock(url).await;

        if let Some(path) = self.cache.lookup(url).await? {
            debug!("Cache hit for {}: {}", url, path.display());
            return Ok(FetchOutcome::Cached(path));
        }

        let response = match self.http.get(url).await {
            Ok(response) => response,
            Err(e) => {
                match e.status() {
                    Some(status) => warn!("Fetch failed for {} with status {}", url, status),
                    None => warn!("Fetch failed for {}: {}", url, e),
                }
                return Ok(FetchOutcome::External(ExternalReason::FetchFailed));
            }
        };
        debug!(
            "Fetched {} (status {}, {} bytes)",
            response.url,
            response.status,
            response.body.len()
        );

        // Relative links resolve against the final URL after redirects
        let base = Url::parse(&response.url).unwrap_or(parsed);
        let extractor = Arc::clone(&self.extractor);
        let article = tokio::task::spawn_blocking(move || extractor.extract(&response.body, &base))
            .await
            .map_err(|e| LspError::InternalError(format!("Content extraction failed: {}", e)))?;

        let length = article.content.trim().chars().count();
        if length < self.config.min_content_length {
            info!(
                "Content too short for {} ({} < {} chars), opening externally",
                url, length, self.config.min_content_length
            );
            return Ok(FetchOutcome::External(ExternalReason::ContentTooShort));
        }

        let path = self.cache.store(url, &article.to_markdown()).await?;
        info!("Cached {} at {}", url, path.display());
        Ok(FetchOutcome::Fetched(path))
    }
}
