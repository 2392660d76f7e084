//! Server context
//!
//! Everything a handler needs, built once at startup and shared by reference.

use std::{path::PathBuf, sync::Arc, time::Duration};

use crawlls_cache::ContentCache;
use crawlls_http::{shared_client, HttpClientTrait, HttpConfig};

use crate::{
    extract::{ContentExtractor, HtmlExtractor},
    fetcher::{FetchPipeline, PipelineConfig},
    types::{LspError, LspResult},
};

/// Name of the cache directory under the system temp dir
pub const CACHE_DIR_NAME: &str = "crawl-ls";

/// Default cache root, `<temp dir>/crawl-ls`
pub fn default_cache_root() -> PathBuf {
    std::env::temp_dir().join(CACHE_DIR_NAME)
}

/// Server loop configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Pause after a framing error before reading again
    pub framing_error_backoff: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            framing_error_backoff: Duration::from_millis(10),
        }
    }
}

/// Shared server context
#[derive(Clone)]
pub struct LspContext {
    pipeline: FetchPipeline,
    server: ServerConfig,
}

impl LspContext {
    /// Build a context from explicit parts
    pub fn new(pipeline: FetchPipeline, server: ServerConfig) -> Self {
        Self { pipeline, server }
    }

    /// Build the production context: reqwest client, HTML extractor, cache at `cache_root`
    pub fn with_cache_root(
        cache_root: impl Into<PathBuf>,
        http_config: HttpConfig,
        pipeline_config: PipelineConfig,
    ) -> LspResult<Self> {
        let http = shared_client(http_config)
            .map_err(|e| LspError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_parts(
            cache_root,
            http,
            Arc::new(HtmlExtractor::new()),
            pipeline_config,
        ))
    }

    /// Build a context around a given HTTP client and extractor
    pub fn with_parts(
        cache_root: impl Into<PathBuf>,
        http: Arc<dyn HttpClientTrait>,
        extractor: Arc<dyn ContentExtractor>,
        pipeline_config: PipelineConfig,
    ) -> Self {
        let cache = Arc::new(ContentCache::new(cache_root.into()));
        Self::new(
            FetchPipeline::new(cache, http, extractor, pipeline_config),
            ServerConfig::default(),
        )
    }

    /// Replace the server loop configuration
    pub fn with_server_config(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    /// The fetch pipeline
    pub fn pipeline(&self) -> &FetchPipeline {
        &self.pipeline
    }

    /// The content cache
    pub fn cache(&self) -> &Arc<ContentCache> {
        self.pipeline.cache()
    }

    /// Server loop configuration
    pub fn server_config(&self) -> &ServerConfig {
        &self.server
    }
}
