//! Shared fixtures for unit tests

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use crawlls_http::{HttpClientTrait, HttpError, HttpResponse};

use crate::{context::LspContext, extract::HtmlExtractor, fetcher::PipelineConfig};

/// HTTP client serving a fixed body and counting requests
pub struct MockHttp {
    body: String,
    fail: bool,
    calls: AtomicUsize,
}

impl MockHttp {
    pub fn serving(body: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            body: body.into(),
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            body: String::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClientTrait for MockHttp {
    async fn get(&self, url: &str) -> crawlls_http::Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        if self.fail {
            return Err(HttpError::Timeout(Duration::from_secs(15)));
        }
        Ok(HttpResponse {
            url: url.to_string(),
            status: 200,
            body: self.body.clone(),
        })
    }
}

/// A page whose article comfortably passes the length gate
pub fn long_page() -> String {
    let paragraph =
        "Rust is a language empowering everyone to build reliable and efficient software. ";
    format!(
        "<html><head><title>Rust</title></head><body><article><p>{}</p></article></body></html>",
        paragraph.repeat(4)
    )
}

/// Context over a temp cache root and a mock HTTP client
pub fn context(cache_root: &std::path::Path, http: Arc<MockHttp>) -> LspContext {
    LspContext::with_parts(
        cache_root,
        http,
        Arc::new(HtmlExtractor::new()),
        PipelineConfig::default(),
    )
}
