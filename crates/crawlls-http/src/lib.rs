//! HTTP client for CrawlLS
//!
//! Fetches the raw HTML behind a link so it can be converted to Markdown.
//!
//! ## Features
//!
//! - **Trait-based design**: Mockable via `HttpClientTrait`
//! - **Configurable**: Timeouts, redirects, proxy, user-agent
//! - **Bounded**: Every request carries a request and connect timeout
//! - **Testing support**: Easy mocking with wiremock

pub mod client;
pub mod config;
pub mod error;

pub use client::{shared_client, HttpClient, HttpClientTrait, HttpResponse};
pub use config::HttpConfig;
pub use error::{HttpError, Result};

/// Re-export commonly used types
pub use reqwest::StatusCode;
