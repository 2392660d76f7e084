//! Language Server Protocol server for navigating web links
//!
//! This crate turns "go to definition" on a hyperlink in a Markdown or text
//! document into a local, readable Markdown snapshot of the linked page.
//!
//! # Architecture
//!
//! A request flows through these layers:
//!
//! 1. **Transport**: Content-Length framed JSON-RPC over any async byte stream
//! 2. **Dispatcher**: routes `initialize` and `textDocument/definition`, answers
//!    everything else with "method not found", and isolates handler failures
//! 3. **Link extraction**: finds the link under the cursor on a single line
//! 4. **Fetch pipeline**: denylist, cache lookup, HTTP fetch, HTML to Markdown
//!    conversion, length gate, cache write
//!
//! # Outcomes
//!
//! The editor receives one of:
//!
//! - a `Location` pointing at the cached Markdown file
//! - `null`, when there is no link under the cursor
//! - `null` preceded by a `window/showDocument` request asking the editor to
//!   open the URL in its external handler (denylisted hosts, failed fetches,
//!   pages without enough readable content)

pub mod context;
pub mod document;
pub mod extract;
pub mod fetcher;
pub mod handlers;
pub mod link;
pub mod server;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export public API
pub use context::{default_cache_root, LspContext, ServerConfig};
pub use extract::{Article, ContentExtractor, HtmlExtractor};
pub use fetcher::{ExternalReason, FetchOutcome, FetchPipeline, PipelineConfig};
pub use handlers::HandlerOutput;
pub use link::extract_link;
pub use server::{Dispatched, Dispatcher, LspServer};
pub use transport::{LspMessage, MessageTransport};
pub use types::{LinkSpan, Location, LspError, LspResult, Position, Range, ServerState};
