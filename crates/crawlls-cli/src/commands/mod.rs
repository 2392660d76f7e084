// Command handlers for the crawlls CLI

pub mod lsp;

pub use lsp::{LspCommand, LspConfig};

use crate::error::CliResult;

/// Trait for command handlers
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command
    async fn execute(&self) -> CliResult<()>;
}
