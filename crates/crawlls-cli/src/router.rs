// Command-line parsing and dispatch

use std::path::PathBuf;

use clap::Parser;

use crate::{
    commands::{Command, LspCommand},
    error::CliResult,
};

/// CrawlLS - open web links as local Markdown from your editor
#[derive(Parser, Debug)]
#[command(name = "crawlls")]
#[command(bin_name = "crawlls")]
#[command(about = "Language server that opens web links as cached Markdown snapshots")]
#[command(
    long_about = "CrawlLS speaks the Language Server Protocol on stdin/stdout.\n\nGo to definition on a link in any document fetches the page, converts it to Markdown, caches it, and jumps to the cached file. Links that cannot be shown locally are handed back to the editor to open externally."
)]
#[command(version)]
pub struct Cli {
    /// Directory for cached Markdown snapshots (default: <temp dir>/crawl-ls)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Enable debug mode for verbose logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Build the command this invocation describes
    pub fn command(&self) -> LspCommand {
        LspCommand::new(self.cache_dir.clone(), self.log_level.clone(), self.debug)
    }
}

/// Command router
pub struct CommandRouter;

impl CommandRouter {
    /// Parse process arguments and run the server
    pub async fn route() -> CliResult<()> {
        let cli = Cli::parse();
        cli.command().execute().await
    }
}
