//! LSP command - Start the Language Server Protocol server

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use crawlls_http::HttpConfig;
use crawlls_lsp::{default_cache_root, LspContext, LspServer, PipelineConfig};
use tracing::{error, info};

use crate::{
    commands::Command,
    error::{CliError, CliResult},
    logging::{init_logging, parse_level},
};

/// LSP server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LspConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Enable debug mode for verbose logging
    pub debug: bool,
    /// Directory holding cached Markdown snapshots
    pub cache_dir: PathBuf,
}

impl Default for LspConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            debug: false,
            cache_dir: default_cache_root(),
        }
    }
}

/// LSP command handler
pub struct LspCommand {
    cache_dir: Option<PathBuf>,
    log_level: Option<String>,
    debug: bool,
}

impl LspCommand {
    /// Create a new LSP command
    pub fn new(cache_dir: Option<PathBuf>, log_level: Option<String>, debug: bool) -> Self {
        Self {
            cache_dir,
            log_level,
            debug,
        }
    }

    /// Get the LSP configuration
    pub fn get_config(&self) -> LspConfig {
        LspConfig {
            log_level: self.log_level.clone().unwrap_or_else(|| {
                if self.debug {
                    "debug".to_string()
                } else {
                    "info".to_string()
                }
            }),
            debug: self.debug,
            cache_dir: self.cache_dir.clone().unwrap_or_else(default_cache_root),
        }
    }
}

#[async_trait]
impl Command for LspCommand {
    async fn execute(&self) -> CliResult<()> {
        let config = self.get_config();
        let level = parse_level(&config.log_level).ok_or_else(|| CliError::InvalidArgument {
            message: format!("Unknown log level: {}", config.log_level),
        })?;
        init_logging(level, config.debug)?;

        start_lsp_server(config).await
    }
}

/// Build the server context for `config`
pub fn build_context(config: &LspConfig) -> CliResult<LspContext> {
    if config.cache_dir.as_os_str().is_empty() {
        return Err(CliError::Config("Cache directory must not be empty".to_string()));
    }
    // Snapshot locations are sent as file URIs, which need absolute paths
    let cache_dir = if config.cache_dir.is_absolute() {
        config.cache_dir.clone()
    } else {
        std::env::current_dir()?.join(&config.cache_dir)
    };

    Ok(LspContext::with_cache_root(
        cache_dir,
        HttpConfig::default(),
        PipelineConfig::default(),
    )?)
}

/// Start the LSP server on stdio
async fn start_lsp_server(config: LspConfig) -> CliResult<()> {
    info!("Starting LSP server");
    info!("Log level: {}", config.log_level);
    info!("Debug mode: {}", config.debug);

    let context = Arc::new(build_context(&config)?);
    info!("Cache directory: {}", context.cache().root().display());

    let mut server = LspServer::stdio(context);
    info!("Listening on stdio transport");

    tokio::select! {
        result = server.run() => match result {
            Ok(()) => {
                info!("LSP server shut down gracefully");
                Ok(())
            }
            Err(e) => {
                error!("LSP server error: {}", e);
                Err(CliError::Server(e))
            }
        },
        signal = tokio::signal::ctrl_c() => match signal {
            Ok(()) => {
                info!("Received shutdown signal (SIGINT)");
                Ok(())
            }
            Err(e) => {
                error!("Failed to listen for shutdown signal: {}", e);
                Err(CliError::Internal(format!(
                    "Failed to listen for shutdown signal: {}",
                    e
                )))
            }
        }
    }
}
