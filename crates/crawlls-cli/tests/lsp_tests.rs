use crawlls_cli::*;
use std::path::PathBuf;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lsp_command_creation() {
        let cmd = LspCommand::new(
            Some(PathBuf::from("/var/cache/crawlls")),
            Some("debug".to_string()),
            true,
        );
        let config = cmd.get_config();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.cache_dir, PathBuf::from("/var/cache/crawlls"));
        assert!(config.debug);
    }

    #[test]
    fn test_lsp_command_defaults() {
        let cmd = LspCommand::new(None, None, false);
        let config = cmd.get_config();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.cache_dir, std::env::temp_dir().join("crawl-ls"));
        assert!(!config.debug);
    }

    #[test]
    fn test_lsp_command_debug_mode() {
        let cmd = LspCommand::new(None, None, true);
        let config = cmd.get_config();

        assert_eq!(config.log_level, "debug");
        assert!(config.debug);
    }

    #[test]
    fn test_explicit_log_level_wins_over_debug() {
        let cmd = LspCommand::new(None, Some("warn".to_string()), true);
        assert_eq!(cmd.get_config().log_level, "warn");
    }

    #[test]
    fn test_lsp_config_default() {
        let config = LspConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.debug);
        assert!(config.cache_dir.ends_with("crawl-ls"));
    }
}
