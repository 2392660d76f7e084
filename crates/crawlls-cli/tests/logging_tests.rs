use crawlls_cli::*;
use tracing::Level;

#[test]
fn test_parse_known_levels() {
    assert_eq!(parse_level("trace"), Some(Level::TRACE));
    assert_eq!(parse_level("info"), Some(Level::INFO));
    assert_eq!(parse_level("ERROR"), Some(Level::ERROR));
}

#[test]
fn test_parse_unknown_level() {
    assert_eq!(parse_level(""), None);
    assert_eq!(parse_level("loud"), None);
}

#[test]
fn test_init_logging_only_once() {
    assert!(init_logging(Level::INFO, false).is_ok());
    assert!(matches!(
        init_logging(Level::DEBUG, true),
        Err(CliError::Logging(_))
    ));
}
