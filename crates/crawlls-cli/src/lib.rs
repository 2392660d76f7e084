// CrawlLS CLI Library

pub mod commands;
pub mod error;
pub mod logging;
pub mod router;

pub use commands::{Command, LspCommand, LspConfig};
pub use error::{CliError, CliResult};
pub use logging::{init_logging, parse_level};
pub use router::{Cli, CommandRouter};
