//! Core LSP types and data structures
//!
//! This module defines the error type shared by every layer of the server and
//! the small set of protocol shapes the two supported methods exchange.

use serde::{Deserialize, Serialize};

/// Result type for LSP operations
pub type LspResult<T> = Result<T, LspError>;

/// LSP-specific error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum LspError {
    /// Parse error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Framing error on the transport
    #[error("Framing error: {0}")]
    FramingError(String),

    /// Method not found
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Cache error
    #[error("Cache error: {0}")]
    CacheError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<crawlls_cache::CacheError> for LspError {
    fn from(err: crawlls_cache::CacheError) -> Self {
        LspError::CacheError(err.to_string())
    }
}

/// Server run state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Reading and answering messages
    Running,
    /// The client sent `exit`
    ExitRequested,
    /// The inbound stream ended
    Disconnected,
}

/// Position in a document (line and UTF-16 character offset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Line number (0-based)
    pub line: u32,
    /// Character offset in UTF-16 code units (0-based)
    pub character: u32,
}

impl Position {
    /// Create a new position
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Range in a document (start and end positions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// Start position
    pub start: Position,
    /// End position
    pub end: Position,
}

impl Range {
    /// Create a new range
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-width range at the start of a document
    pub fn document_start() -> Self {
        Self::new(Position::new(0, 0), Position::new(0, 0))
    }
}

/// A location inside a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Resource URI
    pub uri: String,
    /// Range inside the resource
    pub range: Range,
}

/// Identifies a text document by URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDocumentIdentifier {
    /// Document URI
    pub uri: String,
}

/// Parameters of `textDocument/definition`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionParams {
    /// Document the cursor is in
    pub text_document: TextDocumentIdentifier,
    /// Cursor position
    pub position: Position,
}

/// Parameters of the server-initiated `window/showDocument`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowDocumentParams {
    /// URI to show
    pub uri: String,
    /// Open in the client's default external handler
    pub external: bool,
}

/// A navigable URL reference found on a single line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpan {
    /// Resolved link target
    pub url: String,
    /// Half-open `[start, end)` span of the whole link syntax
    pub range: Range,
}

impl LinkSpan {
    /// Move the span onto another line, keeping its character offsets
    pub fn on_line(mut self, line: u32) -> Self {
        self.range.start.line = line;
        self.range.end.line = line;
        self
    }

    /// Whether the UTF-16 offset `character` falls inside the span
    pub fn contains(&self, character: u32) -> bool {
        self.range.start.character <= character && character < self.range.end.character
    }
}
