//! Request handlers
//!
//! Each handler takes the request params and produces a result value plus, when
//! the client must act on its own, the parameters of a `window/showDocument`
//! request to send ahead of the response.

mod definition;
mod initialize;

pub use definition::handle_definition;
pub use initialize::handle_initialize;

use serde_json::Value;

use crate::types::ShowDocumentParams;

/// `initialize` method name
pub const INITIALIZE: &str = "initialize";
/// `textDocument/definition` method name
pub const DEFINITION: &str = "textDocument/definition";
/// `window/showDocument` method name
pub const SHOW_DOCUMENT: &str = "window/showDocument";
/// `exit` notification name
pub const EXIT: &str = "exit";

/// Output of a successful handler
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutput {
    /// Response `result`
    pub result: Value,
    /// Document the client should open itself
    pub show_document: Option<ShowDocumentParams>,
}

impl HandlerOutput {
    /// Output carrying only a result
    pub fn result(result: Value) -> Self {
        Self {
            result,
            show_document: None,
        }
    }

    /// `null` result
    pub fn null() -> Self {
        Self::result(Value::Null)
    }

    /// Attach a `window/showDocument` request
    pub fn with_show_document(mut self, params: ShowDocumentParams) -> Self {
        self.show_document = Some(params);
        self
    }
}
