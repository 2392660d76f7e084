//! LSP Server implementation
//!
//! This module implements request routing and the read-dispatch-write loop.
//! Requests are handled one at a time: each is fully resolved and answered
//! before the next frame is read.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use crate::{
    context::LspContext,
    handlers::{
        handle_definition, handle_initialize, HandlerOutput, DEFINITION, EXIT, INITIALIZE,
        SHOW_DOCUMENT,
    },
    transport::{
        JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, LspMessage,
        MessageTransport, StdioTransport,
    },
    types::{LspError, LspResult, ServerState, ShowDocumentParams},
};

/// Frames to write for one inbound request, in order
#[derive(Debug, Clone)]
pub struct Dispatched {
    /// Server-initiated request without an `id`, written before the response
    pub server_request: Option<JsonRpcNotification>,
    /// Response to the client's request
    pub response: JsonRpcResponse,
}

/// Routes decoded messages to handlers
pub struct Dispatcher {
    context: Arc<LspContext>,
}

impl Dispatcher {
    /// Create a dispatcher over a shared context
    pub fn new(context: Arc<LspContext>) -> Self {
        Self { context }
    }

    /// Handle one message; `None` when nothing should be written back
    pub async fn dispatch(&self, message: LspMessage) -> Option<Dispatched> {
        match message {
            LspMessage::Request(request) => Some(self.dispatch_request(request).await),
            LspMessage::Notification(notification) => {
                debug!("Ignoring notification: {}", notification.method);
                None
            }
            LspMessage::Response(response) => {
                debug!("Ignoring client response: id={}", response.id);
                None
            }
        }
    }

    async fn dispatch_request(&self, request: JsonRpcRequest) -> Dispatched {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;
        debug!("Request: id={}, method={}", id, method);

        match self.run_handler(method.clone(), params).await {
            Ok(output) => Dispatched {
                server_request: output
                    .show_document
                    .map(show_document_request),
                response: JsonRpcResponse::success(id, output.result),
            },
            Err(err) => {
                // Routing misses keep their own code; anything a handler raised is internal
                let error = match &err {
                    LspError::MethodNotFound(_) => {
                        debug!("Method not found: {}", method);
                        JsonRpcError::from(&err)
                    }
                    _ => {
                        warn!("Request {} ({}) failed: {}", id, method, err);
                        JsonRpcError::internal_error(err.to_string())
                    }
                };
                Dispatched {
                    server_request: None,
                    response: JsonRpcResponse::error(id, error),
                }
            }
        }
    }

    /// Run the handler on its own task so a panic becomes an internal error
    async fn run_handler(&self, method: String, params: Option<Value>) -> LspResult<HandlerOutput> {
        let context = Arc::clone(&self.context);
        let params = params.unwrap_or(Value::Null);

        let task = tokio::spawn(async move {
            match method.as_str() {
                INITIALIZE => handle_initialize(params).await,
                DEFINITION => handle_definition(&context, params).await,
                _ => Err(LspError::MethodNotFound(method)),
            }
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!("Handler task failed: {}", e);
                Err(LspError::InternalError(format!("Handler failed: {}", e)))
            }
        }
    }
}

/// Fire-and-forget `window/showDocument`; the client's reply is not awaited
fn show_document_request(params: ShowDocumentParams) -> JsonRpcNotification {
    JsonRpcNotification::new(
        SHOW_DOCUMENT.to_string(),
        Some(json!({ "uri": params.uri, "external": params.external })),
    )
}

/// LSP Server
pub struct LspServer<R, W> {
    transport: MessageTransport<R, W>,
    dispatcher: Dispatcher,
    context: Arc<LspContext>,
    state: ServerState,
}

impl LspServer<tokio::io::Stdin, tokio::io::Stdout> {
    /// Create a server on the process's standard streams
    pub fn stdio(context: Arc<LspContext>) -> Self {
        Self::with_transport(context, StdioTransport::stdio())
    }
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> LspServer<R, W> {
    /// Create a server over any reader/writer pair
    pub fn new(context: Arc<LspContext>, reader: R, writer: W) -> Self {
        Self::with_transport(context, MessageTransport::new(reader, writer))
    }

    fn with_transport(context: Arc<LspContext>, transport: MessageTransport<R, W>) -> Self {
        Self {
            transport,
            dispatcher: Dispatcher::new(Arc::clone(&context)),
            context,
            state: ServerState::Running,
        }
    }

    /// Get the current server state
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Run until the input ends or the client sends `exit`
    pub async fn run(&mut self) -> LspResult<()> {
        info!(
            "LSP server started, cache at {}",
            self.context.cache().root().display()
        );

        while self.state == ServerState::Running {
            let frame = match self.transport.read_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("Input stream closed, shutting down");
                    self.state = ServerState::Disconnected;
                    break;
                }
                Err(LspError::FramingError(msg)) => {
                    warn!("Discarding malformed frame: {}", msg);
                    tokio::time::sleep(self.context.server_config().framing_error_backoff).await;
                    continue;
                }
                Err(e) => {
                    error!("Failed to read from client: {}", e);
                    self.state = ServerState::Disconnected;
                    return Err(e);
                }
            };

            let message = match LspMessage::from_slice(&frame) {
                Ok(message) => message,
                Err(e) => {
                    warn!("Dropping invalid message: {}", e);
                    continue;
                }
            };

            if matches!(&message, LspMessage::Notification(n) if n.method == EXIT) {
                info!("Exit notification received");
                self.state = ServerState::ExitRequested;
                break;
            }

            if let Some(dispatched) = self.dispatcher.dispatch(message).await {
                self.send(dispatched).await?;
            }
        }

        Ok(())
    }

    async fn send(&mut self, dispatched: Dispatched) -> LspResult<()> {
        if let Some(request) = dispatched.server_request {
            self.transport
                .write_message(&LspMessage::Notification(request))
                .await?;
        }
        self.transport
            .write_message(&LspMessage::Response(dispatched.response))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_support::{context, long_page, MockHttp},
        transport::{encode_frame, FrameReader},
    };
    use tempfile::TempDir;

    fn dispatcher(dir: &TempDir) -> Dispatcher {
        Dispatcher::new(Arc::new(context(dir.path(), MockHttp::serving(long_page()))))
    }

    fn request(id: i64, method: &str, params: Value) -> LspMessage {
        LspMessage::Request(JsonRpcRequest::new(json!(id), method.to_string(), Some(params)))
    }

    #[tokio::test]
    async fn test_dispatch_initialize() {
        let dir = TempDir::new().unwrap();
        let out = dispatcher(&dir)
            .dispatch(request(1, INITIALIZE, json!({})))
            .await
            .unwrap();

        assert!(out.server_request.is_none());
        assert_eq!(out.response.id, json!(1));
        assert_eq!(
            out.response.result.unwrap()["capabilities"]["definitionProvider"],
            json!(true)
        );
    }

    #[tokio::test]
    async fn test_unknown_method_with_id_is_method_not_found() {
        let dir = TempDir::new().unwrap();
        let out = dispatcher(&dir)
            .dispatch(request(7, "textDocument/hover", json!({})))
            .await
            .unwrap();

        let error = out.response.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "Method not found: textDocument/hover");
        assert!(out.response.result.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_is_not_routed() {
        let dir = TempDir::new().unwrap();
        let out = dispatcher(&dir)
            .dispatch(request(2, "shutdown", Value::Null))
            .await
            .unwrap();
        assert_eq!(out.response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_notifications_and_responses_are_ignored() {
        let dir = TempDir::new().unwrap();
        let dispatcher = dispatcher(&dir);

        let notification = LspMessage::from_json(
            r#"{"jsonrpc":"2.0","method":"textDocument/didOpen","params":{}}"#,
        )
        .unwrap();
        assert!(dispatcher.dispatch(notification).await.is_none());

        let response =
            LspMessage::from_json(r#"{"jsonrpc":"2.0","id":"crawlls-1","result":null}"#).unwrap();
        assert!(dispatcher.dispatch(response).await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_definition_params_map_to_internal_error() {
        let dir = TempDir::new().unwrap();
        let dispatcher = dispatcher(&dir);

        let out = dispatcher
            .dispatch(request(3, DEFINITION, json!({ "textDocument": {} })))
            .await
            .unwrap();
        let error = out.response.error.unwrap();
        assert_eq!(error.code, -32603);
        assert!(error.message.contains("Invalid definition params"));

        let remote = json!({
            "textDocument": { "uri": "https://example.com/notes.md" },
            "position": { "line": 0, "character": 0 }
        });
        let out = dispatcher
            .dispatch(request(4, DEFINITION, remote))
            .await
            .unwrap();
        assert_eq!(out.response.error.unwrap().code, -32603);
    }

    #[tokio::test]
    async fn test_handler_failure_maps_to_internal_error() {
        let dir = TempDir::new().unwrap();
        let params = json!({
            "textDocument": { "uri": "file:///nonexistent/crawlls/doc.md" },
            "position": { "line": 0, "character": 0 }
        });
        let out = dispatcher(&dir)
            .dispatch(request(4, DEFINITION, params))
            .await
            .unwrap();
        assert_eq!(out.response.error.unwrap().code, -32603);
    }

    #[tokio::test]
    async fn test_run_answers_then_stops_at_eof() {
        let dir = TempDir::new().unwrap();
        let ctx = Arc::new(context(dir.path(), MockHttp::serving(long_page())));

        let mut input = Vec::new();
        input.extend(encode_frame(br#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#));
        input.extend(b"Content-Type: text/plain\r\n\r\n");
        input.extend(encode_frame(br#"{"jsonrpc":"1.0","id":2,"method":"initialize"}"#));
        input.extend(encode_frame(br#"{"jsonrpc":"2.0","method":"initialized","params":{}}"#));
        input.extend(encode_frame(br#"{"jsonrpc":"2.0","id":3,"method":"unknown/method"}"#));

        let mut output = Vec::new();
        let mut server = LspServer::new(ctx, input.as_slice(), &mut output);
        server.run().await.unwrap();
        assert_eq!(server.state(), ServerState::Disconnected);
        drop(server);

        let mut reader = FrameReader::new(output.as_slice());
        let first: Value = serde_json::from_slice(&reader.read_frame().await.unwrap().unwrap()).unwrap();
        assert_eq!(first["id"], json!(1));
        assert_eq!(first["result"]["capabilities"]["definitionProvider"], json!(true));

        let second: Value = serde_json::from_slice(&reader.read_frame().await.unwrap().unwrap()).unwrap();
        assert_eq!(second["id"], json!(3));
        assert_eq!(second["error"]["code"], json!(-32601));

        assert!(reader.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_run_stops_on_exit() {
        let dir = TempDir::new().unwrap();
        let ctx = Arc::new(context(dir.path(), MockHttp::serving(long_page())));

        let mut input = Vec::new();
        input.extend(encode_frame(br#"{"jsonrpc":"2.0","method":"exit"}"#));
        input.extend(encode_frame(br#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#));

        let mut output = Vec::new();
        let mut server = LspServer::new(ctx, input.as_slice(), &mut output);
        server.run().await.unwrap();
        assert_eq!(server.state(), ServerState::ExitRequested);
        drop(server);

        assert!(output.is_empty());
    }
}
