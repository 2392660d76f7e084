//! JSON-RPC message transport over a byte stream
//!
//! This module handles the low-level communication protocol for LSP,
//! including message framing with Content-Length headers and JSON-RPC
//! message parsing and serialization.
//!
//! Frames are read incrementally: the underlying stream may hand over half a
//! header, several frames, or a frame split at any byte, so bytes accumulate
//! in a buffer until a complete frame is available and any surplus is kept
//! for the next read.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::types::{LspError, LspResult};

/// Protocol version carried by every envelope
pub const JSONRPC_VERSION: &str = "2.0";

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const READ_CHUNK: usize = 4096;
/// Header blocks larger than this are treated as garbage
const MAX_HEADER_BYTES: usize = 8 * 1024;
/// Largest payload a frame may announce
pub const MAX_CONTENT_LENGTH: usize = 64 * 1024 * 1024;

/// JSON-RPC request message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID
    pub id: Value,
    /// Method name
    pub method: String,
    /// Request parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC request
    pub fn new(id: Value, method: String, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method,
            params,
        }
    }
}

/// JSON-RPC response message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID
    pub id: Value,
    /// Response result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Response error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Create a successful response; a `null` result is still sent as `"result": null`
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create a new JSON-RPC error
    pub fn new(code: i32, message: String) -> Self {
        Self {
            code,
            message,
            data: None,
        }
    }

    /// Parse error (-32700)
    pub fn parse_error(message: String) -> Self {
        Self::new(-32700, message)
    }

    /// Invalid request (-32600)
    pub fn invalid_request(message: String) -> Self {
        Self::new(-32600, message)
    }

    /// Method not found (-32601)
    pub fn method_not_found(method: String) -> Self {
        Self::new(-32601, format!("Method not found: {}", method))
    }

    /// Invalid params (-32602)
    pub fn invalid_params(message: String) -> Self {
        Self::new(-32602, message)
    }

    /// Internal error (-32603)
    pub fn internal_error(message: String) -> Self {
        Self::new(-32603, message)
    }
}

impl From<&LspError> for JsonRpcError {
    fn from(err: &LspError) -> Self {
        match err {
            LspError::MethodNotFound(method) => JsonRpcError::method_not_found(method.clone()),
            LspError::InvalidParams(msg) => JsonRpcError::invalid_params(msg.clone()),
            LspError::ParseError(msg) => JsonRpcError::parse_error(msg.clone()),
            LspError::InvalidRequest(msg) => JsonRpcError::invalid_request(msg.clone()),
            _ => JsonRpcError::internal_error(err.to_string()),
        }
    }
}

/// JSON-RPC notification message.
///
/// Also used for server-initiated requests that expect no reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Method name
    pub method: String,
    /// Notification parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a new JSON-RPC notification
    pub fn new(method: String, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method,
            params,
        }
    }
}

/// LSP message (can be request, response, or notification)
#[derive(Debug, Clone)]
pub enum LspMessage {
    /// Request message
    Request(JsonRpcRequest),
    /// Response message
    Response(JsonRpcResponse),
    /// Notification message
    Notification(JsonRpcNotification),
}

impl LspMessage {
    /// Parse and validate a message from JSON text
    pub fn from_json(json: &str) -> LspResult<Self> {
        Self::from_slice(json.as_bytes())
    }

    /// Parse and validate a message from a frame payload
    pub fn from_slice(payload: &[u8]) -> LspResult<Self> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| LspError::ParseError(format!("Failed to parse JSON: {}", e)))?;

        match value.get("jsonrpc").and_then(Value::as_str) {
            Some(JSONRPC_VERSION) => {}
            Some(other) => {
                return Err(LspError::InvalidRequest(format!(
                    "Unsupported jsonrpc version: {}",
                    other
                )))
            }
            None => {
                return Err(LspError::InvalidRequest(
                    "Missing jsonrpc version".to_string(),
                ))
            }
        }

        // Check if it's a response (has result or error)
        if value.get("result").is_some() || value.get("error").is_some() {
            let response: JsonRpcResponse = serde_json::from_value(value)
                .map_err(|e| LspError::ParseError(format!("Failed to parse response: {}", e)))?;
            Ok(LspMessage::Response(response))
        }
        // Check if it's a request (has id and method)
        else if value.get("id").is_some() && value.get("method").is_some() {
            let request: JsonRpcRequest = serde_json::from_value(value)
                .map_err(|e| LspError::ParseError(format!("Failed to parse request: {}", e)))?;
            Ok(LspMessage::Request(request))
        }
        // Otherwise it's a notification (has method but no id)
        else if value.get("method").is_some() {
            let notification: JsonRpcNotification = serde_json::from_value(value).map_err(|e| {
                LspError::ParseError(format!("Failed to parse notification: {}", e))
            })?;
            Ok(LspMessage::Notification(notification))
        } else {
            Err(LspError::InvalidRequest(
                "Message must be a request, response, or notification".to_string(),
            ))
        }
    }

    /// Serialize message to JSON
    pub fn to_json(&self) -> LspResult<String> {
        match self {
            LspMessage::Request(req) => serde_json::to_string(req).map_err(|e| {
                LspError::SerializationError(format!("Failed to serialize request: {}", e))
            }),
            LspMessage::Response(resp) => serde_json::to_string(resp).map_err(|e| {
                LspError::SerializationError(format!("Failed to serialize response: {}", e))
            }),
            LspMessage::Notification(notif) => serde_json::to_string(notif).map_err(|e| {
                LspError::SerializationError(format!("Failed to serialize notification: {}", e))
            }),
        }
    }

}

/// Encode a payload as a complete frame
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = format!("Content-Length: {}\r\n\r\n", payload.len()).into_bytes();
    frame.extend_from_slice(payload);
    frame
}

fn find_terminator(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

fn parse_content_length(header: &[u8]) -> LspResult<usize> {
    let header = std::str::from_utf8(header)
        .map_err(|_| LspError::FramingError("Header block is not ASCII".to_string()))?;

    for line in header.split("\r\n") {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("Content-Length") {
                let length = value.trim().parse::<usize>().map_err(|e| {
                    LspError::FramingError(format!("Invalid Content-Length {:?}: {}", value.trim(), e))
                })?;
                if length > MAX_CONTENT_LENGTH {
                    return Err(LspError::FramingError(format!(
                        "Content-Length {} exceeds limit of {} bytes",
                        length, MAX_CONTENT_LENGTH
                    )));
                }
                return Ok(length);
            }
        }
    }

    Err(LspError::FramingError(
        "Missing Content-Length header".to_string(),
    ))
}

/// Reads Content-Length framed payloads from a byte stream
pub struct FrameReader<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wrap a byte stream
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
        }
    }

    /// Bytes received but not yet returned as part of a frame
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Read the next frame payload.
    ///
    /// Returns `Ok(None)` at end of stream. A header block without a usable
    /// Content-Length is discarded and reported as a framing error; the reader
    /// stays usable for the frames that follow.
    pub async fn read_frame(&mut self) -> LspResult<Option<Vec<u8>>> {
        let header_end = loop {
            if let Some(end) = find_terminator(&self.buffer) {
                break end;
            }
            if self.buffer.len() > MAX_HEADER_BYTES {
                self.buffer.clear();
                return Err(LspError::FramingError(format!(
                    "No header terminator within {} bytes",
                    MAX_HEADER_BYTES
                )));
            }
            if self.fill().await? == 0 {
                return Ok(self.end_of_stream());
            }
        };

        let body_start = header_end + HEADER_TERMINATOR.len();
        let content_length = match parse_content_length(&self.buffer[..header_end]) {
            Ok(len) => len,
            Err(e) => {
                self.buffer.drain(..body_start);
                return Err(e);
            }
        };

        let Some(frame_end) = body_start.checked_add(content_length) else {
            self.buffer.drain(..body_start);
            return Err(LspError::FramingError(format!(
                "Content-Length {} overflows frame bounds",
                content_length
            )));
        };

        while self.buffer.len() < frame_end {
            if self.fill().await? == 0 {
                return Ok(self.end_of_stream());
            }
        }

        let frame = self.buffer[body_start..frame_end].to_vec();
        self.buffer.drain(..frame_end);
        debug!("Read frame: {} bytes", content_length);
        Ok(Some(frame))
    }

    async fn fill(&mut self) -> LspResult<usize> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = self
            .reader
            .read(&mut chunk)
            .await
            .map_err(|e| LspError::IoError(format!("Failed to read from stream: {}", e)))?;
        self.buffer.extend_from_slice(&chunk[..n]);
        Ok(n)
    }

    fn end_of_stream(&mut self) -> Option<Vec<u8>> {
        if !self.buffer.is_empty() {
            warn!(
                "Stream ended inside a frame, dropping {} bytes",
                self.buffer.len()
            );
            self.buffer.clear();
        }
        None
    }
}

/// Writes Content-Length framed payloads to a byte stream
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Wrap a byte stream
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write one frame and flush
    pub async fn write_frame(&mut self, payload: &[u8]) -> LspResult<()> {
        self.writer
            .write_all(&encode_frame(payload))
            .await
            .map_err(|e| LspError::IoError(format!("Failed to write message: {}", e)))?;

        self.writer
            .flush()
            .await
            .map_err(|e| LspError::IoError(format!("Failed to flush output: {}", e)))?;

        Ok(())
    }
}

/// Message transport over any async byte stream pair
pub struct MessageTransport<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
}

/// Transport over process stdin/stdout
pub type StdioTransport = MessageTransport<tokio::io::Stdin, tokio::io::Stdout>;

impl StdioTransport {
    /// Create a transport on the process's standard streams
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> MessageTransport<R, W> {
    /// Create a new transport
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: FrameReader::new(reader),
            writer: FrameWriter::new(writer),
        }
    }

    /// Read the next frame payload, `None` at end of stream
    pub async fn read_frame(&mut self) -> LspResult<Option<Vec<u8>>> {
        self.reader.read_frame().await
    }

    /// Write one frame payload
    pub async fn write_frame(&mut self, payload: &[u8]) -> LspResult<()> {
        self.writer.write_frame(payload).await
    }

    /// Read and decode the next message, `None` at end of stream
    pub async fn read_message(&mut self) -> LspResult<Option<LspMessage>> {
        match self.read_frame().await? {
            Some(frame) => LspMessage::from_slice(&frame).map(Some),
            None => Ok(None),
        }
    }

    /// Encode and write a message
    pub async fn write_message(&mut self, message: &LspMessage) -> LspResult<()> {
        let json = message.to_json()?;
        self.write_frame(json.as_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::{
        io,
        pin::Pin,
        task::{Context, Poll},
    };
    use tokio::io::ReadBuf;

    /// Hands out the underlying bytes a few at a time
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl AsyncRead for Trickle {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            let end = (self.pos + self.step)
                .min(self.data.len())
                .min(self.pos + buf.remaining());
            let start = self.pos;
            buf.put_slice(&self.data[start..end]);
            self.pos = end;
            Poll::Ready(Ok(()))
        }
    }

    fn frame(json: &str) -> Vec<u8> {
        encode_frame(json.as_bytes())
    }

    #[test]
    fn test_jsonrpc_request_creation() {
        let req = JsonRpcRequest::new(
            json!(1),
            "initialize".to_string(),
            Some(json!({"processId": 1234})),
        );
        assert_eq!(req.jsonrpc, "2.0");
        assert_eq!(req.method, "initialize");
    }

    #[test]
    fn test_null_result_is_serialized() {
        let resp = JsonRpcResponse::success(json!(7), Value::Null);
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 7, "result": null}));
    }

    #[test]
    fn test_error_response_has_no_result() {
        let resp = JsonRpcResponse::error(json!(1), JsonRpcError::method_not_found("foo".into()));
        let value = serde_json::to_value(&resp).unwrap();
        assert!(value.get("result").is_none());
        assert_eq!(value["error"]["code"], -32601);
        assert_eq!(value["error"]["message"], "Method not found: foo");
    }

    #[test]
    fn test_lsp_message_from_request_json() {
        let json_str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"processId":1234}}"#;
        match LspMessage::from_json(json_str).unwrap() {
            LspMessage::Request(req) => assert_eq!(req.method, "initialize"),
            other => panic!("Expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_lsp_message_from_notification_json() {
        let json_str = r#"{"jsonrpc":"2.0","method":"initialized"}"#;
        match LspMessage::from_json(json_str).unwrap() {
            LspMessage::Notification(notif) => assert_eq!(notif.method, "initialized"),
            other => panic!("Expected notification, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_version_rejected() {
        let err = LspMessage::from_json(r#"{"jsonrpc":"1.0","id":1,"method":"initialize"}"#)
            .unwrap_err();
        assert!(matches!(err, LspError::InvalidRequest(_)));

        let err = LspMessage::from_json(r#"{"id":1,"method":"initialize"}"#).unwrap_err();
        assert!(matches!(err, LspError::InvalidRequest(_)));
    }

    #[test]
    fn test_request_without_method_rejected() {
        let err = LspMessage::from_json(r#"{"jsonrpc":"2.0","id":4}"#).unwrap_err();
        assert!(matches!(err, LspError::InvalidRequest(_)));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = LspMessage::from_json("{not json").unwrap_err();
        assert!(matches!(err, LspError::ParseError(_)));
    }

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(JsonRpcError::from(&LspError::MethodNotFound("x".into())).code, -32601);
        assert_eq!(JsonRpcError::from(&LspError::InvalidParams("x".into())).code, -32602);
        assert_eq!(JsonRpcError::from(&LspError::IoError("x".into())).code, -32603);
        assert_eq!(JsonRpcError::from(&LspError::CacheError("x".into())).code, -32603);
    }

    #[test]
    fn test_parse_content_length_variants() {
        assert_eq!(parse_content_length(b"Content-Length: 42").unwrap(), 42);
        assert_eq!(
            parse_content_length(b"Content-Type: application/vscode-jsonrpc\r\ncontent-length:7").unwrap(),
            7
        );
        assert!(parse_content_length(b"Content-Type: text/plain").is_err());
        assert!(parse_content_length(b"Content-Length: lots").is_err());
    }

    #[tokio::test]
    async fn test_read_single_frame() {
        let data = frame(r#"{"jsonrpc":"2.0","method":"initialized"}"#);
        let mut reader = FrameReader::new(&data[..]);

        let payload = reader.read_frame().await.unwrap().unwrap();
        assert_eq!(payload, br#"{"jsonrpc":"2.0","method":"initialized"}"#.to_vec());
        assert!(reader.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_frames_delivered_byte_by_byte() {
        let mut data = frame(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#);
        data.extend(frame(r#"{"jsonrpc":"2.0","method":"exit"}"#));
        let mut reader = FrameReader::new(Trickle { data, pos: 0, step: 1 });

        let first = reader.read_frame().await.unwrap().unwrap();
        let second = reader.read_frame().await.unwrap().unwrap();
        assert!(first.ends_with(b"\"initialize\"}"));
        assert!(second.ends_with(b"\"exit\"}"));
        assert!(reader.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_surplus_bytes_retained_for_next_frame() {
        let mut data = frame("{\"a\":1}");
        data.extend(frame("{\"b\":2}"));
        let mut reader = FrameReader::new(&data[..]);

        assert_eq!(reader.read_frame().await.unwrap().unwrap(), b"{\"a\":1}".to_vec());
        assert!(reader.buffered() > 0);
        assert_eq!(reader.read_frame().await.unwrap().unwrap(), b"{\"b\":2}".to_vec());
        assert_eq!(reader.buffered(), 0);
    }

    #[tokio::test]
    async fn test_length_counts_bytes_not_characters() {
        let json = r#"{"jsonrpc":"2.0","method":"note","params":{"text":"héllo ✓ 𝄞"}}"#;
        let mut data = frame(json);
        data.extend(frame("{}"));
        let mut reader = FrameReader::new(Trickle { data, pos: 0, step: 5 });

        let payload = reader.read_frame().await.unwrap().unwrap();
        assert_eq!(std::str::from_utf8(&payload).unwrap(), json);
        assert_eq!(reader.read_frame().await.unwrap().unwrap(), b"{}".to_vec());
    }

    #[tokio::test]
    async fn test_missing_content_length_skips_header_block() {
        let mut data = b"Content-Type: text/plain\r\n\r\n".to_vec();
        data.extend(frame("{\"ok\":true}"));
        let mut reader = FrameReader::new(&data[..]);

        let err = reader.read_frame().await.unwrap_err();
        assert!(matches!(err, LspError::FramingError(_)));
        assert_eq!(
            reader.read_frame().await.unwrap().unwrap(),
            b"{\"ok\":true}".to_vec()
        );
    }

    #[tokio::test]
    async fn test_truncated_frame_is_end_of_stream() {
        let data = b"Content-Length: 100\r\n\r\n{\"partial\":".to_vec();
        let mut reader = FrameReader::new(&data[..]);
        assert!(reader.read_frame().await.unwrap().is_none());
        assert_eq!(reader.buffered(), 0);
    }

    #[tokio::test]
    async fn test_oversized_content_length_is_rejected() {
        for length in [u64::MAX.to_string(), (MAX_CONTENT_LENGTH + 1).to_string()] {
            let mut data = format!("Content-Length: {}\r\n\r\n", length).into_bytes();
            data.extend(frame("{\"ok\":true}"));
            let mut reader = FrameReader::new(&data[..]);

            let err = reader.read_frame().await.unwrap_err();
            assert!(matches!(err, LspError::FramingError(_)), "{}", length);
            assert_eq!(
                reader.read_frame().await.unwrap().unwrap(),
                b"{\"ok\":true}".to_vec()
            );
        }
    }

    #[test]
    fn test_content_length_limit_is_inclusive() {
        let header = format!("Content-Length: {}", MAX_CONTENT_LENGTH);
        assert_eq!(parse_content_length(header.as_bytes()).unwrap(), MAX_CONTENT_LENGTH);
    }

    #[tokio::test]
    async fn test_oversized_header_is_rejected() {
        let data = vec![b'x'; MAX_HEADER_BYTES + READ_CHUNK];
        let mut reader = FrameReader::new(&data[..]);
        assert!(matches!(
            reader.read_frame().await,
            Err(LspError::FramingError(_))
        ));
    }

    #[tokio::test]
    async fn test_write_frame_format() {
        let mut out = Vec::new();
        FrameWriter::new(&mut out)
            .write_frame("{\"x\":\"é\"}".as_bytes())
            .await
            .unwrap();
        assert_eq!(out, b"Content-Length: 10\r\n\r\n{\"x\":\"\xc3\xa9\"}".to_vec());
    }

    #[tokio::test]
    async fn test_message_round_trip_through_frames() {
        let original = LspMessage::Request(JsonRpcRequest::new(
            json!("req-9"),
            "textDocument/definition".to_string(),
            Some(json!({"position": {"line": 2, "character": 5}})),
        ));

        let mut wire = Vec::new();
        {
            let mut transport = MessageTransport::new(tokio::io::empty(), &mut wire);
            transport.write_message(&original).await.unwrap();
        }

        let mut transport = MessageTransport::new(&wire[..], tokio::io::sink());
        match transport.read_message().await.unwrap().unwrap() {
            LspMessage::Request(req) => {
                assert_eq!(req.method, "textDocument/definition");
                assert_eq!(req.id, json!("req-9"));
                assert_eq!(req.params, Some(json!({"position": {"line": 2, "character": 5}})));
            }
            other => panic!("Expected request, got {:?}", other),
        }
    }
}
