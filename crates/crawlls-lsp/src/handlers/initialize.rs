use serde_json::{json, Value};
use tracing::{debug, info};

use super::HandlerOutput;
use crate::types::LspResult;

/// Server name reported in `serverInfo`
pub const SERVER_NAME: &str = "crawlls";

/// Handle `initialize`: advertise go-to-definition and nothing else
pub async fn handle_initialize(params: Value) -> LspResult<HandlerOutput> {
    if let Some(client) = params.get("clientInfo").and_then(|c| c.get("name")) {
        debug!("Client: {}", client);
    }
    info!("Initializing {} {}", SERVER_NAME, env!("CARGO_PKG_VERSION"));

    Ok(HandlerOutput::result(json!({
        "capabilities": {
            "definitionProvider": true
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_advertises_definition_provider() {
        let output = handle_initialize(json!({ "capabilities": {} })).await.unwrap();
        assert_eq!(output.result["capabilities"]["definitionProvider"], json!(true));
        assert_eq!(output.result["serverInfo"]["name"], json!(SERVER_NAME));
        assert!(output.show_document.is_none());
    }

    #[tokio::test]
    async fn test_initialize_accepts_missing_params() {
        let output = handle_initialize(Value::Null).await.unwrap();
        assert_eq!(output.result["capabilities"]["definitionProvider"], json!(true));
    }
}
