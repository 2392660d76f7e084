use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::HandlerOutput;
use crate::{
    context::LspContext,
    document::{link_at, path_to_file_uri},
    fetcher::{ExternalReason, FetchOutcome},
    types::{DefinitionParams, Location, LspError, LspResult, Range, ShowDocumentParams},
};

/// Handle `textDocument/definition`.
///
/// Resolves the link under the cursor to its cached Markdown snapshot. When the
/// link cannot be shown locally the result is `null` and the client is asked to
/// open the URL externally.
pub async fn handle_definition(context: &LspContext, params: Value) -> LspResult<HandlerOutput> {
    let params: DefinitionParams = serde_json::from_value(params)
        .map_err(|e| LspError::InvalidParams(format!("Invalid definition params: {}", e)))?;

    let Some(link) = link_at(&params.text_document.uri, params.position).await? else {
        debug!(
            "No link at {}:{}:{}",
            params.text_document.uri, params.position.line, params.position.character
        );
        return Ok(HandlerOutput::null());
    };
    debug!("Resolving link {}", link.url);

    match context.pipeline().resolve(&link.url).await? {
        FetchOutcome::Cached(path) | FetchOutcome::Fetched(path) => {
            let location = Location {
                uri: path_to_file_uri(&path)?,
                range: Range::document_start(),
            };
            let result = serde_json::to_value(location).map_err(|e| {
                LspError::SerializationError(format!("Failed to serialize location: {}", e))
            })?;
            Ok(HandlerOutput::result(result))
        }
        // Relative paths and anchors have nothing an external handler could open
        FetchOutcome::External(ExternalReason::Unfetchable) if Url::parse(&link.url).is_err() => {
            debug!("Ignoring relative link {}", link.url);
            Ok(HandlerOutput::null())
        }
        FetchOutcome::External(reason) => {
            info!("Opening {} externally ({:?})", link.url, reason);
            Ok(HandlerOutput::null().with_show_document(ShowDocumentParams {
                uri: link.url,
                external: true,
            }))
        }
    }
}
