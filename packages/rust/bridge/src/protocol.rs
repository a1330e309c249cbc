//! JSON-lines message types exchanged with the bridge program.
//!
//! Every request is one line on the bridge's stdin; every response is one
//! line on its stdout. Operation names and argument names follow the
//! Panviva SDK methods the bridge wraps.

use pageguide_shared::SearchPayload;
use serde::{Deserialize, Serialize};

/// Request message sent to the bridge.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum RequestMessage<'a> {
    Call { id: String, call: BridgeCall<'a> },
    Shutdown,
}

/// A single SDK operation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub(crate) enum BridgeCall<'a> {
    ArtefactSearch {
        payload: &'a SearchPayload,
    },
    DocumentSearch {
        term: &'a str,
        /// The SDK takes the page size as a string.
        #[serde(rename = "pageLimit")]
        page_limit: String,
    },
    LiveDocument {
        username: &'a str,
        #[serde(rename = "documentId")]
        document_id: &'a str,
    },
    LiveSearch {
        username: &'a str,
        query: &'a str,
    },
    LiveCsh {
        username: &'a str,
        query: &'a str,
    },
}

impl BridgeCall<'_> {
    /// Operation name for tracing.
    pub(crate) fn op(&self) -> &'static str {
        match self {
            Self::ArtefactSearch { .. } => "artefactSearch",
            Self::DocumentSearch { .. } => "documentSearch",
            Self::LiveDocument { .. } => "liveDocument",
            Self::LiveSearch { .. } => "liveSearch",
            Self::LiveCsh { .. } => "liveCsh",
        }
    }
}

/// Response message received from the bridge.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ResponseMessage {
    Ready,
    Result {
        id: String,
        /// Either the SDK's JSON text or an already-decoded JSON value.
        #[serde(default)]
        body: Option<serde_json::Value>,
    },
    Error {
        id: String,
        error: String,
    },
}

/// Normalize a response body to JSON text.
pub(crate) fn body_text(body: serde_json::Value) -> String {
    match body {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    }
}
