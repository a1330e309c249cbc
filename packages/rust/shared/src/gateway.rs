//! Collaborator traits for the remote Panviva service.
//!
//! The guidance core only ever talks to these traits; the concrete
//! implementation (the SDK bridge) lives in `pageguide-bridge`.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::SearchPayload;

/// Artefact search against the knowledge base.
#[async_trait]
pub trait SearchGateway: Send + Sync {
    /// Run an artefact search and return the raw JSON response body.
    ///
    /// Used both for the scoped overview search and for the batched
    /// linked-scope search; the payload decides which.
    async fn artefact_search(&self, payload: &SearchPayload) -> Result<String>;
}

/// Calls that act on the user's live Panviva window, plus document search.
#[async_trait]
pub trait LiveService: Send + Sync {
    /// Open a document in the user's Panviva window.
    async fn live_document(&self, username: &str, document_id: &str) -> Result<()>;

    /// Run a search inside the user's Panviva window.
    async fn live_search(&self, username: &str, query: &str) -> Result<()>;

    /// Raise context-sensitive help for a scope in the user's Panviva window.
    async fn live_csh(&self, username: &str, query: &str) -> Result<()>;

    /// Search documents and return the raw JSON response body.
    async fn document_search(&self, term: &str, page_limit: u32) -> Result<String>;
}
