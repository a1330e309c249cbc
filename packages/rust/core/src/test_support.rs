//! In-crate stubs for the collaborator traits.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use pageguide_shared::{
    Artefact, ArtefactMetaData, ContentNode, GuidanceError, LiveService, Result, ScopeId,
    ScopeValues, SearchGateway, SearchPayload, SearchResponse,
};

pub(crate) fn artefact(id: &str, scopes: &[&str], linked: &[&str]) -> Artefact {
    let values = |names: &[&str]| ScopeValues {
        values: names.iter().map(|s| ScopeId::new(s).unwrap()).collect(),
    };
    Artefact {
        id: id.to_string(),
        panviva_document_id: Some(format!("doc-{id}")),
        content: vec![ContentNode {
            text: format!("{id} body"),
        }],
        simple_content: Some(format!("{id} body")),
        meta_data: ArtefactMetaData {
            scope: values(scopes),
            linked_scope: (!linked.is_empty()).then(|| values(linked)),
        },
    }
}

pub(crate) fn results_json(results: &[Artefact]) -> String {
    serde_json::to_string(&SearchResponse {
        results: Some(results.to_vec()),
    })
    .unwrap()
}

enum StubReply {
    Body(String),
    Fail(String),
    Hang,
}

#[derive(Default)]
struct GatewayState {
    replies: VecDeque<StubReply>,
    payloads: Vec<SearchPayload>,
}

/// Replays queued replies in order and records every payload it receives.
#[derive(Default)]
pub(crate) struct StubGateway {
    state: Mutex<GatewayState>,
}

impl StubGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn reply(&self, body: impl Into<String>) {
        self.lock().replies.push_back(StubReply::Body(body.into()));
    }

    pub(crate) fn fail(&self, message: impl Into<String>) {
        self.lock()
            .replies
            .push_back(StubReply::Fail(message.into()));
    }

    /// The next call never completes.
    pub(crate) fn hang(&self) {
        self.lock().replies.push_back(StubReply::Hang);
    }

    pub(crate) fn payloads(&self) -> Vec<SearchPayload> {
        self.lock().payloads.clone()
    }
}

#[async_trait]
impl SearchGateway for StubGateway {
    async fn artefact_search(&self, payload: &SearchPayload) -> Result<String> {
        let next = {
            let mut state = self.lock();
            state.payloads.push(payload.clone());
            state.replies.pop_front()
        };
        match next {
            Some(StubReply::Body(body)) => Ok(body),
            Some(StubReply::Fail(message)) => Err(GuidanceError::Gateway(message)),
            Some(StubReply::Hang) => std::future::pending().await,
            None => Err(GuidanceError::Gateway("no stub reply queued".into())),
        }
    }
}

/// One recorded live-service call: `(op, first arg, second arg)`.
pub(crate) type LiveCall = (&'static str, String, String);

#[derive(Default)]
struct LiveState {
    calls: Vec<LiveCall>,
    failing: bool,
    documents: Option<String>,
}

/// Records live calls; fails every call once [`StubLive::failing`] is set.
#[derive(Default)]
pub(crate) struct StubLive {
    state: Mutex<LiveState>,
}

impl StubLive {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        let stub = Self::default();
        stub.state.lock().unwrap().failing = true;
        stub
    }

    pub(crate) fn with_documents(body: impl Into<String>) -> Self {
        let stub = Self::default();
        stub.state.lock().unwrap().documents = Some(body.into());
        stub
    }

    pub(crate) fn calls(&self) -> Vec<LiveCall> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, op: &'static str, a: &str, b: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((op, a.to_string(), b.to_string()));
        if state.failing {
            Err(GuidanceError::Gateway(format!("{op}: stub failure")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LiveService for StubLive {
    async fn live_document(&self, username: &str, document_id: &str) -> Result<()> {
        self.record("liveDocument", username, document_id)
    }

    async fn live_search(&self, username: &str, query: &str) -> Result<()> {
        self.record("liveSearch", username, query)
    }

    async fn live_csh(&self, username: &str, query: &str) -> Result<()> {
        self.record("liveCsh", username, query)
    }

    async fn document_search(&self, term: &str, page_limit: u32) -> Result<String> {
        self.record("documentSearch", term, &page_limit.to_string())?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .documents
            .clone()
            .unwrap_or_else(|| r#"{"results": []}"#.to_string()))
    }
}
