//! Live-assist side channels.
//!
//! Each operation makes at most one call and publishes exactly one
//! notification. None of them touch the guidance resolution state.

use std::sync::Arc;

use pageguide_shared::{
    Artefact, DocumentHit, DocumentSearchResponse, GuidanceOptions, LiveService, Notification,
    ScopeId, SearchGateway, SearchResponse,
};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::context::{ContextResolver, PageContext};
use crate::messages;
use crate::notify::{Notifier, publish};
use crate::query::QueryBuilder;

/// A document search hit plus its position in the result list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyedDocument {
    pub key: usize,
    #[serde(flatten)]
    pub hit: DocumentHit,
}

/// Top quick answer plus how many results the search returned.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickAnswer {
    pub artefact: Artefact,
    pub total: usize,
}

pub struct LiveAssist {
    live: Arc<dyn LiveService>,
    gateway: Arc<dyn SearchGateway>,
    notifier: Arc<dyn Notifier>,
    help_context: ContextResolver,
    queries: QueryBuilder,
    page_limit: u32,
}

impl LiveAssist {
    pub fn new(
        live: Arc<dyn LiveService>,
        gateway: Arc<dyn SearchGateway>,
        notifier: Arc<dyn Notifier>,
        options: &GuidanceOptions,
    ) -> Self {
        Self {
            live,
            gateway,
            notifier,
            help_context: ContextResolver::new(
                &options.help_scope_prefix,
                &options.location_marker,
            ),
            queries: QueryBuilder::new(&options.initial_query),
            page_limit: options.document_page_limit,
        }
    }

    fn notify(&self, notification: Notification) {
        publish(self.notifier.as_ref(), notification);
    }

    /// `None` (and a warning) when there is no user to act for.
    fn require_user<'a>(&self, username: Option<&'a str>) -> Option<&'a str> {
        let user = username.filter(|u| !u.is_empty());
        if user.is_none() {
            self.notify(Notification::warning(messages::NO_USERNAME));
        }
        user
    }

    /// Open `document_id` in the user's Panviva window.
    #[instrument(skip_all, fields(document_id = %document_id))]
    pub async fn open_document(&self, username: Option<&str>, document_id: &str) -> bool {
        let Some(user) = self.require_user(username) else {
            return false;
        };
        match self.live.live_document(user, document_id).await {
            Ok(()) => {
                self.notify(Notification::info(messages::document_sent(document_id, user)));
                true
            }
            Err(e) => {
                warn!(error = %e, "live document failed");
                self.notify(Notification::warning(messages::LIVE_FAILURE));
                false
            }
        }
    }

    /// "Zoom" from a displayed artefact to its backing document.
    pub async fn zoom(&self, username: Option<&str>, document_id: Option<&str>) -> bool {
        match document_id.filter(|id| !id.is_empty()) {
            Some(id) => self.open_document(username, id).await,
            None => {
                self.notify(Notification::warning(messages::NO_RELATED_DOCUMENT));
                false
            }
        }
    }

    /// Run `query` in the user's Panviva window.
    #[instrument(skip_all, fields(query = %query))]
    pub async fn live_search(&self, username: Option<&str>, query: &str) -> bool {
        let Some(user) = self.require_user(username) else {
            return false;
        };
        match self.live.live_search(user, query).await {
            Ok(()) => {
                self.notify(Notification::info(messages::live_search_started(query, user)));
                true
            }
            Err(e) => {
                warn!(error = %e, "live search failed");
                self.notify(Notification::warning(messages::GATEWAY_FAILURE));
                false
            }
        }
    }

    /// Context-sensitive help for the page the user is on.
    #[instrument(skip_all)]
    pub async fn help_me(&self, username: Option<&str>, context: &PageContext) -> bool {
        let Some(scope) = self.help_context.resolve(context) else {
            self.notify(Notification::warning(messages::NO_HELP_CONTEXT));
            return false;
        };
        let Some(user) = self.require_user(username) else {
            return false;
        };
        debug!(scope = %scope.scope, "live csh");
        match self.live.live_csh(user, scope.scope.as_str()).await {
            Ok(()) => {
                self.notify(Notification::info(messages::live_search_started(
                    scope.scope.as_str(),
                    user,
                )));
                true
            }
            Err(e) => {
                warn!(error = %e, "live csh failed");
                self.notify(Notification::warning(messages::GATEWAY_FAILURE));
                false
            }
        }
    }

    /// Search documents; `page_limit` defaults to the configured limit.
    #[instrument(skip_all, fields(term = %term))]
    pub async fn document_search(&self, term: &str, page_limit: Option<u32>) -> Vec<KeyedDocument> {
        let limit = page_limit.unwrap_or(self.page_limit);
        let parsed = self
            .live
            .document_search(term, limit)
            .await
            .and_then(|body| DocumentSearchResponse::from_json(&body));

        let hits = match parsed {
            Ok(response) => response.into_results(),
            Err(e) => {
                warn!(error = %e, "document search failed");
                self.notify(Notification::warning(messages::GATEWAY_FAILURE));
                return Vec::new();
            }
        };

        if hits.is_empty() {
            self.notify(Notification::warning(messages::documents_not_found(term)));
            return Vec::new();
        }

        self.notify(Notification::info(messages::documents_found(hits.len(), term)));
        hits.into_iter()
            .enumerate()
            .map(|(key, hit)| KeyedDocument { key, hit })
            .collect()
    }

    /// Single-stage lookup: the top artefact for `scope`, no linkage.
    #[instrument(skip_all, fields(scope = scope.map(ScopeId::as_str)))]
    pub async fn quick_answer(&self, scope: Option<&ScopeId>) -> Option<QuickAnswer> {
        let query = self.queries.build(scope);
        let parsed = self
            .gateway
            .artefact_search(&query.payload)
            .await
            .and_then(|body| SearchResponse::from_json(&body));

        let results = match parsed {
            Ok(response) => response.into_results(),
            Err(e) => {
                warn!(error = %e, "quick answer search failed");
                self.notify(Notification::warning(messages::GATEWAY_FAILURE));
                return None;
            }
        };

        let total = results.len();
        match results.into_iter().next() {
            Some(artefact) => {
                self.notify(Notification::info(messages::quick_answer_found(total)));
                Some(QuickAnswer { artefact, total })
            }
            None => {
                self.notify(Notification::warning(query.fallback_message));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::test_support::{StubGateway, StubLive, artefact, results_json};
    use pageguide_shared::Severity;

    struct Fixture {
        live: Arc<StubLive>,
        gateway: Arc<StubGateway>,
        notifier: Arc<RecordingNotifier>,
        assist: LiveAssist,
    }

    fn fixture(live: StubLive) -> Fixture {
        let live = Arc::new(live);
        let gateway = Arc::new(StubGateway::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let assist = LiveAssist::new(
            live.clone(),
            gateway.clone(),
            notifier.clone(),
            &GuidanceOptions::default(),
        );
        Fixture {
            live,
            gateway,
            notifier,
            assist,
        }
    }

    fn last(f: &Fixture) -> Notification {
        f.notifier.last().expect("a notification")
    }

    #[tokio::test]
    async fn open_document_reports_success() {
        let f = fixture(StubLive::new());
        assert!(f.assist.open_document(Some("jo"), "1201").await);
        assert_eq!(
            f.live.calls(),
            [("liveDocument", "jo".to_string(), "1201".to_string())]
        );
        assert_eq!(
            last(&f).message,
            "Sent related panviva document #1201 to user \"jo\"."
        );
    }

    #[tokio::test]
    async fn open_document_failure_is_generic() {
        let f = fixture(StubLive::failing());
        assert!(!f.assist.open_document(Some("jo"), "1201").await);
        let note = last(&f);
        assert_eq!(note.severity, Severity::Warning);
        assert_eq!(note.message, messages::LIVE_FAILURE);
    }

    #[tokio::test]
    async fn missing_username_skips_the_call() {
        let f = fixture(StubLive::new());
        assert!(!f.assist.open_document(None, "1201").await);
        assert!(!f.assist.live_search(Some(""), "refund").await);
        assert!(f.live.calls().is_empty());
        assert_eq!(last(&f).message, messages::NO_USERNAME);
    }

    #[tokio::test]
    async fn zoom_without_document_warns() {
        let f = fixture(StubLive::new());
        assert!(!f.assist.zoom(Some("jo"), None).await);
        assert!(f.live.calls().is_empty());
        assert_eq!(last(&f).message, messages::NO_RELATED_DOCUMENT);

        assert!(f.assist.zoom(Some("jo"), Some("doc-ov")).await);
        assert_eq!(f.live.calls()[0].2, "doc-ov");
    }

    #[tokio::test]
    async fn live_search_announces_query() {
        let f = fixture(StubLive::new());
        assert!(f.assist.live_search(Some("jo"), "refund").await);
        assert_eq!(
            last(&f).message,
            "Searching \"refund\" within panviva for user \"jo\"."
        );
    }

    #[tokio::test]
    async fn help_me_uses_help_prefix() {
        let f = fixture(StubLive::new());
        let ctx = PageContext::default().with_page_name("LogACall");
        assert!(f.assist.help_me(Some("jo"), &ctx).await);
        assert_eq!(
            f.live.calls(),
            [("liveCsh", "jo".to_string(), "sf-page-guidance-logacall".to_string())]
        );
    }

    #[tokio::test]
    async fn help_me_without_context_does_not_call() {
        let f = fixture(StubLive::new());
        assert!(!f.assist.help_me(Some("jo"), &PageContext::default()).await);
        assert!(f.live.calls().is_empty());
        assert_eq!(last(&f).severity, Severity::Warning);
        assert_eq!(last(&f).message, messages::NO_HELP_CONTEXT);
    }

    #[tokio::test]
    async fn document_search_keys_hits_by_position() {
        let f = fixture(StubLive::with_documents(
            r#"{"results": [{"id": 7, "name": "Refunds"}, {"id": "8", "name": "Returns", "score": 1.5}]}"#,
        ));
        let docs = f.assist.document_search("refund", None).await;

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].key, 0);
        assert_eq!(docs[0].hit.id.as_deref(), Some("7"));
        assert_eq!(docs[1].key, 1);
        assert!(docs[1].hit.extra.contains_key("score"));
        // Configured page limit is passed as the second argument.
        assert_eq!(f.live.calls()[0].2, "5");
        assert!(last(&f).message.starts_with("Found 2 search results for \"refund\""));
    }

    #[tokio::test]
    async fn document_search_empty_and_failure() {
        let f = fixture(StubLive::new());
        assert!(f.assist.document_search("nothing", Some(3)).await.is_empty());
        assert!(last(&f).message.contains("couldn't find anything"));
        assert_eq!(f.live.calls()[0].2, "3");

        let f = fixture(StubLive::failing());
        assert!(f.assist.document_search("refund", None).await.is_empty());
        assert_eq!(last(&f).message, messages::GATEWAY_FAILURE);
    }

    #[tokio::test]
    async fn quick_answer_takes_top_result() {
        let f = fixture(StubLive::new());
        f.gateway
            .reply(results_json(&[artefact("first", &["s"], &[]), artefact("second", &["s"], &[])]));
        let scope = ScopeId::new("s").unwrap();

        let answer = f.assist.quick_answer(Some(&scope)).await.expect("answer");
        assert_eq!(answer.artefact.id, "first");
        assert_eq!(answer.total, 2);
        assert_eq!(
            last(&f).message,
            "Found 2 results. Showing you the top result."
        );
        assert!(f.gateway.payloads()[0].filter.is_some());
    }

    #[tokio::test]
    async fn quick_answer_empty_uses_fallback() {
        let f = fixture(StubLive::new());
        f.gateway.reply(r#"{"results": null}"#);
        assert!(f.assist.quick_answer(None).await.is_none());
        let note = last(&f);
        assert_eq!(note.severity, Severity::Warning);
        assert!(note.message.contains("\"*\""));
    }

    #[tokio::test]
    async fn quick_answer_parses_fixture() {
        let f = fixture(StubLive::new());
        let body = std::fs::read_to_string("../../../fixtures/json/artefact-search.fixture.json")
            .expect("fixture");
        f.gateway.reply(body);

        let answer = f.assist.quick_answer(None).await.expect("answer");
        assert_eq!(answer.artefact.id, "qa-case-overview");
        assert_eq!(answer.total, 3);
    }
}
