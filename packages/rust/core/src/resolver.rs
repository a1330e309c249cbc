//! Two-stage guidance resolution.
//!
//! 1. Overview search for the current scope; the first result is the
//!    candidate overview.
//! 2. One batched search for every scope the overview links to.
//! 3. Order-preserving join of the results back onto the declared links.
//!
//! Each step is a pure function of the previous state and the call outcome
//! ([`on_overview_response`], [`on_linked_response`]); [`GuidanceResolver`]
//! only sequences the two gateway calls and reports the terminal state.

use std::sync::Arc;

use pageguide_shared::{
    Artefact, GuidanceOptions, Notification, Result, ScopeId, SearchGateway, SearchResponse,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::context::{ContextResolver, PageContext, ScopeMatch};
use crate::messages;
use crate::navigation::{LinkedArtefacts, NavigationState};
use crate::notify::{Notifier, publish};
use crate::query::QueryBuilder;

// ---------------------------------------------------------------------------
// States and outcomes
// ---------------------------------------------------------------------------

/// Where a resolution is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
    Idle,
    ResolvingOverview,
    ResolvingLinked,
    Ready,
    FailedOverview,
    FailedNoOverviewArtefact,
    FailedNoLinkedArtefacts,
    FailedLinkedSearch,
}

impl ResolutionState {
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::FailedOverview
                | Self::FailedNoOverviewArtefact
                | Self::FailedNoLinkedArtefacts
                | Self::FailedLinkedSearch
        )
    }
}

/// Why a resolution stopped short of `Ready`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuidanceIssue {
    /// Transport/service error, or an unparseable body.
    GatewayFailure { detail: String },
    /// The overview search succeeded with zero results.
    EmptyResult,
    /// The top result carries no linked scopes.
    MissingLinkage { candidate_id: String },
    /// The linked search produced no artefact for any linked scope.
    NoLinkedMatches,
}

/// Result of applying the overview call's outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum OverviewStep {
    Failed {
        state: ResolutionState,
        issue: GuidanceIssue,
    },
    Found(Artefact),
}

/// Result of applying the linked call's outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkedStep {
    Failed {
        state: ResolutionState,
        issue: GuidanceIssue,
    },
    Joined(LinkedArtefacts),
}

/// `ResolvingOverview` + outcome.
pub fn on_overview_response(outcome: Result<String>) -> OverviewStep {
    let results = match outcome.and_then(|body| SearchResponse::from_json(&body)) {
        Ok(response) => response.into_results(),
        Err(e) => {
            return OverviewStep::Failed {
                state: ResolutionState::FailedOverview,
                issue: GuidanceIssue::GatewayFailure {
                    detail: e.to_string(),
                },
            };
        }
    };

    let Some(candidate) = results.into_iter().next() else {
        return OverviewStep::Failed {
            state: ResolutionState::FailedOverview,
            issue: GuidanceIssue::EmptyResult,
        };
    };

    if candidate.linked_scopes().is_empty() {
        return OverviewStep::Failed {
            state: ResolutionState::FailedNoOverviewArtefact,
            issue: GuidanceIssue::MissingLinkage {
                candidate_id: candidate.id,
            },
        };
    }

    OverviewStep::Found(candidate)
}

/// `ResolvingLinked` + outcome, for the committed `overview`.
pub fn on_linked_response(overview: &Artefact, outcome: Result<String>) -> LinkedStep {
    let results = match outcome.and_then(|body| SearchResponse::from_json(&body)) {
        Ok(response) => response.into_results(),
        Err(e) => {
            return LinkedStep::Failed {
                state: ResolutionState::FailedLinkedSearch,
                issue: GuidanceIssue::GatewayFailure {
                    detail: e.to_string(),
                },
            };
        }
    };

    let linked = join_linked(overview.linked_scopes(), results);
    if linked.iter().all(Option::is_none) {
        return LinkedStep::Failed {
            state: ResolutionState::FailedNoLinkedArtefacts,
            issue: GuidanceIssue::NoLinkedMatches,
        };
    }

    LinkedStep::Joined(linked)
}

/// For each declared scope, in order, the first result carrying it.
///
/// The output always has one slot per declared scope; response order is
/// irrelevant. One result may fill several slots if it carries several of
/// the declared scopes.
pub fn join_linked(declared: &[ScopeId], results: Vec<Artefact>) -> LinkedArtefacts {
    let results: Vec<Arc<Artefact>> = results.into_iter().map(Arc::new).collect();
    declared
        .iter()
        .map(|scope| {
            results
                .iter()
                .find(|artefact| artefact.has_scope(scope))
                .cloned()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Immutable view of a resolution, for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuidanceSnapshot {
    pub state: ResolutionState,
    /// Scope the resolution searched with, if one was derived.
    pub scope: Option<ScopeMatch>,
    /// Committed overview; survives failures of the linked stage.
    pub overview: Option<Arc<Artefact>>,
    /// Present only once `Ready`.
    pub navigation: Option<NavigationState>,
    pub issue: Option<GuidanceIssue>,
}

impl GuidanceSnapshot {
    pub fn idle() -> Self {
        Self {
            state: ResolutionState::Idle,
            scope: None,
            overview: None,
            navigation: None,
            issue: None,
        }
    }

    /// Linked artefacts; empty unless `Ready`.
    pub fn linked(&self) -> &[Option<Arc<Artefact>>] {
        self.navigation
            .as_ref()
            .map(NavigationState::linked)
            .unwrap_or_default()
    }

    /// Artefact to display: the navigation's current one, else the overview.
    pub fn current_artefact(&self) -> Option<&Arc<Artefact>> {
        match &self.navigation {
            Some(nav) => Some(nav.current()),
            None => self.overview.as_ref(),
        }
    }

    pub fn overview_mode(&self) -> bool {
        self.navigation
            .as_ref()
            .map_or(self.overview.is_some(), NavigationState::is_overview_mode)
    }
}

impl Default for GuidanceSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

/// A finished resolution and the one notification describing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub snapshot: GuidanceSnapshot,
    pub notification: Notification,
}

// ---------------------------------------------------------------------------
// GuidanceResolver
// ---------------------------------------------------------------------------

/// Runs the two-stage resolution against a [`SearchGateway`].
pub struct GuidanceResolver {
    gateway: Arc<dyn SearchGateway>,
    notifier: Arc<dyn Notifier>,
    context: ContextResolver,
    queries: QueryBuilder,
}

impl GuidanceResolver {
    pub fn new(
        gateway: Arc<dyn SearchGateway>,
        notifier: Arc<dyn Notifier>,
        options: &GuidanceOptions,
    ) -> Self {
        Self {
            gateway,
            notifier,
            context: ContextResolver::new(&options.scope_prefix, &options.location_marker),
            queries: QueryBuilder::new(&options.initial_query),
        }
    }

    pub fn context_resolver(&self) -> &ContextResolver {
        &self.context
    }

    pub(crate) fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Resolve guidance for `context` and publish the outcome.
    pub async fn resolve(&self, context: &PageContext) -> GuidanceSnapshot {
        let resolution = self.run(self.context.resolve(context)).await;
        publish(self.notifier.as_ref(), resolution.notification);
        resolution.snapshot
    }

    /// Resolve guidance for an already-derived scope without publishing.
    #[instrument(skip_all, fields(scope = scope.as_ref().map(|m| m.scope.as_str())))]
    pub async fn run(&self, scope: Option<ScopeMatch>) -> Resolution {
        let mut snapshot = GuidanceSnapshot {
            state: ResolutionState::ResolvingOverview,
            scope,
            ..GuidanceSnapshot::idle()
        };
        let scope_id = snapshot.scope.as_ref().map(|m| m.scope.clone());
        let query = self.queries.build(scope_id.as_ref());

        debug!(payload = ?query.payload, "overview search");
        let outcome = self.gateway.artefact_search(&query.payload).await;

        let overview = match on_overview_response(outcome) {
            OverviewStep::Found(candidate) => Arc::new(candidate),
            OverviewStep::Failed { state, issue } => {
                let message = match &issue {
                    GuidanceIssue::MissingLinkage { candidate_id } => {
                        messages::no_overview_artefact(scope_id.as_ref(), candidate_id)
                    }
                    GuidanceIssue::GatewayFailure { .. } => messages::GATEWAY_FAILURE.to_string(),
                    _ => query.fallback_message.clone(),
                };
                return fail(snapshot, state, issue, message);
            }
        };

        // The overview is committed from here on, whatever the linked stage does.
        snapshot.overview = Some(Arc::clone(&overview));
        snapshot.state = ResolutionState::ResolvingLinked;

        let declared = overview.linked_scopes();
        let payload = self.queries.linked(declared);
        debug!(linked = declared.len(), payload = ?payload, "linked search");
        let outcome = self.gateway.artefact_search(&payload).await;

        match on_linked_response(&overview, outcome) {
            LinkedStep::Joined(linked) => {
                let found = linked.iter().flatten().count();
                info!(
                    overview = %overview.id,
                    found,
                    declared = declared.len(),
                    "guidance ready"
                );
                let notification =
                    Notification::info(messages::guidance_ready(found, declared.len()));
                snapshot.navigation = Some(NavigationState::new(overview, linked));
                snapshot.state = ResolutionState::Ready;
                Resolution {
                    snapshot,
                    notification,
                }
            }
            LinkedStep::Failed { state, issue } => {
                let message = match &issue {
                    GuidanceIssue::GatewayFailure { .. } => messages::GATEWAY_FAILURE.to_string(),
                    _ => messages::no_linked_artefacts(declared),
                };
                fail(snapshot, state, issue, message)
            }
        }
    }
}

fn fail(
    mut snapshot: GuidanceSnapshot,
    state: ResolutionState,
    issue: GuidanceIssue,
    message: String,
) -> Resolution {
    match &issue {
        GuidanceIssue::GatewayFailure { detail } => warn!(?state, %detail, "search call failed"),
        other => info!(?state, issue = ?other, "guidance unavailable"),
    }
    snapshot.state = state;
    snapshot.issue = Some(issue);
    Resolution {
        snapshot,
        notification: Notification::warning(message),
    }
}
