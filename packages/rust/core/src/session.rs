//! The host-facing guidance session.
//!
//! Owns the one committed [`GuidanceSnapshot`] and applies cancel-and-restart
//! to overlapping refreshes: a new [`GuidanceSession::refresh`] cancels the
//! one in flight, and only the newest resolution commits and notifies.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::context::ContextProvider;
use crate::notify::publish;
use crate::resolver::{GuidanceResolver, GuidanceSnapshot};

struct SessionState {
    generation: u64,
    in_flight: CancellationToken,
    committed: GuidanceSnapshot,
}

pub struct GuidanceSession {
    resolver: Arc<GuidanceResolver>,
    context: Arc<dyn ContextProvider>,
    state: Mutex<SessionState>,
}

impl GuidanceSession {
    pub fn new(resolver: Arc<GuidanceResolver>, context: Arc<dyn ContextProvider>) -> Self {
        Self {
            resolver,
            context,
            state: Mutex::new(SessionState {
                generation: 0,
                in_flight: CancellationToken::new(),
                committed: GuidanceSnapshot::idle(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Re-read the page context and resolve guidance for it.
    ///
    /// Returns `None` when a later refresh (or [`Self::cancel`]) superseded
    /// this one; the committed snapshot is then left to the newer call.
    #[instrument(skip_all, fields(generation = tracing::field::Empty))]
    pub async fn refresh(&self) -> Option<GuidanceSnapshot> {
        let page = self.context.current();
        let scope = self.resolver.context_resolver().resolve(&page);

        let (generation, token) = {
            let mut state = self.lock();
            state.in_flight.cancel();
            state.generation += 1;
            state.in_flight = CancellationToken::new();
            (state.generation, state.in_flight.clone())
        };
        tracing::Span::current().record("generation", generation);

        let resolution = tokio::select! {
            _ = token.cancelled() => {
                debug!("resolution superseded");
                return None;
            }
            resolution = self.resolver.run(scope) => resolution,
        };

        {
            let mut state = self.lock();
            if state.generation != generation {
                debug!("resolution finished after being superseded");
                return None;
            }
            state.committed = resolution.snapshot.clone();
        }
        if resolution.snapshot.state.is_failure() {
            debug!(state = ?resolution.snapshot.state, "committed failed resolution");
        } else {
            debug!("committed resolution");
        }
        publish(self.resolver.notifier(), resolution.notification);
        Some(resolution.snapshot)
    }

    /// Abandon the resolution in flight, if any.
    pub fn cancel(&self) {
        let mut state = self.lock();
        state.in_flight.cancel();
        state.generation += 1;
    }

    pub fn snapshot(&self) -> GuidanceSnapshot {
        self.lock().committed.clone()
    }

    /// Show a linked artefact. `false` if the committed snapshot has no
    /// linked artefact with that id.
    pub fn select_linked(&self, artefact_id: &str) -> bool {
        self.lock()
            .committed
            .navigation
            .as_mut()
            .is_some_and(|nav| nav.select_linked(artefact_id))
    }

    pub fn return_to_overview(&self) {
        if let Some(nav) = self.lock().committed.navigation.as_mut() {
            nav.return_to_overview();
        }
    }

    /// Panviva document behind the artefact on screen, for "zoom".
    pub fn current_document_id(&self) -> Option<String> {
        self.lock()
            .committed
            .current_artefact()
            .and_then(|a| a.panviva_document_id.clone())
    }
}
