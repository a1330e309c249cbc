//! Guidance resolution for pageguide.
//!
//! Derives a scope from the user's page, resolves the overview artefact and
//! its linked quick answers through a [`pageguide_shared::SearchGateway`],
//! and tracks which of them is on screen. The live-assist side channels
//! (document open, live search, context-sensitive help, document search,
//! quick answer) live here too.

pub mod assist;
pub mod context;
pub mod messages;
pub mod navigation;
pub mod notify;
pub mod query;
pub mod resolver;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use assist::{KeyedDocument, LiveAssist, QuickAnswer};
pub use context::{
    ContextProvider, ContextResolver, PageAttributes, PageContext, ScopeMatch, ScopeSource,
    StaticContext,
};
pub use navigation::{LinkedArtefacts, NavigationState};
pub use notify::{Notifier, RecordingNotifier, publish};
pub use query::{ArtefactQuery, QueryBuilder};
pub use resolver::{
    GuidanceIssue, GuidanceResolver, GuidanceSnapshot, Resolution, ResolutionState,
};
pub use session::GuidanceSession;
