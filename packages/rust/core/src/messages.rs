//! Message templates shown to the user.
//!
//! Distinct causes get distinct wording. Gateway failures share one generic
//! message so transport details never reach the user.

use pageguide_shared::ScopeId;

/// Transport/service failure on any search call.
pub const GATEWAY_FAILURE: &str = "That didn't work.\n\nPlease validate your settings.";

/// Failure of a live side-channel call.
pub const LIVE_FAILURE: &str = "This didn't work.\n\nPlease validate your settings.";

/// Live call attempted without a known user.
pub const NO_USERNAME: &str =
    "I don't know who you are yet. Set your email so I can reach your Panviva window.";

/// "Zoom" on an artefact without a Panviva document.
pub const NO_RELATED_DOCUMENT: &str = "This quick answer has no related panviva document.";

/// Context-sensitive help requested with no page context at all.
pub const NO_HELP_CONTEXT: &str =
    "I couldn't work out where you are, so there is no guidance to look up.";

pub fn no_overview_artefact(scope: Option<&ScopeId>, artefact_id: &str) -> String {
    match scope {
        Some(scope) => format!(
            "Sorry, I found \"{artefact_id}\" for the scope \"{scope}\" \
             but it isn't an overview: it has no linked quick answers."
        ),
        None => format!(
            "Sorry, I found \"{artefact_id}\" but it isn't an overview: \
             it has no linked quick answers."
        ),
    }
}

pub fn no_linked_artefacts(linked: &[ScopeId]) -> String {
    let names = linked
        .iter()
        .map(ScopeId::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Sorry, I couldn't find any quick answers for the linked scopes ({names}). \
         Showing you the overview only."
    )
}

pub fn guidance_ready(found: usize, declared: usize) -> String {
    format!("Found {found} of {declared} linked quick answers.")
}

pub fn quick_answer_found(total: usize) -> String {
    format!("Found {total} results. Showing you the top result.")
}

pub fn document_sent(document_id: &str, username: &str) -> String {
    format!("Sent related panviva document #{document_id} to user \"{username}\".")
}

pub fn live_search_started(query: &str, username: &str) -> String {
    format!("Searching \"{query}\" within panviva for user \"{username}\".")
}

pub fn documents_found(count: usize, term: &str) -> String {
    format!(
        "Found {count} search results for \"{term}\". \
         You may want to look at your panviva window for more results."
    )
}

pub fn documents_not_found(term: &str) -> String {
    format!(
        "Sorry, I searched for \"{term}\" but couldn't find anything for you. \
         You may want to look at your panviva window for more results."
    )
}
