//! Search payload construction.
//!
//! Filters are written in the search service's OData-style grammar. They are
//! treated as an opaque contract with the service: built here, never parsed.

use pageguide_shared::{ScopeId, SearchPayload};

/// A search payload plus the warning to show if it finds nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtefactQuery {
    pub payload: SearchPayload,
    pub fallback_message: String,
}

/// Builds artefact search payloads.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    initial_query: String,
}

impl QueryBuilder {
    pub fn new(initial_query: impl Into<String>) -> Self {
        Self {
            initial_query: initial_query.into(),
        }
    }

    /// Overview query for `scope`, or an unfiltered query without one.
    pub fn build(&self, scope: Option<&ScopeId>) -> ArtefactQuery {
        let payload = SearchPayload::simple(self.initial_query.as_str());
        match scope {
            None => ArtefactQuery {
                payload,
                fallback_message: format!(
                    "Sorry, I searched for \"{}\" but couldn't find anything for you.",
                    self.initial_query
                ),
            },
            Some(scope) => ArtefactQuery {
                payload: payload.with_filter(scope_filter(scope)),
                fallback_message: format!(
                    "Sorry, I searched for quick answers with the scope set to \"{scope}\" \
                     but couldn't find anything for you."
                ),
            },
        }
    }

    /// One batched query matching any artefact in any of `scopes`.
    pub fn linked(&self, scopes: &[ScopeId]) -> SearchPayload {
        SearchPayload::simple(self.initial_query.as_str())
            .with_advanced_query(self.initial_query.as_str())
            .with_filter(any_scope_filter(scopes))
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new("*")
    }
}

/// "The artefact's scope values contain `scope`."
pub fn scope_filter(scope: &ScopeId) -> String {
    format!(
        "metaData/scope/values/any(scope: scope eq '{}')",
        escape_literal(scope.as_str())
    )
}

/// "The artefact's scope values intersect `scopes`."
///
/// `search.in` splits its list on the delimiter, so a scope containing one
/// switches the filter to an `or` of exact comparisons.
pub fn any_scope_filter(scopes: &[ScopeId]) -> String {
    if scopes.iter().any(|s| s.as_str().contains(',')) {
        let terms = scopes
            .iter()
            .map(|s| format!("scope eq '{}'", escape_literal(s.as_str())))
            .collect::<Vec<_>>()
            .join(" or ");
        return format!("metaData/scope/values/any(scope: {terms})");
    }

    let list = scopes
        .iter()
        .map(|s| escape_literal(s.as_str()))
        .collect::<Vec<_>>()
        .join(",");
    format!("metaData/scope/values/any(scope: search.in(scope, '{list}', ','))")
}

/// Single quotes are doubled inside OData string literals.
fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}
