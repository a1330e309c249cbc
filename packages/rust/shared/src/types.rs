//! Core domain types for help artefacts and search requests.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{GuidanceError, Result};

// ---------------------------------------------------------------------------
// ScopeId
// ---------------------------------------------------------------------------

/// A scope token classifying help content by the page it applies to.
///
/// Locally derived scopes are lower-cased and non-empty (see [`ScopeId::new`]).
/// Values read from search responses are kept verbatim so that scope
/// matching compares exactly what the service returned, except that blank
/// entries are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    /// Lower-case `raw` into a scope. Returns `None` for an empty token.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let raw = raw.as_ref();
        if raw.is_empty() {
            return None;
        }
        Some(Self(raw.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SearchPayload
// ---------------------------------------------------------------------------

/// Request body for an artefact search call.
///
/// `filter` and `advancedquery` are opaque strings in the search service's
/// query grammar; they are built locally but never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPayload {
    pub simplequery: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advancedquery: Option<String>,
}

impl SearchPayload {
    /// A plain query with no scope filter.
    pub fn simple(query: impl Into<String>) -> Self {
        Self {
            simplequery: query.into(),
            filter: None,
            advancedquery: None,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_advanced_query(mut self, query: impl Into<String>) -> Self {
        self.advancedquery = Some(query.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Artefact
// ---------------------------------------------------------------------------

/// One node of an artefact's body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNode {
    #[serde(default)]
    pub text: String,
}

/// A content node paired with its position, as handed to renderers.
///
/// `key` is positional and is not stable across re-fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentLine {
    pub key: usize,
    pub text: String,
}

/// `{ values: [...] }` wrapper used by the artefact metadata fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeValues {
    #[serde(default, deserialize_with = "non_blank_scopes")]
    pub values: Vec<ScopeId>,
}

/// Scope metadata attached to an artefact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtefactMetaData {
    /// Scopes this artefact belongs to.
    #[serde(default)]
    pub scope: ScopeValues,
    /// Scopes this artefact links out to (overview artefacts only).
    #[serde(default, alias = "linkedScopes", skip_serializing_if = "Option::is_none")]
    pub linked_scope: Option<ScopeValues>,
}

/// A unit of help content returned by the search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artefact {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    /// Backing Panviva document, used by the "zoom" side channel.
    #[serde(
        default,
        deserialize_with = "flexible_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub panviva_document_id: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_content: Option<String>,
    #[serde(default)]
    pub meta_data: ArtefactMetaData,
}

impl Artefact {
    /// Scopes this artefact carries.
    pub fn scopes(&self) -> &[ScopeId] {
        &self.meta_data.scope.values
    }

    /// Linked scopes in declared order; empty when the field is absent.
    pub fn linked_scopes(&self) -> &[ScopeId] {
        self.meta_data
            .linked_scope
            .as_ref()
            .map(|s| s.values.as_slice())
            .unwrap_or_default()
    }

    pub fn has_scope(&self, scope: &ScopeId) -> bool {
        self.scopes().contains(scope)
    }

    /// Body nodes keyed by position.
    pub fn content_lines(&self) -> Vec<ContentLine> {
        self.content
            .iter()
            .enumerate()
            .map(|(key, node)| ContentLine {
                key,
                text: node.text.clone(),
            })
            .collect()
    }

    /// Plain-text rendering of the artefact (`simpleContent`).
    pub fn plaintext(&self) -> &str {
        self.simple_content.as_deref().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Parsed body of an artefact search call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Absent and `null` both read as "no results".
    #[serde(default)]
    pub results: Option<Vec<Artefact>>,
}

impl SearchResponse {
    /// Parse the JSON text returned by the gateway.
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| GuidanceError::parse(format!("artefact search response: {e}")))
    }

    pub fn into_results(self) -> Vec<Artefact> {
        self.results.unwrap_or_default()
    }
}

/// One hit from a document search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHit {
    #[serde(
        default,
        deserialize_with = "flexible_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Remaining fields, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Parsed body of a document search call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSearchResponse {
    #[serde(default)]
    pub results: Option<Vec<DocumentHit>>,
}

impl DocumentSearchResponse {
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| GuidanceError::parse(format!("document search response: {e}")))
    }

    pub fn into_results(self) -> Vec<DocumentHit> {
        self.results.unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Notification severity. Only two levels are ever emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A user-facing `(severity, message)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Identifier helpers
// ---------------------------------------------------------------------------

/// The service returns ids as either strings or numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn flexible_id<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<String, D::Error> {
    RawId::deserialize(de).map(String::from)
}

fn flexible_opt_id<'de, D: Deserializer<'de>>(
    de: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(de)?.map(String::from))
}

fn non_blank_scopes<'de, D: Deserializer<'de>>(
    de: D,
) -> std::result::Result<Vec<ScopeId>, D::Error> {
    let values = Vec::<ScopeId>::deserialize(de)?;
    Ok(values
        .into_iter()
        .filter(|scope| !scope.as_str().trim().is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_id_lowercases_and_rejects_empty() {
        let scope = ScopeId::new("SF-Page-Guidance-v2-CaseOverview").expect("scope");
        assert_eq!(scope.as_str(), "sf-page-guidance-v2-caseoverview");
        assert!(ScopeId::new("").is_none());
    }

    #[test]
    fn payload_omits_absent_fields() {
        let json = serde_json::to_string(&SearchPayload::simple("*")).expect("serialize");
        assert_eq!(json, r#"{"simplequery":"*"}"#);

        let json = serde_json::to_string(&SearchPayload::simple("*").with_filter("f"))
            .expect("serialize");
        assert_eq!(json, r#"{"simplequery":"*","filter":"f"}"#);
    }

    #[test]
    fn artefact_accepts_numeric_ids() {
        let artefact: Artefact = serde_json::from_str(
            r#"{"id": 42, "panvivaDocumentId": 1001, "content": [{"text": "Hi"}]}"#,
        )
        .expect("deserialize");
        assert_eq!(artefact.id, "42");
        assert_eq!(artefact.panviva_document_id.as_deref(), Some("1001"));
        assert!(artefact.linked_scopes().is_empty());
        assert_eq!(artefact.plaintext(), "");
    }

    #[test]
    fn linked_scopes_alias_is_accepted() {
        let artefact: Artefact = serde_json::from_str(
            r#"{"id": "a", "metaData": {"scope": {"values": ["x"]}, "linkedScopes": {"values": ["y", "z"]}}}"#,
        )
        .expect("deserialize");
        let linked: Vec<&str> = artefact.linked_scopes().iter().map(ScopeId::as_str).collect();
        assert_eq!(linked, ["y", "z"]);
    }

    #[test]
    fn blank_scope_values_are_dropped() {
        let artefact: Artefact = serde_json::from_str(
            r#"{"id": "a", "metaData": {"scope": {"values": ["x", ""]}, "linkedScope": {"values": ["", "y", "  ", "z"]}}}"#,
        )
        .expect("deserialize");
        let linked: Vec<&str> = artefact.linked_scopes().iter().map(ScopeId::as_str).collect();
        assert_eq!(linked, ["y", "z"]);
        assert_eq!(artefact.scopes().len(), 1);
    }

    #[test]
    fn content_lines_are_positional() {
        let artefact: Artefact = serde_json::from_str(
            r#"{"id": "a", "content": [{"text": "first"}, {"text": "second"}]}"#,
        )
        .expect("deserialize");
        let lines = artefact.content_lines();
        assert_eq!(lines[1], ContentLine { key: 1, text: "second".into() });
    }

    #[test]
    fn null_and_missing_results_are_empty() {
        assert!(SearchResponse::from_json("{}").unwrap().into_results().is_empty());
        assert!(SearchResponse::from_json(r#"{"results": null}"#)
            .unwrap()
            .into_results()
            .is_empty());
    }

    #[test]
    fn malformed_body_is_a_parse_error() {
        let err = SearchResponse::from_json("<html>502</html>").unwrap_err();
        assert!(matches!(err, GuidanceError::Parse { .. }));
    }

    #[test]
    fn document_hits_keep_unknown_fields() {
        let parsed = DocumentSearchResponse::from_json(
            r#"{"results": [{"id": 7, "name": "Refunds", "category": "billing"}]}"#,
        )
        .expect("parse");
        let hits = parsed.into_results();
        assert_eq!(hits[0].id.as_deref(), Some("7"));
        assert_eq!(hits[0].extra["category"], "billing");
    }

    #[test]
    fn artefact_search_fixture_validates() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/artefact-search.fixture.json")
            .expect("read fixture");
        let parsed = SearchResponse::from_json(&fixture).expect("deserialize fixture");
        let results = parsed.into_results();
        assert_eq!(results.len(), 3);

        let overview = &results[0];
        assert_eq!(overview.panviva_document_id.as_deref(), Some("1201"));
        assert_eq!(overview.linked_scopes().len(), 2);
        assert!(overview.has_scope(&ScopeId::new("sf-page-guidance-v2-caseoverview").unwrap()));
    }
}
