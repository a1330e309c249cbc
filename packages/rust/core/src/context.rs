//! Page context and scope derivation.
//!
//! The host supplies where the user currently is (page attributes and the
//! raw location string); [`ContextResolver`] turns that into a [`ScopeId`].

use std::sync::RwLock;

use pageguide_shared::ScopeId;
use serde::{Deserialize, Serialize};

/// Attributes of the current page reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_api_name: Option<String>,
}

/// Everything the host knows about the user's current location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<PageAttributes>,
    /// Full location string (e.g. the browser URL), used as a last resort.
    #[serde(default)]
    pub fallback_location: String,
}

impl PageContext {
    pub fn with_page_name(mut self, page_name: impl Into<String>) -> Self {
        self.attributes.get_or_insert_with(Default::default).page_name = Some(page_name.into());
        self
    }

    pub fn with_object_api_name(mut self, api_name: impl Into<String>) -> Self {
        self.attributes
            .get_or_insert_with(Default::default)
            .object_api_name = Some(api_name.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.fallback_location = location.into();
        self
    }
}

/// Read-only access to the host's current page context.
pub trait ContextProvider: Send + Sync {
    fn current(&self) -> PageContext;
}

/// A context provider the host updates explicitly.
#[derive(Debug, Default)]
pub struct StaticContext {
    inner: RwLock<PageContext>,
}

impl StaticContext {
    pub fn new(context: PageContext) -> Self {
        Self {
            inner: RwLock::new(context),
        }
    }

    /// Replace the current context (e.g. after the user navigates).
    pub fn set(&self, context: PageContext) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = context;
    }
}

impl ContextProvider for StaticContext {
    fn current(&self) -> PageContext {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Which input produced the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeSource {
    PageName,
    ObjectApiName,
    Location,
}

/// A derived scope plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeMatch {
    pub scope: ScopeId,
    pub source: ScopeSource,
    /// The un-prefixed value the scope was built from.
    pub raw: String,
}

impl ScopeMatch {
    /// The "why this guidance" line shown alongside resolved content.
    pub fn describe(&self) -> String {
        format!(
            "Using location to determine context for assistance. \
             This is guidance associated with Salesforce's \"{}\" page. \
             Lookup quick answers with scope {}.",
            self.raw, self.scope
        )
    }
}

/// Derives a scope from a [`PageContext`].
#[derive(Debug, Clone)]
pub struct ContextResolver {
    prefix: String,
    location_marker: String,
}

impl ContextResolver {
    pub fn new(prefix: impl Into<String>, location_marker: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            location_marker: location_marker.into(),
        }
    }

    /// First match wins: page name, then object API name, then the record
    /// segment of the location. `None` means "search without a scope".
    pub fn resolve(&self, context: &PageContext) -> Option<ScopeMatch> {
        let attrs = context.attributes.as_ref();

        if let Some(page_name) = attrs.and_then(|a| non_empty(&a.page_name)) {
            return self.scope_match(page_name, ScopeSource::PageName);
        }
        if let Some(api_name) = attrs.and_then(|a| non_empty(&a.object_api_name)) {
            return self.scope_match(api_name, ScopeSource::ObjectApiName);
        }

        let object = self.object_from_location(&context.fallback_location)?;
        self.scope_match(object, ScopeSource::Location)
    }

    /// Convenience wrapper returning only the scope.
    pub fn resolve_scope(&self, context: &PageContext) -> Option<ScopeId> {
        self.resolve(context).map(|m| m.scope)
    }

    /// `.../lightning/r/<Object>/<recordId>/view` yields `<Object>`.
    fn object_from_location<'a>(&self, location: &'a str) -> Option<&'a str> {
        if self.location_marker.is_empty() {
            return None;
        }
        let segments: Vec<&str> = location.split(self.location_marker.as_str()).collect();
        if segments.len() != 2 {
            return None;
        }
        let components: Vec<&str> = segments[1].split('/').collect();
        if components.len() > 2 && !components[0].is_empty() {
            Some(components[0])
        } else {
            None
        }
    }

    fn scope_match(&self, raw: &str, source: ScopeSource) -> Option<ScopeMatch> {
        let scope = ScopeId::new(format!("{}{raw}", self.prefix))?;
        Some(ScopeMatch {
            scope,
            source,
            raw: raw.to_string(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "sf-page-guidance-v2-";

    fn resolver() -> ContextResolver {
        ContextResolver::new(PREFIX, "lightning/r/")
    }

    #[test]
    fn page_name_wins() {
        let ctx = PageContext::default()
            .with_page_name("CaseOverview")
            .with_object_api_name("Account")
            .with_location("https://acme.my.salesforce.com/lightning/r/Contact/003xx/view");
        let m = resolver().resolve(&ctx).expect("scope");
        assert_eq!(m.scope.as_str(), "sf-page-guidance-v2-caseoverview");
        assert_eq!(m.source, ScopeSource::PageName);
        assert_eq!(m.raw, "CaseOverview");
    }

    #[test]
    fn empty_page_name_falls_through_to_object() {
        let ctx = PageContext::default()
            .with_page_name("")
            .with_object_api_name("Account");
        let m = resolver().resolve(&ctx).expect("scope");
        assert_eq!(m.scope.as_str(), "sf-page-guidance-v2-account");
        assert_eq!(m.source, ScopeSource::ObjectApiName);
    }

    #[test]
    fn record_location_yields_object_segment() {
        let ctx = PageContext::default()
            .with_location("https://acme.lightning.force.com/lightning/r/Case/500xx000001/view");
        let m = resolver().resolve(&ctx).expect("scope");
        assert_eq!(m.scope.as_str(), "sf-page-guidance-v2-case");
        assert_eq!(m.source, ScopeSource::Location);
    }

    #[test]
    fn short_or_ambiguous_locations_have_no_scope() {
        let r = resolver();
        // Only two components after the marker.
        let ctx = PageContext::default().with_location("https://x/lightning/r/Case/500xx");
        assert!(r.resolve(&ctx).is_none());
        // Marker appears twice.
        let ctx = PageContext::default()
            .with_location("https://x/lightning/r/Case/1/lightning/r/Task/2/view");
        assert!(r.resolve(&ctx).is_none());
        // Marker absent.
        let ctx = PageContext::default().with_location("https://x/lightning/page/home");
        assert!(r.resolve(&ctx).is_none());
        // Nothing at all.
        assert!(r.resolve(&PageContext::default()).is_none());
    }

    #[test]
    fn help_prefix_is_independent() {
        let help = ContextResolver::new("sf-page-guidance-", "lightning/r/");
        let ctx = PageContext::default().with_page_name("LogACall");
        assert_eq!(
            help.resolve_scope(&ctx).expect("scope").as_str(),
            "sf-page-guidance-logacall"
        );
    }

    #[test]
    fn static_context_reflects_updates() {
        let provider = StaticContext::new(PageContext::default().with_page_name("A"));
        provider.set(PageContext::default().with_page_name("B"));
        let current = provider.current();
        assert_eq!(
            current.attributes.and_then(|a| a.page_name).as_deref(),
            Some("B")
        );
    }

    #[test]
    fn describe_mentions_scope_and_page() {
        let ctx = PageContext::default().with_page_name("CaseOverview");
        let text = resolver().resolve(&ctx).expect("scope").describe();
        assert!(text.contains("\"CaseOverview\""));
        assert!(text.contains("sf-page-guidance-v2-caseoverview"));
    }
}
