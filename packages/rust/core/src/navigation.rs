//! Overview / linked-artefact navigation.
//!
//! Created once per successful resolution and replaced wholesale by the
//! next one. Only [`NavigationState::select_linked`] and
//! [`NavigationState::return_to_overview`] mutate it, and neither touches
//! the network.

use std::sync::Arc;

use pageguide_shared::{Artefact, ContentLine};
use serde::Serialize;

/// Linked artefacts, index-aligned with the overview's `linkedScope.values`.
/// A `None` slot means no artefact carried that scope.
pub type LinkedArtefacts = Vec<Option<Arc<Artefact>>>;

/// Which artefact is on screen, and whether it is the overview.
///
/// Invariant: `overview_mode` holds exactly when `current` is the overview
/// (pointer identity, not structural equality).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationState {
    overview: Arc<Artefact>,
    linked: LinkedArtefacts,
    current: Arc<Artefact>,
    overview_mode: bool,
}

impl NavigationState {
    /// Start on the overview.
    pub fn new(overview: Arc<Artefact>, linked: LinkedArtefacts) -> Self {
        Self {
            current: Arc::clone(&overview),
            overview,
            linked,
            overview_mode: true,
        }
    }

    pub fn overview(&self) -> &Arc<Artefact> {
        &self.overview
    }

    pub fn linked(&self) -> &[Option<Arc<Artefact>>] {
        &self.linked
    }

    pub fn current(&self) -> &Arc<Artefact> {
        &self.current
    }

    pub fn is_overview_mode(&self) -> bool {
        self.overview_mode
    }

    /// Show the linked artefact with `artefact_id`.
    ///
    /// Returns `false` and leaves the state untouched when no linked slot
    /// holds that id (e.g. an id from an earlier resolution).
    pub fn select_linked(&mut self, artefact_id: &str) -> bool {
        let found = self
            .linked
            .iter()
            .flatten()
            .find(|artefact| artefact.id == artefact_id);

        match found {
            Some(artefact) => {
                self.current = Arc::clone(artefact);
                self.overview_mode = false;
                true
            }
            None => false,
        }
    }

    /// Go back to the overview. Always succeeds.
    pub fn return_to_overview(&mut self) {
        self.current = Arc::clone(&self.overview);
        self.overview_mode = true;
    }

    /// Plain text of the artefact on screen.
    pub fn artefact_as_plaintext(&self) -> &str {
        self.current.plaintext()
    }

    /// Body of the artefact on screen, keyed by position.
    pub fn content_lines(&self) -> Vec<ContentLine> {
        self.current.content_lines()
    }

    /// Panviva document backing the artefact on screen.
    pub fn related_document(&self) -> Option<&str> {
        self.current.panviva_document_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::artefact;

    fn state() -> NavigationState {
        let overview = Arc::new(artefact("ov", &["home"], &["a", "missing", "b"]));
        let linked = vec![
            Some(Arc::new(artefact("qa-a", &["a"], &[]))),
            None,
            Some(Arc::new(artefact("qa-b", &["b"], &[]))),
        ];
        NavigationState::new(overview, linked)
    }

    fn invariant_holds(nav: &NavigationState) -> bool {
        nav.is_overview_mode() == Arc::ptr_eq(nav.current(), nav.overview())
    }

    #[test]
    fn starts_on_overview() {
        let nav = state();
        assert!(nav.is_overview_mode());
        assert!(invariant_holds(&nav));
        assert_eq!(nav.linked().len(), 3);
    }

    #[test]
    fn select_then_return() {
        let mut nav = state();
        assert!(nav.select_linked("qa-b"));
        assert_eq!(nav.current().id, "qa-b");
        assert!(!nav.is_overview_mode());
        assert!(invariant_holds(&nav));

        nav.return_to_overview();
        assert!(Arc::ptr_eq(nav.current(), nav.overview()));
        assert!(nav.is_overview_mode());
    }

    #[test]
    fn return_restores_overview_after_any_selection() {
        for id in ["qa-a", "qa-b", "unknown"] {
            let mut nav = state();
            nav.select_linked(id);
            nav.return_to_overview();
            assert!(nav.is_overview_mode());
            assert!(invariant_holds(&nav));
        }
    }

    #[test]
    fn unknown_id_is_a_no_op() {
        let mut nav = state();
        nav.select_linked("qa-a");
        let before = nav.clone();

        assert!(!nav.select_linked("unknown-id"));
        assert_eq!(nav, before);
        assert!(Arc::ptr_eq(nav.current(), before.current()));
    }

    #[test]
    fn overview_id_is_not_a_linked_target() {
        let mut nav = state();
        assert!(!nav.select_linked("ov"));
        assert!(nav.is_overview_mode());
    }

    #[test]
    fn views_follow_current() {
        let mut nav = state();
        assert_eq!(nav.artefact_as_plaintext(), "ov body");
        assert_eq!(nav.related_document(), Some("doc-ov"));

        nav.select_linked("qa-a");
        assert_eq!(nav.artefact_as_plaintext(), "qa-a body");
        assert_eq!(nav.content_lines()[0].text, "qa-a body");
    }
}
