use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::admin::AdminPage;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnloadDecision {
    Proceed,
    Prompt,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "page", rename_all = "snake_case")]
pub enum Navigation {
    Stayed,
    Moved(AdminPage),
}

/// Whether an admin page holds edits that were not saved yet. Shared by every
/// page; never persisted.
#[derive(Clone, Debug, Default)]
pub struct UnsavedChanges(Arc<AtomicBool>);

impl UnsavedChanges {
    pub fn new() -> UnsavedChanges {
        UnsavedChanges::default()
    }

    pub fn set(&self, pending: bool) {
        self.0.store(pending, Ordering::SeqCst);
    }

    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.set(false);
    }

    pub fn before_unload(&self) -> UnloadDecision {
        if self.is_pending() {
            UnloadDecision::Prompt
        } else {
            UnloadDecision::Proceed
        }
    }

    pub fn navigate(&self, target: AdminPage, confirm: bool) -> Navigation {
        if self.is_pending() && !confirm {
            debug!(?target, "navigation held back by unsaved changes");
            return Navigation::Stayed;
        }

        self.reset();
        Navigation::Moved(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_pages_can_be_left() {
        let unsaved = UnsavedChanges::new();

        assert_eq!(unsaved.before_unload(), UnloadDecision::Proceed);
        assert_eq!(
            unsaved.navigate(AdminPage::Videos, false),
            Navigation::Moved(AdminPage::Videos)
        );
    }

    #[test]
    fn pending_changes_hold_navigation_until_confirmed() {
        let unsaved = UnsavedChanges::new();
        unsaved.set(true);

        assert_eq!(unsaved.before_unload(), UnloadDecision::Prompt);
        assert_eq!(unsaved.navigate(AdminPage::Team, false), Navigation::Stayed);
        assert!(unsaved.is_pending());

        assert_eq!(
            unsaved.navigate(AdminPage::Team, true),
            Navigation::Moved(AdminPage::Team)
        );
        assert!(!unsaved.is_pending());
    }

    #[test]
    fn clones_share_the_flag() {
        let unsaved = UnsavedChanges::new();
        let other = unsaved.clone();

        other.set(true);

        assert!(unsaved.is_pending());
    }
}
