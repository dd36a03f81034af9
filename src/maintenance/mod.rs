//! Site-wide maintenance mode.
//!
//! - [`ConfigStore`]: the single maintenance document with change notification
//! - [`MaintenanceObserver`]: mirrors the document into local state
//! - [`GateSession`] / [`decide`]: what a session renders
//! - [`MaintenanceEditor`]: founder-only write-through edits

mod config;
mod editor;
mod gate;
mod observer;
mod store;

pub use config::{
    resolve_document, MaintenanceConfig, MaintenanceMode, PartialMaintenanceConfig,
    DEFAULT_MESSAGE,
};
pub use editor::{EditorError, EditorView, MaintenanceEditor, WriteOutcome, ACCESS_DENIED_MESSAGE};
pub use gate::{decide, GateDecision, GateSession, RoleState, DEFAULT_BYPASS_KEY};
pub use observer::{MaintenanceObserver, ObservedState};
pub use store::{ConfigStore, SqliteConfigStore, StoreEvent, Subscription, MAINTENANCE_KEY};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::store::test_support::FlakyStore;
    use super::*;
    use crate::db::Role;

    #[tokio::test]
    async fn test_warning_notice_dismissal_never_writes() {
        let store = Arc::new(FlakyStore::new(None));
        let mut editor = MaintenanceEditor::open(store.clone(), Role::Founder).await;
        editor.set_enabled(true).await.unwrap();
        let writes = store.save_count();

        let mut observer = MaintenanceObserver::activate(store.clone());
        let config = observer.loaded().await;
        assert_eq!(config.mode, MaintenanceMode::Warning);

        for role in [Role::User, Role::Admin, Role::Founder] {
            let mut session = GateSession::new(DEFAULT_BYPASS_KEY);
            session.set_role(RoleState::Resolved(role));
            assert_eq!(session.render(&config), GateDecision::Inform);
            session.dismiss_notice();
            assert_eq!(session.render(&config), GateDecision::Pass);
        }

        assert_eq!(store.save_count(), writes);
        assert!(observer.is_enabled());
    }

    #[tokio::test]
    async fn test_editor_write_reaches_observer() {
        let db = crate::Database::open_in_memory().await.unwrap();
        let store = Arc::new(SqliteConfigStore::new(db.pool().clone()));
        let mut observer = MaintenanceObserver::activate(store.clone());
        assert!(!observer.loaded().await.enabled);

        let mut editor = MaintenanceEditor::open(store.clone(), Role::Founder).await;
        editor.set_mode(MaintenanceMode::Global).await.unwrap();
        assert!(observer.changed().await);
        assert!(!observer.is_enabled());
        assert_eq!(observer.mode(), MaintenanceMode::Global);

        editor.set_enabled(true).await.unwrap();
        assert!(observer.changed().await);
        assert!(observer.current().config.is_blocking());
    }
}
