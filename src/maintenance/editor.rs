//! Admin Editor: write-through edits of the maintenance document.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use super::config::{resolve_document, MaintenanceConfig, MaintenanceMode};
use super::store::ConfigStore;
use crate::auth::can_manage_maintenance;
use crate::db::Role;

/// Shown instead of the editor to roles without any access.
pub const ACCESS_DENIED_MESSAGE: &str = "Only founders can manage maintenance mode.";

/// What the editor shows for a role. Decided once per view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorView {
    Denied,
    Editor,
    /// Current settings visible, controls disabled.
    ReadOnly,
}

impl EditorView {
    pub fn for_role(role: Role) -> Self {
        if can_manage_maintenance(role) {
            EditorView::Editor
        } else if role.is_privileged() {
            EditorView::ReadOnly
        } else {
            EditorView::Denied
        }
    }

    pub fn can_edit(&self) -> bool {
        *self == EditorView::Editor
    }

    pub fn can_view(&self) -> bool {
        *self != EditorView::Denied
    }
}

/// Rejected edits. Nothing is written when these are returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("You don't have permission to toggle maintenance mode")]
    ToggleDenied,

    #[error("You don't have permission to change maintenance mode")]
    ModeDenied,

    #[error("You don't have permission to change the maintenance message")]
    MessageDenied,
}

/// Result of the write-through after a local change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Persisted,
    /// The write failed and was logged; local state keeps the change.
    NotPersisted,
}

/// One editing view over the maintenance document.
///
/// Every accepted change updates local state first and then writes the whole
/// document through. Failed writes are not rolled back.
pub struct MaintenanceEditor<S: ConfigStore> {
    store: Arc<S>,
    view: EditorView,
    config: MaintenanceConfig,
}

impl<S: ConfigStore> MaintenanceEditor<S> {
    /// Open the editor for `role`, loading the current document.
    ///
    /// A failed load is logged and leaves the default config in place.
    pub async fn open(store: Arc<S>, role: Role) -> Self {
        let view = EditorView::for_role(role);
        let config = if view.can_view() {
            match store.load().await {
                Ok(doc) => resolve_document(doc),
                Err(e) => {
                    warn!(error = %e, "Could not load maintenance config for editor");
                    MaintenanceConfig::default()
                }
            }
        } else {
            MaintenanceConfig::default()
        };

        Self {
            store,
            view,
            config,
        }
    }

    pub fn view(&self) -> EditorView {
        self.view
    }

    /// Current local config. `None` for a denied view.
    pub fn config(&self) -> Option<&MaintenanceConfig> {
        self.view.can_view().then_some(&self.config)
    }

    pub async fn toggle_enabled(&mut self) -> Result<WriteOutcome, EditorError> {
        let enabled = !self.config.enabled;
        self.set_enabled(enabled).await
    }

    pub async fn set_enabled(&mut self, enabled: bool) -> Result<WriteOutcome, EditorError> {
        if !self.view.can_edit() {
            return Err(EditorError::ToggleDenied);
        }
        self.config.enabled = enabled;
        info!(enabled, "Maintenance mode toggled");
        Ok(self.write_through().await)
    }

    pub async fn set_mode(&mut self, mode: MaintenanceMode) -> Result<WriteOutcome, EditorError> {
        if !self.view.can_edit() {
            return Err(EditorError::ModeDenied);
        }
        self.config.mode = mode;
        info!(mode = %mode, "Maintenance mode variant changed");
        Ok(self.write_through().await)
    }

    pub async fn set_message(
        &mut self,
        message: impl Into<String>,
    ) -> Result<WriteOutcome, EditorError> {
        if !self.view.can_edit() {
            return Err(EditorError::MessageDenied);
        }
        self.config.message = message.into();
        Ok(self.write_through().await)
    }

    async fn write_through(&mut self) -> WriteOutcome {
        let now = Utc::now();
        match self.store.save(&self.config.to_document(now)).await {
            Ok(()) => {
                self.config.last_updated = Some(now);
                WriteOutcome::Persisted
            }
            Err(e) => {
                error!(error = %e, "Error saving maintenance config");
                WriteOutcome::NotPersisted
            }
        }
    }
}
