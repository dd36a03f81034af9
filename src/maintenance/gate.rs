//! Gate: decides what a client session shows while maintenance is on.

use tracing::{debug, warn};

use super::config::{MaintenanceConfig, MaintenanceMode};
use crate::auth::RoleResolver;
use crate::db::Role;

/// Key that toggles the bypass unless configured otherwise.
pub const DEFAULT_BYPASS_KEY: &str = "F12";

/// What to render for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Blocking maintenance screen.
    Block,
    /// Nothing, the app is usable.
    Pass,
    /// Dismissible maintenance notice.
    Inform,
}

/// The gate decision table.
///
/// ```
/// use pinpin::maintenance::{decide, GateDecision, MaintenanceMode};
///
/// assert_eq!(decide(false, MaintenanceMode::Global, false, false), GateDecision::Pass);
/// assert_eq!(decide(true, MaintenanceMode::Global, false, true), GateDecision::Block);
/// assert_eq!(decide(true, MaintenanceMode::Global, true, true), GateDecision::Pass);
/// assert_eq!(decide(true, MaintenanceMode::Warning, true, true), GateDecision::Inform);
/// ```
pub fn decide(
    enabled: bool,
    mode: MaintenanceMode,
    is_admin: bool,
    bypass_visible: bool,
) -> GateDecision {
    if !enabled {
        return GateDecision::Pass;
    }
    match mode {
        MaintenanceMode::Global if is_admin && bypass_visible => GateDecision::Pass,
        MaintenanceMode::Global => GateDecision::Block,
        MaintenanceMode::Warning => GateDecision::Inform,
    }
}

/// Progress of the asynchronous role lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleState {
    /// Lookup not finished yet.
    Pending,
    /// No signed-in user.
    Anonymous,
    Resolved(Role),
    /// Lookup failed; treated as unprivileged.
    Failed,
}

/// Per-session gate state: role, bypass toggle, visibility latch and
/// notice dismissal.
#[derive(Debug, Clone)]
pub struct GateSession {
    bypass_key: String,
    role: RoleState,
    bypass_visible: bool,
    latched: bool,
    notice_dismissed: bool,
}

impl GateSession {
    pub fn new(bypass_key: impl Into<String>) -> Self {
        Self {
            bypass_key: bypass_key.into(),
            role: RoleState::Pending,
            bypass_visible: false,
            latched: false,
            notice_dismissed: false,
        }
    }

    /// Resolve the session's role. `None` means nobody is signed in.
    pub async fn resolve_role<R: RoleResolver>(&mut self, resolver: &R, user_id: Option<i64>) {
        let state = match user_id {
            None => RoleState::Anonymous,
            Some(id) => match resolver.resolve(id).await {
                Ok(role) => RoleState::Resolved(role),
                Err(e) => {
                    warn!(user_id = id, error = %e, "Role lookup failed, bypass unavailable");
                    RoleState::Failed
                }
            },
        };
        self.set_role(state);
    }

    pub fn set_role(&mut self, state: RoleState) {
        self.role = state;
        if !self.is_admin() {
            self.bypass_visible = false;
        }
    }

    pub fn role_state(&self) -> RoleState {
        self.role
    }

    /// Privileged and resolved. Pending and failed lookups are never admin.
    pub fn is_admin(&self) -> bool {
        matches!(self.role, RoleState::Resolved(role) if role.is_privileged())
    }

    pub fn bypass_visible(&self) -> bool {
        self.bypass_visible
    }

    /// Handle a key press. Returns true when the bypass flipped.
    pub fn on_key(&mut self, key: &str) -> bool {
        if key != self.bypass_key || !self.is_admin() {
            return false;
        }
        self.bypass_visible = !self.bypass_visible;
        debug!(bypass_visible = self.bypass_visible, "Maintenance bypass toggled");
        true
    }

    /// Hide the warning notice for the rest of the session.
    ///
    /// Local only, nothing is written to the store.
    pub fn dismiss_notice(&mut self) {
        self.notice_dismissed = true;
    }

    /// Whether the maintenance view has been shown in this session.
    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Decide what to render for `config`.
    ///
    /// The latch records that the maintenance view has been shown in this
    /// session. Disabling maintenance lifts the view right away.
    pub fn render(&mut self, config: &MaintenanceConfig) -> GateDecision {
        if config.enabled {
            self.latched = true;
        }
        if !config.enabled || !self.latched {
            return GateDecision::Pass;
        }

        match decide(true, config.mode, self.is_admin(), self.bypass_visible) {
            GateDecision::Inform if self.notice_dismissed => GateDecision::Pass,
            decision => decision,
        }
    }
}
