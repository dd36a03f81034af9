//! Maintenance configuration document.
//!
//! The stored document is read as a [`PartialMaintenanceConfig`]; every read
//! path goes through [`PartialMaintenanceConfig::fill_defaults`] to obtain a
//! complete [`MaintenanceConfig`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message shown when the document carries none.
pub const DEFAULT_MESSAGE: &str =
    "The system is currently under maintenance. Please try again later.";

/// How an active maintenance window affects regular users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceMode {
    /// Dismissible notice, the app stays usable.
    #[default]
    Warning,
    /// Blocking screen for everyone except bypassing staff.
    Global,
}

impl MaintenanceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceMode::Warning => "warning",
            MaintenanceMode::Global => "global",
        }
    }
}

impl fmt::Display for MaintenanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaintenanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warning" => Ok(MaintenanceMode::Warning),
            "global" => Ok(MaintenanceMode::Global),
            _ => Err(format!("unknown maintenance mode: {s}")),
        }
    }
}

/// Complete maintenance configuration.
///
/// `enabled` and `mode` are independent: a disabled config still remembers
/// the last selected mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceConfig {
    pub enabled: bool,
    pub message: String,
    pub mode: MaintenanceMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            message: DEFAULT_MESSAGE.to_string(),
            mode: MaintenanceMode::default(),
            last_updated: None,
        }
    }
}

impl MaintenanceConfig {
    /// Whether the blocking variant is in force.
    pub fn is_blocking(&self) -> bool {
        self.enabled && self.mode == MaintenanceMode::Global
    }

    /// Build the document written back to the store, stamped with `now`.
    pub fn to_document(&self, now: DateTime<Utc>) -> PartialMaintenanceConfig {
        PartialMaintenanceConfig {
            enabled: Some(self.enabled),
            message: Some(self.message.clone()),
            mode: Some(self.mode.as_str().to_string()),
            last_updated: Some(now),
        }
    }
}

/// The stored document as read, every field optional.
///
/// `mode` is kept as a raw string so an unrecognised value degrades to the
/// default instead of failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialMaintenanceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl PartialMaintenanceConfig {
    /// Substitute defaults for missing fields.
    ///
    /// An empty message counts as missing.
    pub fn fill_defaults(self) -> MaintenanceConfig {
        MaintenanceConfig {
            enabled: self.enabled.unwrap_or(false),
            message: self
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            mode: self
                .mode
                .and_then(|m| m.parse().ok())
                .unwrap_or_default(),
            last_updated: self.last_updated,
        }
    }
}

/// Fill defaults for an optional document; absence means the default config.
pub fn resolve_document(doc: Option<PartialMaintenanceConfig>) -> MaintenanceConfig {
    doc.map(PartialMaintenanceConfig::fill_defaults)
        .unwrap_or_default()
}
