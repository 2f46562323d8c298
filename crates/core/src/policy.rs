//! Reconciliation policies selectable from configuration.

use serde::{Deserialize, Serialize};

use crate::model::User;

/// How the reconciler decides a user is already isolated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationCheck {
    /// `user.group` equals the user's personal group name.
    #[default]
    Structural,

    /// The username appears anywhere inside the caller's current group name.
    ///
    /// Kept for compatibility with older deployments. Short usernames can
    /// match unrelated group names and be skipped.
    LegacySubstring,
}

impl IsolationCheck {
    /// Whether `user` should be left alone this tick.
    pub fn is_isolated(&self, user: &User, current_group: &str) -> bool {
        match self {
            IsolationCheck::Structural => user.is_in_personal_group(),
            IsolationCheck::LegacySubstring => current_group.contains(user.username.as_str()),
        }
    }
}

/// What happens to the rest of a tick when one user fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserErrorPolicy {
    /// Stop the tick at the first failing user.
    #[default]
    AbortTick,

    /// Record the failure and keep going with the remaining users.
    Continue,
}

impl std::fmt::Display for IsolationCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IsolationCheck::Structural => write!(f, "structural"),
            IsolationCheck::LegacySubstring => write!(f, "legacy_substring"),
        }
    }
}

impl std::fmt::Display for UserErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserErrorPolicy::AbortTick => write!(f, "abort_tick"),
            UserErrorPolicy::Continue => write!(f, "continue"),
        }
    }
}
