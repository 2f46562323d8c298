//! Error types for the GroupWarden domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Transport failures and invariant violations are kept apart so logs say
//! which side of the wire went wrong.

use thiserror::Error;

/// Failures talking to the Mealie server.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Gateway not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl GatewayError {
    /// Whether repeating the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Network(_) => true,
            GatewayError::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// The gateway call a transport failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListGroups,
    CreateGroup,
    ListMembers,
    SelfGroup,
    UpdateUser,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::ListGroups => "list groups",
            Operation::CreateGroup => "create group",
            Operation::ListMembers => "list members",
            Operation::SelfGroup => "fetch self group",
            Operation::UpdateUser => "update user",
        };
        f.write_str(name)
    }
}

/// Server state that contradicts what the reconciler relies on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("Group '{group}' not found in groups, the caller must belong to a listed group")]
    SelfGroupMissing { group: String },

    #[error("Group '{group}' still missing after creation")]
    PersonalGroupMissing { group: String },

    #[error("Failed to update user {username}: expected group '{expected}', server reports {actual:?}")]
    GroupMismatch {
        username: String,
        expected: String,
        actual: Option<String>,
    },
}

/// A per-user failure recorded under the `continue` policy.
#[derive(Debug, Clone)]
pub struct UserFailure {
    pub username: String,
    pub error: String,
}

impl std::fmt::Display for UserFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.username, self.error)
    }
}

/// Errors that end a reconciliation tick.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Failed to {operation}: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: GatewayError,
    },

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error("{} user(s) failed to reconcile: {}", .0.len(), join_failures(.0))]
    UsersFailed(Vec<UserFailure>),
}

impl ReconcileError {
    pub fn transport(operation: Operation, source: GatewayError) -> Self {
        ReconcileError::Transport { operation, source }
    }
}

fn join_failures(failures: &[UserFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
