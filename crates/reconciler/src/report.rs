//! Per-tick summary.

use serde::Serialize;

/// What a successful tick observed and changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Groups in the snapshot taken at the start of the tick
    pub groups_seen: usize,
    pub members_seen: usize,
    /// Members left alone because they were already isolated
    pub skipped: usize,
    pub groups_created: Vec<String>,
    pub users_reassigned: Vec<String>,
}

impl TickReport {
    /// Whether the tick issued any mutation.
    pub fn has_changes(&self) -> bool {
        !self.groups_created.is_empty() || !self.users_reassigned.is_empty()
    }
}
