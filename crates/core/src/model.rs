//! Domain model — the groups and users owned by the Mealie server.
//!
//! GroupWarden never persists any of these. They are read fresh each tick
//! and only ever sent back as mutation requests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A server-side group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Server-assigned identifier
    pub id: String,

    /// Unique group name
    pub name: String,

    /// URL slug, when the server reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// The caller's own active group, as reported by `/api/groups/self`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelfGroup {
    #[serde(default)]
    pub name: String,
}

/// A group member.
///
/// Only the fields the reconciler reasons about are typed. Everything else
/// the server returns is kept in `extra` and echoed back verbatim on update,
/// since the admin update endpoint expects the full record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,

    pub username: String,

    /// Name of the group the user currently belongs to
    #[serde(default)]
    pub group: Option<String>,

    /// Passthrough fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    /// The personal group this user is supposed to live in.
    pub fn personal_group_name(&self) -> String {
        personal_group_name(&self.username)
    }

    /// Whether the user already sits in their personal group.
    pub fn is_in_personal_group(&self) -> bool {
        self.group.as_deref() == Some(self.personal_group_name().as_str())
    }

    /// Build the update payload that moves this user into `group`.
    ///
    /// The original record is left untouched; passthrough fields survive.
    pub fn assigned_to(&self, group: &Group) -> User {
        let mut updated = self.clone();
        updated.group = Some(group.name.clone());
        updated.extra.insert(
            "groupSlug".into(),
            serde_json::Value::String(group_slug(&group.name)),
        );
        updated
            .extra
            .insert("group_id".into(), serde_json::Value::String(group.id.clone()));
        updated
    }
}

/// `"{username}'s Group"`.
pub fn personal_group_name(username: &str) -> String {
    format!("{username}'s Group")
}

/// Slug sent alongside a group assignment: lowercased, spaces to dashes.
pub fn group_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Snapshot of all groups on the server, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct GroupIndex {
    by_name: HashMap<String, Group>,
}

impl GroupIndex {
    pub fn new(groups: Vec<Group>) -> Self {
        Self {
            by_name: groups.into_iter().map(|g| (g.name.clone(), g)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Group> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl From<Vec<Group>> for GroupIndex {
    fn from(groups: Vec<Group>) -> Self {
        Self::new(groups)
    }
}

/// One page of the admin group listing.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupPage {
    #[serde(default)]
    pub items: Vec<Group>,

    #[serde(default)]
    pub total_pages: Option<u32>,
}
