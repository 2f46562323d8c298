//! GroupGateway trait — the abstraction over the Mealie admin API.
//!
//! The reconciler only ever talks to the server through this trait, so the
//! HTTP client can be swapped for an in-memory fake in tests.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::model::{Group, SelfGroup, User};

#[async_trait]
pub trait GroupGateway: Send + Sync {
    /// List every group on the server (all pages).
    async fn list_groups(&self) -> Result<Vec<Group>, GatewayError>;

    /// Create a group with the given name.
    ///
    /// Returns [`GatewayError::Conflict`] when the name is already taken.
    async fn create_group(&self, name: &str) -> Result<Group, GatewayError>;

    /// List the members of the caller's group.
    async fn list_members(&self) -> Result<Vec<User>, GatewayError>;

    /// The caller's own active group.
    async fn self_group(&self) -> Result<SelfGroup, GatewayError>;

    /// Replace a user record. Returns the record as stored by the server.
    async fn update_user(&self, user: &User) -> Result<User, GatewayError>;
}
