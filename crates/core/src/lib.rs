//! # GroupWarden Core
//!
//! Domain types, the gateway trait, and error definitions for the GroupWarden
//! reconciliation daemon. Every other crate depends inward on this one.
//!
//! ## Design Philosophy
//!
//! The Mealie server is reached only through the [`GroupGateway`] trait
//! defined here. The HTTP implementation lives in `groupwarden-client`, and
//! tests drive the reconciler with in-memory fakes.

pub mod error;
pub mod gateway;
pub mod model;
pub mod policy;

// Re-export key types at crate root for ergonomics
pub use error::{GatewayError, InvariantViolation, Operation, ReconcileError, UserFailure};
pub use gateway::GroupGateway;
pub use model::{Group, GroupIndex, GroupPage, SelfGroup, User, group_slug, personal_group_name};
pub use policy::{IsolationCheck, UserErrorPolicy};
