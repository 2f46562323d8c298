//! Per-user group isolation for Mealie.
//!
//! The [`Reconciler`] enforces a single policy: every user belongs to a
//! personal group named `"{username}'s Group"`, created on demand. It is a
//! [`groupwarden_scheduler::Job`], so the scheduler invokes one
//! [`Reconciler::tick`] per interval.

pub mod reconciler;
pub mod report;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use reconciler::{Reconciler, ReconcilerOptions};
pub use report::TickReport;
