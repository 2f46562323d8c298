//! The reconciliation pass.
//!
//! One [`Reconciler::tick`] reads a fresh snapshot of groups, members, and
//! the caller's own group, then moves every member that is not yet isolated
//! into their personal group, creating that group on demand. Nothing is
//! carried over between ticks.

use async_trait::async_trait;
use groupwarden_core::{
    GatewayError, Group, GroupGateway, GroupIndex, InvariantViolation, IsolationCheck, Operation,
    ReconcileError, User, UserErrorPolicy, UserFailure,
};
use groupwarden_scheduler::Job;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::report::TickReport;

/// Policy knobs for a [`Reconciler`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilerOptions {
    pub isolation_check: IsolationCheck,
    pub on_user_error: UserErrorPolicy,
}

impl From<&groupwarden_config::ReconcileConfig> for ReconcilerOptions {
    fn from(config: &groupwarden_config::ReconcileConfig) -> Self {
        Self {
            isolation_check: config.isolation_check,
            on_user_error: config.on_user_error,
        }
    }
}

/// Enforces one personal group per user on a Mealie server.
pub struct Reconciler<G: ?Sized> {
    gateway: Arc<G>,
    options: ReconcilerOptions,
}

/// What happened to a single member during a tick.
enum UserOutcome {
    Skipped,
    Reassigned { created_group: bool },
}

impl<G: GroupGateway + ?Sized> Reconciler<G> {
    pub fn new(gateway: Arc<G>, options: ReconcilerOptions) -> Self {
        Self { gateway, options }
    }

    /// Run one reconciliation pass.
    ///
    /// Fetch failures and a missing self group abort the tick before any
    /// mutation. Per-user failures either abort the remaining tick or are
    /// collected into [`ReconcileError::UsersFailed`], depending on
    /// [`UserErrorPolicy`].
    pub async fn tick(&self) -> Result<TickReport, ReconcileError> {
        debug!("Polling for users...");

        let mut groups = self.fetch_groups().await?;

        let members = self
            .gateway
            .list_members()
            .await
            .map_err(|e| ReconcileError::transport(Operation::ListMembers, e))?;
        debug!(count = members.len(), "Found users");

        let current = self
            .gateway
            .self_group()
            .await
            .map_err(|e| ReconcileError::transport(Operation::SelfGroup, e))?;

        if !groups.contains(&current.name) {
            return Err(InvariantViolation::SelfGroupMissing {
                group: current.name,
            }
            .into());
        }

        let mut report = TickReport {
            groups_seen: groups.len(),
            members_seen: members.len(),
            ..TickReport::default()
        };
        let mut failures = Vec::new();

        for user in &members {
            match self.reconcile_user(user, &current.name, &mut groups).await {
                Ok(UserOutcome::Skipped) => report.skipped += 1,
                Ok(UserOutcome::Reassigned { created_group }) => {
                    let group = user.personal_group_name();
                    if created_group {
                        report.groups_created.push(group.clone());
                    }
                    report.users_reassigned.push(user.username.clone());
                }
                Err(e) => match self.options.on_user_error {
                    UserErrorPolicy::AbortTick => return Err(e),
                    UserErrorPolicy::Continue => {
                        warn!(username = %user.username, error = %e, "Failed to reconcile user, continuing");
                        failures.push(UserFailure {
                            username: user.username.clone(),
                            error: e.to_string(),
                        });
                    }
                },
            }
        }

        if !failures.is_empty() {
            warn!(
                failed = failures.len(),
                reassigned = report.users_reassigned.len(),
                "Tick finished with failures"
            );
            return Err(ReconcileError::UsersFailed(failures));
        }

        if report.has_changes() {
            info!(
                created = report.groups_created.len(),
                reassigned = report.users_reassigned.len(),
                skipped = report.skipped,
                "Tick complete"
            );
        } else {
            debug!(members = report.members_seen, "Tick complete, nothing to do");
        }

        Ok(report)
    }

    async fn fetch_groups(&self) -> Result<GroupIndex, ReconcileError> {
        self.gateway
            .list_groups()
            .await
            .map(GroupIndex::from)
            .map_err(|e| ReconcileError::transport(Operation::ListGroups, e))
    }

    async fn reconcile_user(
        &self,
        user: &User,
        current_group: &str,
        groups: &mut GroupIndex,
    ) -> Result<UserOutcome, ReconcileError> {
        if self.options.isolation_check.is_isolated(user, current_group) {
            debug!(username = %user.username, "User already isolated, skipping");
            return Ok(UserOutcome::Skipped);
        }

        let personal = user.personal_group_name();
        let mut created_group = false;

        if !groups.contains(&personal) {
            created_group = self.ensure_group(&personal).await?;
            *groups = self.fetch_groups().await?;
        }

        let group = groups
            .get(&personal)
            .cloned()
            .ok_or_else(|| InvariantViolation::PersonalGroupMissing {
                group: personal.clone(),
            })?;

        self.assign(user, &group).await?;
        Ok(UserOutcome::Reassigned { created_group })
    }

    /// Create `name`. Returns `false` when the server says it already exists.
    async fn ensure_group(&self, name: &str) -> Result<bool, ReconcileError> {
        match self.gateway.create_group(name).await {
            Ok(group) => {
                debug!(group = %group.name, "Created group");
                Ok(true)
            }
            Err(GatewayError::Conflict(reason)) => {
                debug!(group = %name, reason = %reason, "Group already exists");
                Ok(false)
            }
            Err(e) => Err(ReconcileError::transport(Operation::CreateGroup, e)),
        }
    }

    async fn assign(&self, user: &User, group: &Group) -> Result<(), ReconcileError> {
        let payload = user.assigned_to(group);
        let updated = self
            .gateway
            .update_user(&payload)
            .await
            .map_err(|e| ReconcileError::transport(Operation::UpdateUser, e))?;

        if updated.group.as_deref() != Some(group.name.as_str()) {
            return Err(InvariantViolation::GroupMismatch {
                username: user.username.clone(),
                expected: group.name.clone(),
                actual: updated.group,
            }
            .into());
        }

        info!(username = %user.username, group = %group.name, "Updated user group");
        Ok(())
    }
}

#[async_trait]
impl<G: GroupGateway + ?Sized + 'static> Job for Reconciler<G> {
    type Error = ReconcileError;

    fn name(&self) -> &str {
        "reconcile"
    }

    async fn run(&self) -> Result<(), ReconcileError> {
        self.tick().await.map(|_| ())
    }
}
