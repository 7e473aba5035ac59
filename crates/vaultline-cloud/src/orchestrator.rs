//! Dependency-ordered provisioning pipeline
//!
//! ```text
//! Start → AccountResolved → SourceContainerReady → DestinationContainerReady
//!       → RoleReady → ReplicationApplied → AuditPolicyApplied → TrailReady
//!       → LoggingActive → Done
//! ```
//!
//! Each step method takes the handles produced by the steps it depends on,
//! so a step cannot be called before its inputs exist. A failed step halts
//! the run where it is; nothing is rolled back; running again from the start
//! is the recovery path.

use crate::action::{Action, ActionType, Plan, RunReport};
use crate::ensure::{Ensured, apply_config, ensure_created, exists};
use crate::error::{CloudError, ProvisionError, Result};
use crate::policy;
use crate::provider::CloudClients;
use crate::resource::{
    AccountId, BucketHandle, BucketSpec, EventSelector, InlinePolicy, ReplicationConfig,
    ReplicationRule, ResourceKind, RoleHandle, RoleSpec, RuleStatus, TrailHandle, TrailSpec,
    VersioningStatus,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Instant;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_POLICY_NAME: &str = "vaultlineReplicationPolicy";
pub const DEFAULT_REPLICATION_RULE_ID: &str = "ReplicateAllObjectsToBackupBucket";

/// Pipeline states, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Start,
    AccountResolved,
    SourceContainerReady,
    DestinationContainerReady,
    RoleReady,
    ReplicationApplied,
    AuditPolicyApplied,
    TrailReady,
    LoggingActive,
    Done,
}

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::Start,
        Stage::AccountResolved,
        Stage::SourceContainerReady,
        Stage::DestinationContainerReady,
        Stage::RoleReady,
        Stage::ReplicationApplied,
        Stage::AuditPolicyApplied,
        Stage::TrailReady,
        Stage::LoggingActive,
        Stage::Done,
    ];

    /// The stage following this one, `None` for [`Stage::Done`]
    pub fn next(self) -> Option<Stage> {
        let index = Self::ALL.iter().position(|s| *s == self)?;
        Self::ALL.get(index + 1).copied()
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::AccountResolved => "account-resolved",
            Stage::SourceContainerReady => "source-container-ready",
            Stage::DestinationContainerReady => "destination-container-ready",
            Stage::RoleReady => "role-ready",
            Stage::ReplicationApplied => "replication-applied",
            Stage::AuditPolicyApplied => "audit-policy-applied",
            Stage::TrailReady => "trail-ready",
            Stage::LoggingActive => "logging-active",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Names and settings for one provisioning run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub region: String,

    /// Bucket whose objects are replicated and audited
    pub source_bucket: String,

    /// Replica bucket, also receives the audit log files
    pub destination_bucket: String,

    /// Role assumed by S3 to replicate objects
    pub role_name: String,

    pub trail_name: String,

    /// Name of the inline permission policy attached to the role
    pub policy_name: String,

    pub replication_rule_id: String,
}

impl ProvisionRequest {
    pub fn new(
        source_bucket: impl Into<String>,
        destination_bucket: impl Into<String>,
        role_name: impl Into<String>,
        trail_name: impl Into<String>,
    ) -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            source_bucket: source_bucket.into(),
            destination_bucket: destination_bucket.into(),
            role_name: role_name.into(),
            trail_name: trail_name.into(),
            policy_name: DEFAULT_POLICY_NAME.to_string(),
            replication_rule_id: DEFAULT_REPLICATION_RULE_ID.to_string(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }
}

/// Proof that the audit bucket policy was applied.
///
/// Only [`Orchestrator::apply_audit_policy`] can produce one, and the trail
/// step requires it.
#[derive(Debug, Clone)]
pub struct AuditPolicyApplied {
    bucket: BucketHandle,
}

impl AuditPolicyApplied {
    /// Bucket the audit trail delivers to
    pub fn bucket(&self) -> &BucketHandle {
        &self.bucket
    }
}

/// Stage cursor and report of a run in progress
struct Progress {
    reached: Stage,
    report: RunReport,
}

impl Progress {
    fn new() -> Self {
        Self {
            reached: Stage::Start,
            report: RunReport::new(),
        }
    }

    /// Await one step; advance to `stage` on success, halt otherwise.
    ///
    /// Whatever cause reaches this point is fatal for the run.
    async fn step<T, F>(&mut self, stage: Stage, call: F) -> std::result::Result<T, ProvisionError>
    where
        F: Future<Output = Result<T>>,
    {
        debug_assert_eq!(
            self.reached.next(),
            Some(stage),
            "stages must advance one at a time"
        );
        match call.await {
            Ok(value) => {
                tracing::debug!(from = %self.reached, to = %stage, "Stage reached");
                self.reached = stage;
                self.report.final_stage = stage;
                Ok(value)
            }
            Err(source) => {
                let source = source.into_fatal();
                tracing::error!(
                    step = %stage,
                    reached = %self.reached,
                    class = %source.class(),
                    "Provisioning halted: {}",
                    source
                );
                Err(ProvisionError::StepFailed {
                    step: stage,
                    reached: self.reached,
                    source,
                })
            }
        }
    }

    fn ensured<H>(&mut self, kind: ResourceKind, name: &str, ensured: &Ensured<H>) {
        let action_type = if ensured.was_created() {
            ActionType::Create
        } else {
            ActionType::NoOp
        };
        self.report.record(Action::new(
            self.reached,
            action_type,
            kind,
            name,
            kind.to_string(),
        ));
    }

    fn updated(&mut self, kind: ResourceKind, name: &str, what: &str) {
        self.report
            .record(Action::new(self.reached, ActionType::Update, kind, name, what));
    }
}

/// Sequential driver of the provisioning pipeline
pub struct Orchestrator {
    clients: CloudClients,
    request: ProvisionRequest,
}

impl Orchestrator {
    pub fn new(clients: CloudClients, request: ProvisionRequest) -> Self {
        Self { clients, request }
    }

    /// Run every step in order until [`Stage::Done`] or the first fatal error
    pub async fn run(&self) -> std::result::Result<RunReport, ProvisionError> {
        let started = Instant::now();
        let mut progress = Progress::new();
        let request = &self.request;

        tracing::info!(
            provider = %self.clients.provider,
            region = %request.region,
            "Provisioning {} -> {}",
            request.source_bucket,
            request.destination_bucket
        );

        let account = progress
            .step(Stage::AccountResolved, self.resolve_account())
            .await?;

        let source = progress
            .step(
                Stage::SourceContainerReady,
                self.provision_bucket(&request.source_bucket),
            )
            .await?;
        progress.ensured(ResourceKind::Bucket, &request.source_bucket, &source);
        progress.updated(ResourceKind::Bucket, &request.source_bucket, "versioning");
        let source = source.into_handle();

        let destination = progress
            .step(
                Stage::DestinationContainerReady,
                self.provision_bucket(&request.destination_bucket),
            )
            .await?;
        progress.ensured(ResourceKind::Bucket, &request.destination_bucket, &destination);
        progress.updated(ResourceKind::Bucket, &request.destination_bucket, "versioning");
        let destination = destination.into_handle();

        let role = progress
            .step(
                Stage::RoleReady,
                self.provision_role(&account, &source, &destination),
            )
            .await?;
        progress.ensured(ResourceKind::Role, &request.role_name, &role);
        progress.updated(ResourceKind::Role, &request.role_name, "inline policy");
        let role = role.into_handle();

        progress
            .step(
                Stage::ReplicationApplied,
                self.apply_replication(&source, &destination, &role),
            )
            .await?;
        progress.updated(ResourceKind::Bucket, &source.name, "replication rules");

        let audit = progress
            .step(
                Stage::AuditPolicyApplied,
                self.apply_audit_policy(&destination, &account),
            )
            .await?;
        progress.updated(ResourceKind::Bucket, &destination.name, "audit bucket policy");

        let trail = progress
            .step(Stage::TrailReady, self.provision_trail(&audit, &source))
            .await?;
        progress.ensured(ResourceKind::Trail, &request.trail_name, &trail);
        progress.updated(ResourceKind::Trail, &request.trail_name, "event selectors");
        let trail = trail.into_handle();

        progress
            .step(Stage::LoggingActive, self.activate_logging(&trail))
            .await?;
        progress.updated(ResourceKind::Trail, &trail.name, "logging");

        progress.step(Stage::Done, async { Ok(()) }).await?;

        let mut report = progress.report;
        report.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "Provisioning complete in {}ms: {}",
            report.duration_ms,
            report.summary()
        );
        Ok(report)
    }

    /// Describe what [`Orchestrator::run`] would do without changing anything.
    ///
    /// Only the account lookup and existence probes reach the remote API.
    pub async fn plan(&self) -> std::result::Result<Plan, ProvisionError> {
        let mut progress = Progress::new();
        let request = &self.request;
        let mut actions = Vec::new();

        progress
            .step(Stage::AccountResolved, self.resolve_account())
            .await?;

        for (stage, name) in [
            (Stage::SourceContainerReady, &request.source_bucket),
            (Stage::DestinationContainerReady, &request.destination_bucket),
        ] {
            let present = progress
                .step(stage, exists(self.clients.buckets.as_ref(), name))
                .await?;
            actions.push(planned(stage, ResourceKind::Bucket, name, present));
            actions.push(Action::new(
                stage,
                ActionType::Update,
                ResourceKind::Bucket,
                name.as_str(),
                "versioning",
            ));
        }

        let present = progress
            .step(
                Stage::RoleReady,
                exists(self.clients.roles.as_ref(), &request.role_name),
            )
            .await?;
        actions.push(planned(
            Stage::RoleReady,
            ResourceKind::Role,
            &request.role_name,
            present,
        ));
        actions.push(Action::new(
            Stage::RoleReady,
            ActionType::Update,
            ResourceKind::Role,
            request.role_name.as_str(),
            "inline policy",
        ));

        // Overwrite-only steps: nothing to probe
        progress
            .step(Stage::ReplicationApplied, async { Ok(()) })
            .await?;
        actions.push(Action::new(
            Stage::ReplicationApplied,
            ActionType::Update,
            ResourceKind::Bucket,
            request.source_bucket.as_str(),
            "replication rules",
        ));
        progress
            .step(Stage::AuditPolicyApplied, async { Ok(()) })
            .await?;
        actions.push(Action::new(
            Stage::AuditPolicyApplied,
            ActionType::Update,
            ResourceKind::Bucket,
            request.destination_bucket.as_str(),
            "audit bucket policy",
        ));

        let present = progress
            .step(
                Stage::TrailReady,
                exists(self.clients.trails.as_ref(), &request.trail_name),
            )
            .await?;
        actions.push(planned(
            Stage::TrailReady,
            ResourceKind::Trail,
            &request.trail_name,
            present,
        ));
        actions.push(Action::new(
            Stage::TrailReady,
            ActionType::Update,
            ResourceKind::Trail,
            request.trail_name.as_str(),
            "event selectors",
        ));
        actions.push(Action::new(
            Stage::LoggingActive,
            ActionType::Update,
            ResourceKind::Trail,
            request.trail_name.as_str(),
            "logging",
        ));

        Ok(Plan::new(actions))
    }

    pub async fn resolve_account(&self) -> Result<AccountId> {
        let account = self.clients.account.resolve_account().await?;
        if account.as_str().is_empty() {
            return Err(CloudError::api(
                ResourceKind::Account,
                "caller",
                "MissingField",
                "caller identity has no account id",
            ));
        }
        tracing::info!("Resolved account {}", account);
        Ok(account)
    }

    /// Ensure the bucket exists and has versioning enabled
    pub async fn provision_bucket(&self, name: &str) -> Result<Ensured<BucketHandle>> {
        let spec = BucketSpec::new(name, &self.request.region);
        let ensured = ensure_created(self.clients.buckets.as_ref(), &spec).await?;

        let bucket = ensured.handle();
        apply_config(
            ResourceKind::Bucket,
            &bucket.name,
            "versioning",
            self.clients
                .buckets
                .put_versioning(bucket, VersioningStatus::Enabled),
        )
        .await?;

        Ok(ensured)
    }

    /// Ensure the replication role exists and carries its permission policy
    pub async fn provision_role(
        &self,
        account: &AccountId,
        source: &BucketHandle,
        destination: &BucketHandle,
    ) -> Result<Ensured<RoleHandle>> {
        let spec = RoleSpec {
            name: self.request.role_name.clone(),
            trust_policy: policy::replication_trust_policy(account),
            description: format!(
                "S3 replication role for {} -> {}",
                source.name, destination.name
            ),
        };
        let ensured = ensure_created(self.clients.roles.as_ref(), &spec).await?;

        let inline = InlinePolicy {
            name: self.request.policy_name.clone(),
            document: policy::replication_permissions(source, destination),
        };
        let role = ensured.handle();
        apply_config(
            ResourceKind::Role,
            &role.name,
            "inline policy",
            self.clients.roles.put_inline_policy(role, &inline),
        )
        .await?;

        Ok(ensured)
    }

    /// Replace the replication configuration of `source` with a single rule
    /// copying every object into `destination`
    pub async fn apply_replication(
        &self,
        source: &BucketHandle,
        destination: &BucketHandle,
        role: &RoleHandle,
    ) -> Result<()> {
        let config = ReplicationConfig {
            role_arn: role.arn.clone(),
            rules: vec![ReplicationRule {
                id: self.request.replication_rule_id.clone(),
                status: RuleStatus::Enabled,
                prefix: String::new(),
                destination_bucket_arn: destination.arn.clone(),
            }],
        };

        apply_config(
            ResourceKind::Bucket,
            &source.name,
            "replication rules",
            self.clients.buckets.put_replication(source, &config),
        )
        .await
    }

    /// Let the audit trail deliver log files into `bucket`
    pub async fn apply_audit_policy(
        &self,
        bucket: &BucketHandle,
        account: &AccountId,
    ) -> Result<AuditPolicyApplied> {
        let document = policy::audit_delivery_policy(bucket, account);
        apply_config(
            ResourceKind::Bucket,
            &bucket.name,
            "audit bucket policy",
            self.clients.buckets.put_policy(bucket, &document),
        )
        .await?;

        Ok(AuditPolicyApplied {
            bucket: bucket.clone(),
        })
    }

    /// Ensure the trail exists and records object writes on `source`
    pub async fn provision_trail(
        &self,
        audit: &AuditPolicyApplied,
        source: &BucketHandle,
    ) -> Result<Ensured<TrailHandle>> {
        let spec = TrailSpec {
            name: self.request.trail_name.clone(),
            bucket: audit.bucket().name.clone(),
            multi_region: false,
            include_global_service_events: false,
        };
        let ensured = ensure_created(self.clients.trails.as_ref(), &spec).await?;

        let selectors = [EventSelector::object_writes(source)];
        let trail = ensured.handle();
        apply_config(
            ResourceKind::Trail,
            &trail.name,
            "event selectors",
            self.clients.trails.put_event_selectors(trail, &selectors),
        )
        .await?;

        Ok(ensured)
    }

    pub async fn activate_logging(&self, trail: &TrailHandle) -> Result<()> {
        apply_config(
            ResourceKind::Trail,
            &trail.name,
            "logging",
            self.clients.trails.start_logging(trail),
        )
        .await
    }
}

fn planned(stage: Stage, kind: ResourceKind, name: &str, present: bool) -> Action {
    let action_type = if present {
        ActionType::NoOp
    } else {
        ActionType::Create
    };
    Action::new(stage, action_type, kind, name, kind.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert_eq!(Stage::Start.next(), Some(Stage::AccountResolved));
        assert_eq!(Stage::LoggingActive.next(), Some(Stage::Done));
        assert_eq!(Stage::Done.next(), None);
        assert!(Stage::RoleReady < Stage::ReplicationApplied);
        assert!(Stage::AuditPolicyApplied < Stage::TrailReady);
    }

    #[test]
    fn test_stage_display_matches_serde() {
        for stage in Stage::ALL {
            let json = serde_json::to_value(stage).unwrap();
            assert_eq!(json, serde_json::json!(stage.to_string()));
        }
    }

    #[test]
    fn test_request_defaults() {
        let request = ProvisionRequest::new("src", "dst", "role", "trail");
        assert_eq!(request.region, "us-east-1");
        assert_eq!(request.policy_name, DEFAULT_POLICY_NAME);
        assert_eq!(request.replication_rule_id, DEFAULT_REPLICATION_RULE_ID);
        assert_eq!(
            request.with_region("eu-west-3").region,
            "eu-west-3".to_string()
        );
    }
}
