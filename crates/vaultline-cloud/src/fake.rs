//! In-memory cloud backend
//!
//! Keeps buckets, roles and trails in memory, records every call in order
//! and can be told to fail the next call of a given operation. Used to test
//! the pipeline without touching a real account.
//!
//! ```
//! use vaultline_cloud::fake::{FakeCloud, Operation};
//! use vaultline_cloud::{Orchestrator, ProvisionRequest};
//!
//! # tokio_test::block_on(async {
//! let cloud = FakeCloud::new("123456789012");
//! let request = ProvisionRequest::new("media", "media-backup", "replicator", "audit");
//! let report = Orchestrator::new(cloud.clients(), request).run().await.unwrap();
//!
//! assert!(report.is_complete());
//! assert_eq!(cloud.count(Operation::CreateBucket), 2);
//! # });
//! ```

use crate::error::{CloudError, Result};
use crate::provider::{
    AccountService, BucketService, CloudClients, ResourceClient, RoleService, TrailService,
};
use crate::resource::{
    AccountId, BucketHandle, BucketSpec, EventSelector, InlinePolicy, ReplicationConfig,
    ResourceKind, RoleHandle, RoleSpec, TrailHandle, TrailSpec, VersioningStatus,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Remote operations the fake understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ResolveAccount,
    DescribeBucket,
    CreateBucket,
    PutVersioning,
    PutReplication,
    PutBucketPolicy,
    DescribeRole,
    CreateRole,
    PutRolePolicy,
    DescribeTrail,
    CreateTrail,
    PutEventSelectors,
    StartLogging,
}

impl Operation {
    /// Whether the operation creates a resource
    pub fn is_create(self) -> bool {
        matches!(
            self,
            Operation::CreateBucket | Operation::CreateRole | Operation::CreateTrail
        )
    }
}

/// Failure injected into the next call of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    AccessDenied,
    NotFound,
    AlreadyExists,
    /// Another actor creates the resource just before the call, which then
    /// fails as a duplicate
    Race,
    Throttled,
}

/// A recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    /// Resource name the call targeted
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FakeBucket {
    pub versioning: Option<VersioningStatus>,
    pub replication: Option<ReplicationConfig>,
    pub policy: Option<serde_json::Value>,
}

impl FakeBucket {
    pub fn versioning_status(&self) -> VersioningStatus {
        self.versioning.unwrap_or(VersioningStatus::Unset)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeRole {
    pub arn: String,
    pub trust_policy: Option<serde_json::Value>,
    pub inline_policies: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeTrail {
    pub arn: String,
    pub bucket: String,
    pub event_selectors: Vec<EventSelector>,
    pub logging: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    account: String,
    buckets: BTreeMap<String, FakeBucket>,
    roles: BTreeMap<String, FakeRole>,
    trails: BTreeMap<String, FakeTrail>,
    calls: Vec<Call>,
    faults: Vec<(Operation, VecDeque<Fault>)>,
}

/// Snapshot of the remote state, for comparing runs
#[derive(Debug, Clone, PartialEq)]
pub struct FakeSnapshot {
    pub buckets: BTreeMap<String, FakeBucket>,
    pub roles: BTreeMap<String, FakeRole>,
    pub trails: BTreeMap<String, FakeTrail>,
}

/// Shared in-memory backend; clones share state
#[derive(Debug, Clone, Default)]
pub struct FakeCloud {
    state: Arc<Mutex<FakeState>>,
}

impl FakeCloud {
    pub fn new(account: impl Into<String>) -> Self {
        let state = FakeState {
            account: account.into(),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Clients backed by this fake
    pub fn clients(&self) -> CloudClients {
        CloudClients {
            provider: "fake".to_string(),
            account: Arc::new(FakeAccount(self.clone())),
            buckets: Arc::new(FakeBuckets(self.clone())),
            roles: Arc::new(FakeRoles(self.clone())),
            trails: Arc::new(FakeTrails(self.clone())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next call of `operation` fail with `fault`
    pub fn fail_next(&self, operation: Operation, fault: Fault) {
        let mut state = self.lock();
        match state.faults.iter_mut().find(|(op, _)| *op == operation) {
            Some((_, queue)) => queue.push_back(fault),
            None => state.faults.push((operation, VecDeque::from([fault]))),
        }
    }

    pub fn seed_bucket(&self, name: &str) {
        self.lock()
            .buckets
            .insert(name.to_string(), FakeBucket::default());
    }

    pub fn seed_role(&self, name: &str) {
        let mut state = self.lock();
        let arn = role_arn(&state.account, name);
        state.roles.insert(
            name.to_string(),
            FakeRole {
                arn,
                trust_policy: None,
                inline_policies: BTreeMap::new(),
            },
        );
    }

    pub fn seed_trail(&self, name: &str, bucket: &str) {
        let mut state = self.lock();
        let arn = trail_arn(&state.account, name);
        state.trails.insert(
            name.to_string(),
            FakeTrail {
                arn,
                bucket: bucket.to_string(),
                event_selectors: Vec::new(),
                logging: false,
            },
        );
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Position of the first call of `operation`, if any
    pub fn first_index(&self, operation: Operation) -> Option<usize> {
        self.lock()
            .calls
            .iter()
            .position(|c| c.operation == operation)
    }

    /// Position of the last call of `operation`, if any
    pub fn last_index(&self, operation: Operation) -> Option<usize> {
        self.lock()
            .calls
            .iter()
            .rposition(|c| c.operation == operation)
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn bucket(&self, name: &str) -> Option<FakeBucket> {
        self.lock().buckets.get(name).cloned()
    }

    pub fn role(&self, name: &str) -> Option<FakeRole> {
        self.lock().roles.get(name).cloned()
    }

    pub fn trail(&self, name: &str) -> Option<FakeTrail> {
        self.lock().trails.get(name).cloned()
    }

    pub fn snapshot(&self) -> FakeSnapshot {
        let state = self.lock();
        FakeSnapshot {
            buckets: state.buckets.clone(),
            roles: state.roles.clone(),
            trails: state.trails.clone(),
        }
    }

    /// Record the call and return the injected fault for it, if any
    fn enter(&self, operation: Operation, kind: ResourceKind, target: &str) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(Call {
            operation,
            target: target.to_string(),
        });

        let fault = state
            .faults
            .iter_mut()
            .find(|(op, _)| *op == operation)
            .and_then(|(_, queue)| queue.pop_front());

        match fault {
            None => Ok(()),
            Some(Fault::AccessDenied) => Err(CloudError::access_denied(
                kind,
                target,
                format!("not authorized to perform {:?}", operation),
            )),
            Some(Fault::NotFound) => Err(CloudError::not_found(kind, target)),
            Some(Fault::AlreadyExists) => Err(CloudError::already_exists(kind, target)),
            Some(Fault::Throttled) => Err(CloudError::api(
                kind,
                target,
                "Throttling",
                "rate exceeded",
            )),
            Some(Fault::Race) => {
                let account = state.account.clone();
                match kind {
                    ResourceKind::Bucket => {
                        state
                            .buckets
                            .entry(target.to_string())
                            .or_default();
                    }
                    ResourceKind::Role => {
                        state
                            .roles
                            .entry(target.to_string())
                            .or_insert_with(|| FakeRole {
                                arn: role_arn(&account, target),
                                trust_policy: None,
                                inline_policies: BTreeMap::new(),
                            });
                    }
                    ResourceKind::Trail => {
                        state
                            .trails
                            .entry(target.to_string())
                            .or_insert_with(|| FakeTrail {
                                arn: trail_arn(&account, target),
                                bucket: String::new(),
                                event_selectors: Vec::new(),
                                logging: false,
                            });
                    }
                    ResourceKind::Account => {}
                }
                Err(CloudError::already_exists(kind, target))
            }
        }
    }
}

fn role_arn(account: &str, name: &str) -> String {
    format!("arn:aws:iam::{}:role/{}", account, name)
}

fn trail_arn(account: &str, name: &str) -> String {
    format!("arn:aws:cloudtrail:us-east-1:{}:trail/{}", account, name)
}

struct FakeAccount(FakeCloud);

#[async_trait]
impl AccountService for FakeAccount {
    async fn resolve_account(&self) -> Result<AccountId> {
        self.0
            .enter(Operation::ResolveAccount, ResourceKind::Account, "caller")?;
        Ok(AccountId::new(self.0.lock().account.clone()))
    }
}

struct FakeBuckets(FakeCloud);

impl FakeBuckets {
    fn update(&self, name: &str, apply: impl FnOnce(&mut FakeBucket)) -> Result<()> {
        let mut state = self.0.lock();
        let bucket = state
            .buckets
            .get_mut(name)
            .ok_or_else(|| CloudError::not_found(ResourceKind::Bucket, name))?;
        apply(bucket);
        Ok(())
    }
}

#[async_trait]
impl ResourceClient for FakeBuckets {
    type Spec = BucketSpec;
    type Handle = BucketHandle;

    async fn describe(&self, name: &str) -> Result<BucketHandle> {
        self.0
            .enter(Operation::DescribeBucket, ResourceKind::Bucket, name)?;
        if self.0.lock().buckets.contains_key(name) {
            Ok(BucketHandle::new(name))
        } else {
            Err(CloudError::not_found(ResourceKind::Bucket, name))
        }
    }

    async fn create(&self, spec: &BucketSpec) -> Result<BucketHandle> {
        self.0
            .enter(Operation::CreateBucket, ResourceKind::Bucket, &spec.name)?;
        let mut state = self.0.lock();
        if state.buckets.contains_key(&spec.name) {
            return Err(CloudError::already_exists(ResourceKind::Bucket, &spec.name));
        }
        state
            .buckets
            .insert(spec.name.clone(), FakeBucket::default());
        Ok(BucketHandle::new(&spec.name))
    }
}

#[async_trait]
impl BucketService for FakeBuckets {
    async fn put_versioning(&self, bucket: &BucketHandle, status: VersioningStatus) -> Result<()> {
        self.0
            .enter(Operation::PutVersioning, ResourceKind::Bucket, &bucket.name)?;
        self.update(&bucket.name, |b| b.versioning = Some(status))
    }

    async fn put_replication(
        &self,
        source: &BucketHandle,
        config: &ReplicationConfig,
    ) -> Result<()> {
        self.0
            .enter(Operation::PutReplication, ResourceKind::Bucket, &source.name)?;
        self.update(&source.name, |b| b.replication = Some(config.clone()))
    }

    async fn put_policy(&self, bucket: &BucketHandle, policy: &serde_json::Value) -> Result<()> {
        self.0
            .enter(Operation::PutBucketPolicy, ResourceKind::Bucket, &bucket.name)?;
        self.update(&bucket.name, |b| b.policy = Some(policy.clone()))
    }
}

struct FakeRoles(FakeCloud);

#[async_trait]
impl ResourceClient for FakeRoles {
    type Spec = RoleSpec;
    type Handle = RoleHandle;

    async fn describe(&self, name: &str) -> Result<RoleHandle> {
        self.0
            .enter(Operation::DescribeRole, ResourceKind::Role, name)?;
        let state = self.0.lock();
        let role = state
            .roles
            .get(name)
            .ok_or_else(|| CloudError::not_found(ResourceKind::Role, name))?;
        Ok(RoleHandle {
            name: name.to_string(),
            arn: role.arn.clone(),
        })
    }

    async fn create(&self, spec: &RoleSpec) -> Result<RoleHandle> {
        self.0
            .enter(Operation::CreateRole, ResourceKind::Role, &spec.name)?;
        let mut state = self.0.lock();
        if state.roles.contains_key(&spec.name) {
            return Err(CloudError::already_exists(ResourceKind::Role, &spec.name));
        }
        let arn = role_arn(&state.account, &spec.name);
        state.roles.insert(
            spec.name.clone(),
            FakeRole {
                arn: arn.clone(),
                trust_policy: Some(spec.trust_policy.clone()),
                inline_policies: BTreeMap::new(),
            },
        );
        Ok(RoleHandle {
            name: spec.name.clone(),
            arn,
        })
    }
}

#[async_trait]
impl RoleService for FakeRoles {
    async fn put_inline_policy(&self, role: &RoleHandle, policy: &InlinePolicy) -> Result<()> {
        self.0
            .enter(Operation::PutRolePolicy, ResourceKind::Role, &role.name)?;
        let mut state = self.0.lock();
        let stored = state
            .roles
            .get_mut(&role.name)
            .ok_or_else(|| CloudError::not_found(ResourceKind::Role, &role.name))?;
        stored
            .inline_policies
            .insert(policy.name.clone(), policy.document.clone());
        Ok(())
    }
}

struct FakeTrails(FakeCloud);

impl FakeTrails {
    fn update(&self, name: &str, apply: impl FnOnce(&mut FakeTrail)) -> Result<()> {
        let mut state = self.0.lock();
        let trail = state
            .trails
            .get_mut(name)
            .ok_or_else(|| CloudError::not_found(ResourceKind::Trail, name))?;
        apply(trail);
        Ok(())
    }
}

#[async_trait]
impl ResourceClient for FakeTrails {
    type Spec = TrailSpec;
    type Handle = TrailHandle;

    async fn describe(&self, name: &str) -> Result<TrailHandle> {
        self.0
            .enter(Operation::DescribeTrail, ResourceKind::Trail, name)?;
        let state = self.0.lock();
        let trail = state
            .trails
            .get(name)
            .ok_or_else(|| CloudError::not_found(ResourceKind::Trail, name))?;
        Ok(TrailHandle {
            name: name.to_string(),
            arn: trail.arn.clone(),
        })
    }

    async fn create(&self, spec: &TrailSpec) -> Result<TrailHandle> {
        self.0
            .enter(Operation::CreateTrail, ResourceKind::Trail, &spec.name)?;
        let mut state = self.0.lock();
        if state.trails.contains_key(&spec.name) {
            return Err(CloudError::already_exists(ResourceKind::Trail, &spec.name));
        }
        if !state.buckets.contains_key(&spec.bucket) {
            return Err(CloudError::api(
                ResourceKind::Trail,
                &spec.name,
                "S3BucketDoesNotExistException",
                format!("bucket {} does not exist", spec.bucket),
            ));
        }
        let arn = trail_arn(&state.account, &spec.name);
        state.trails.insert(
            spec.name.clone(),
            FakeTrail {
                arn: arn.clone(),
                bucket: spec.bucket.clone(),
                event_selectors: Vec::new(),
                logging: false,
            },
        );
        Ok(TrailHandle {
            name: spec.name.clone(),
            arn,
        })
    }
}

#[async_trait]
impl TrailService for FakeTrails {
    async fn put_event_selectors(
        &self,
        trail: &TrailHandle,
        selectors: &[EventSelector],
    ) -> Result<()> {
        self.0
            .enter(Operation::PutEventSelectors, ResourceKind::Trail, &trail.name)?;
        self.update(&trail.name, |t| t.event_selectors = selectors.to_vec())
    }

    async fn start_logging(&self, trail: &TrailHandle) -> Result<()> {
        self.0
            .enter(Operation::StartLogging, ResourceKind::Trail, &trail.name)?;
        self.update(&trail.name, |t| t.logging = true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_faults_apply_once_in_order() {
        let cloud = FakeCloud::new("123456789012");
        cloud.fail_next(Operation::DescribeBucket, Fault::Throttled);
        cloud.fail_next(Operation::DescribeBucket, Fault::AccessDenied);
        let buckets = cloud.clients().buckets;

        let first = buckets.describe("a").await.unwrap_err();
        assert!(matches!(first, CloudError::ApiError { .. }));
        let second = buckets.describe("a").await.unwrap_err();
        assert!(matches!(second, CloudError::AccessDenied { .. }));
        let third = buckets.describe("a").await.unwrap_err();
        assert!(third.is_absent());
        assert_eq!(cloud.count(Operation::DescribeBucket), 3);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let cloud = FakeCloud::new("123456789012");
        cloud.seed_bucket("taken");

        let err = cloud
            .clients()
            .buckets
            .create(&BucketSpec::new("taken", "us-east-1"))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
    }

    #[tokio::test]
    async fn test_race_creates_resource_behind_the_scenes() {
        let cloud = FakeCloud::new("123456789012");
        cloud.fail_next(Operation::CreateTrail, Fault::Race);
        let trails = cloud.clients().trails;

        let spec = TrailSpec {
            name: "audit".to_string(),
            bucket: "logs".to_string(),
            multi_region: false,
            include_global_service_events: false,
        };
        assert!(trails.create(&spec).await.unwrap_err().is_duplicate());
        assert!(trails.describe("audit").await.is_ok());
    }

    #[test]
    fn test_create_operations() {
        assert!(Operation::CreateRole.is_create());
        assert!(!Operation::PutRolePolicy.is_create());
    }
}
