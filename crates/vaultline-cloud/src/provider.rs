//! Cloud client trait definitions
//!
//! Every resource kind the pipeline touches is reached through one of these
//! traits, so the orchestrator can run against AWS or an in-memory fake.

use crate::error::Result;
use crate::resource::{
    AccountId, BucketHandle, BucketSpec, EventSelector, InlinePolicy, ReplicationConfig,
    ResourceSpec, RoleHandle, RoleSpec, TrailHandle, TrailSpec, VersioningStatus,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Lookup and creation of one resource kind
///
/// Implementations must report a missing resource from `describe` as
/// [`crate::CloudError::ResourceNotFound`] and a conflicting `create` as
/// [`crate::CloudError::ResourceAlreadyExists`].
#[async_trait]
pub trait ResourceClient: Send + Sync {
    type Spec: ResourceSpec + Send + Sync;
    type Handle: Send;

    /// Fetch the handle of an existing resource
    async fn describe(&self, name: &str) -> Result<Self::Handle>;

    /// Create the resource described by `spec`
    async fn create(&self, spec: &Self::Spec) -> Result<Self::Handle>;
}

/// Resolves the identity the client is acting as
#[async_trait]
pub trait AccountService: Send + Sync {
    async fn resolve_account(&self) -> Result<AccountId>;
}

#[async_trait]
pub trait BucketService: ResourceClient<Spec = BucketSpec, Handle = BucketHandle> {
    async fn put_versioning(&self, bucket: &BucketHandle, status: VersioningStatus) -> Result<()>;

    /// Replace the replication configuration of `source` wholesale
    async fn put_replication(&self, source: &BucketHandle, config: &ReplicationConfig)
    -> Result<()>;

    async fn put_policy(&self, bucket: &BucketHandle, policy: &serde_json::Value) -> Result<()>;
}

#[async_trait]
pub trait RoleService: ResourceClient<Spec = RoleSpec, Handle = RoleHandle> {
    /// Attach `policy`, replacing any inline policy with the same name
    async fn put_inline_policy(&self, role: &RoleHandle, policy: &InlinePolicy) -> Result<()>;
}

#[async_trait]
pub trait TrailService: ResourceClient<Spec = TrailSpec, Handle = TrailHandle> {
    async fn put_event_selectors(&self, trail: &TrailHandle, selectors: &[EventSelector])
    -> Result<()>;

    async fn start_logging(&self, trail: &TrailHandle) -> Result<()>;
}

/// The set of clients a provisioning run needs
#[derive(Clone)]
pub struct CloudClients {
    /// Provider name used in logs (e.g. "aws")
    pub provider: String,
    pub account: Arc<dyn AccountService>,
    pub buckets: Arc<dyn BucketService>,
    pub roles: Arc<dyn RoleService>,
    pub trails: Arc<dyn TrailService>,
}

impl std::fmt::Debug for CloudClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudClients")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

/// Retry configuration handed to the remote client.
///
/// The pipeline never retries on its own; transient failures are the
/// client's concern.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts per call, including the first
    pub max_attempts: u32,

    /// Initial delay between retries
    pub initial_delay: std::time::Duration,

    /// Maximum delay between retries
    pub max_delay: std::time::Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: std::time::Duration::from_secs(1),
            max_delay: std::time::Duration::from_secs(30),
        }
    }
}
