//! Vaultline Cloud Provisioning
//!
//! This crate provides the provider-neutral core of Vaultline: it brings a
//! replicated, audited bucket pair into existence and can be re-run safely
//! after a partial failure.
//!
//! # Provisioned resources
//!
//! - **Buckets**: source and destination, both with versioning enabled
//! - **Role**: assumed by S3 to replicate, with an inline permission policy
//! - **Replication**: one rule copying every source object to the destination
//! - **Audit trail**: records object writes on the source, delivered to the
//!   destination bucket
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  Vaultline CLI                   │
//! │             (vaultline apply/plan)               │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                vaultline-cloud                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │              Orchestrator                 │   │
//! │  │   ensure_created / apply_config / probe   │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Client traits│  │  Fake cloud  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │      aws      │
//! │   provider    │
//! └───────────────┘
//! ```
//!
//! # Error classification
//!
//! Providers tag every failure with an [`ErrorClass`]. Absence triggers
//! creation, a duplicate triggers reuse, anything else halts the run with a
//! [`ProvisionError`] naming the failed step.

pub mod action;
pub mod ensure;
pub mod error;
pub mod fake;
pub mod orchestrator;
pub mod policy;
pub mod provider;
pub mod resource;

// Re-exports
pub use action::{Action, ActionSummary, ActionType, Plan, RunReport, RunSummary};
pub use ensure::{Ensured, apply_config, ensure_created, exists, probe};
pub use error::{CloudError, ErrorClass, ProvisionError, Result};
pub use orchestrator::{AuditPolicyApplied, Orchestrator, ProvisionRequest, Stage};
pub use provider::{
    AccountService, BucketService, CloudClients, ResourceClient, RetryConfig, RoleService,
    TrailService,
};
pub use resource::{
    AccountId, BucketHandle, BucketSpec, EventSelector, InlinePolicy, ReplicationConfig,
    ReplicationRule, ResourceKind, ResourceSpec, RoleHandle, RoleSpec, TrailHandle, TrailSpec,
    VersioningStatus,
};
