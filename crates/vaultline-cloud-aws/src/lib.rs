//! AWS provider for Vaultline
//!
//! This crate implements the vaultline-cloud client traits on top of the AWS
//! SDK: STS for the caller identity, S3 for buckets, IAM for the replication
//! role and CloudTrail for the audit trail.
//!
//! # Requirements
//!
//! - Credentials resolvable by the default AWS chain (env vars, profile, SSO,
//!   instance metadata)
//!
//! # Example
//!
//! ```ignore
//! use vaultline_cloud::{Orchestrator, ProvisionRequest};
//! use vaultline_cloud_aws::{AwsSettings, connect};
//!
//! let clients = connect(&AwsSettings::new("eu-west-3")).await;
//! let request = ProvisionRequest::new("media-primary", "media-backup", "media-replication", "media-audit")
//!     .with_region("eu-west-3");
//! let report = Orchestrator::new(clients, request).run().await?;
//! ```

mod error;

pub mod cloudtrail;
pub mod iam;
pub mod s3;
pub mod sts;

pub use cloudtrail::CloudTrails;
pub use iam::IamRoles;
pub use s3::S3Buckets;
pub use sts::StsAccount;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::sync::Arc;
use vaultline_cloud::{CloudClients, RetryConfig};

/// Connection settings for the AWS clients
#[derive(Debug, Clone)]
pub struct AwsSettings {
    pub region: String,
    pub retry: RetryConfig,
}

impl AwsSettings {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

fn sdk_retry_config(retry: &RetryConfig) -> aws_config::retry::RetryConfig {
    aws_config::retry::RetryConfig::standard()
        .with_max_attempts(retry.max_attempts.max(1))
        .with_initial_backoff(retry.initial_delay)
        .with_max_backoff(retry.max_delay)
}

/// Load the shared SDK configuration and build every client
pub async fn connect(settings: &AwsSettings) -> CloudClients {
    tracing::debug!(
        "Loading AWS configuration for {} (max attempts: {})",
        settings.region,
        settings.retry.max_attempts
    );

    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(settings.region.clone()))
        .retry_config(sdk_retry_config(&settings.retry))
        .load()
        .await;

    clients_from_config(&config)
}

/// Build the clients from an already loaded SDK configuration
pub fn clients_from_config(config: &SdkConfig) -> CloudClients {
    CloudClients {
        provider: "aws".to_string(),
        account: Arc::new(StsAccount::new(aws_sdk_sts::Client::new(config))),
        buckets: Arc::new(S3Buckets::new(aws_sdk_s3::Client::new(config))),
        roles: Arc::new(IamRoles::new(aws_sdk_iam::Client::new(config))),
        trails: Arc::new(CloudTrails::new(aws_sdk_cloudtrail::Client::new(config))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_retry_settings_are_passed_to_the_sdk() {
        let retry = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
        };

        let sdk = sdk_retry_config(&retry);
        assert_eq!(sdk.max_attempts(), 5);
        assert_eq!(sdk.initial_backoff(), Duration::from_millis(200));
        assert_eq!(sdk.max_backoff(), Duration::from_secs(10));
    }

    #[test]
    fn test_zero_attempts_still_calls_once() {
        let retry = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        };
        assert_eq!(sdk_retry_config(&retry).max_attempts(), 1);
    }

    #[test]
    fn test_clients_from_config() {
        let config = SdkConfig::builder()
            .region(Region::new("eu-west-3"))
            .behavior_version(BehaviorVersion::latest())
            .build();

        let clients = clients_from_config(&config);
        assert_eq!(clients.provider, "aws");
    }
}
