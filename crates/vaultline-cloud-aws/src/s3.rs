//! S3 bucket client

use crate::error::{Classify, invalid_request};
use async_trait::async_trait;
use aws_sdk_s3::types as s3;
use vaultline_cloud::{
    BucketHandle, BucketService, BucketSpec, CloudError, ReplicationConfig, ReplicationRule,
    ResourceClient, ResourceKind, Result, VersioningStatus, resource::RuleStatus,
};

/// Region where S3 rejects an explicit location constraint
const DEFAULT_S3_REGION: &str = "us-east-1";

pub struct S3Buckets {
    client: aws_sdk_s3::Client,
}

impl S3Buckets {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceClient for S3Buckets {
    type Spec = BucketSpec;
    type Handle = BucketHandle;

    async fn describe(&self, name: &str) -> Result<BucketHandle> {
        self.client
            .head_bucket()
            .bucket(name)
            .send()
            .await
            .classify(ResourceKind::Bucket, name)?;
        Ok(BucketHandle::new(name))
    }

    async fn create(&self, spec: &BucketSpec) -> Result<BucketHandle> {
        let mut request = self.client.create_bucket().bucket(&spec.name);
        if let Some(configuration) = location_constraint(&spec.region) {
            request = request.create_bucket_configuration(configuration);
        }
        request
            .send()
            .await
            .classify(ResourceKind::Bucket, &spec.name)?;

        tracing::info!("Created bucket {} in {}", spec.name, spec.region);
        Ok(BucketHandle::new(&spec.name))
    }
}

#[async_trait]
impl BucketService for S3Buckets {
    async fn put_versioning(&self, bucket: &BucketHandle, status: VersioningStatus) -> Result<()> {
        let status = match status {
            VersioningStatus::Enabled => s3::BucketVersioningStatus::Enabled,
            VersioningStatus::Suspended => s3::BucketVersioningStatus::Suspended,
            VersioningStatus::Unset => {
                return Err(CloudError::InvalidConfig(format!(
                    "versioning of {} cannot be reset once configured",
                    bucket.name
                )));
            }
        };

        self.client
            .put_bucket_versioning()
            .bucket(&bucket.name)
            .versioning_configuration(s3::VersioningConfiguration::builder().status(status).build())
            .send()
            .await
            .classify(ResourceKind::Bucket, &bucket.name)?;
        Ok(())
    }

    async fn put_replication(
        &self,
        source: &BucketHandle,
        config: &ReplicationConfig,
    ) -> Result<()> {
        let configuration = replication_configuration(config)?;

        self.client
            .put_bucket_replication()
            .bucket(&source.name)
            .replication_configuration(configuration)
            .send()
            .await
            .classify(ResourceKind::Bucket, &source.name)?;
        Ok(())
    }

    async fn put_policy(&self, bucket: &BucketHandle, policy: &serde_json::Value) -> Result<()> {
        self.client
            .put_bucket_policy()
            .bucket(&bucket.name)
            .policy(serde_json::to_string(policy)?)
            .send()
            .await
            .classify(ResourceKind::Bucket, &bucket.name)?;
        Ok(())
    }
}

fn location_constraint(region: &str) -> Option<s3::CreateBucketConfiguration> {
    if region == DEFAULT_S3_REGION {
        return None;
    }
    Some(
        s3::CreateBucketConfiguration::builder()
            .location_constraint(s3::BucketLocationConstraint::from(region))
            .build(),
    )
}

fn replication_configuration(config: &ReplicationConfig) -> Result<s3::ReplicationConfiguration> {
    let rules = config
        .rules
        .iter()
        .map(replication_rule)
        .collect::<Result<Vec<_>>>()?;

    s3::ReplicationConfiguration::builder()
        .role(&config.role_arn)
        .set_rules(Some(rules))
        .build()
        .map_err(invalid_request)
}

// The prefix form is the one-rule schema; the filter form requires delete
// marker settings this configuration does not manage.
#[allow(deprecated)]
fn replication_rule(rule: &ReplicationRule) -> Result<s3::ReplicationRule> {
    let destination = s3::Destination::builder()
        .bucket(&rule.destination_bucket_arn)
        .build()
        .map_err(invalid_request)?;
    let status = match rule.status {
        RuleStatus::Enabled => s3::ReplicationRuleStatus::Enabled,
        RuleStatus::Disabled => s3::ReplicationRuleStatus::Disabled,
    };

    s3::ReplicationRule::builder()
        .id(&rule.id)
        .status(status)
        .prefix(&rule.prefix)
        .destination(destination)
        .build()
        .map_err(invalid_request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_location_constraint_in_us_east_1() {
        assert!(location_constraint("us-east-1").is_none());

        let configuration = location_constraint("eu-west-3").unwrap();
        assert_eq!(
            configuration.location_constraint(),
            Some(&s3::BucketLocationConstraint::EuWest3)
        );
    }

    #[test]
    fn test_replication_configuration_conversion() {
        let config = ReplicationConfig {
            role_arn: "arn:aws:iam::123456789012:role/replicator".to_string(),
            rules: vec![ReplicationRule {
                id: "ReplicateAll".to_string(),
                status: RuleStatus::Enabled,
                prefix: String::new(),
                destination_bucket_arn: "arn:aws:s3:::media-backup".to_string(),
            }],
        };

        let converted = replication_configuration(&config).unwrap();
        assert_eq!(converted.role(), "arn:aws:iam::123456789012:role/replicator");
        assert_eq!(converted.rules().len(), 1);

        let rule = &converted.rules()[0];
        assert_eq!(rule.id(), Some("ReplicateAll"));
        assert_eq!(rule.status(), &s3::ReplicationRuleStatus::Enabled);
        assert_eq!(
            rule.destination().map(|d| d.bucket()),
            Some("arn:aws:s3:::media-backup")
        );
    }
}
