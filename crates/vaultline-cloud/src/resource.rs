//! Resource specs, handles and desired configuration
//!
//! A *spec* describes what to create, a *handle* is what the pipeline keeps
//! once a resource is known to exist (name and ARN), and the remaining types
//! are the desired states pushed by overwrite-style calls.

use serde::{Deserialize, Serialize};

/// Kind of remote resource a call operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Account,
    Bucket,
    Role,
    Trail,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Account => write!(f, "account"),
            ResourceKind::Bucket => write!(f, "bucket"),
            ResourceKind::Role => write!(f, "role"),
            ResourceKind::Trail => write!(f, "trail"),
        }
    }
}

/// Spec of a resource that can be created through a [`crate::ResourceClient`]
pub trait ResourceSpec {
    const KIND: ResourceKind;

    /// Name used to look the resource up
    fn name(&self) -> &str;
}

/// Identity of the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// ARN of a bucket. S3 never returns one, it is derived from the name.
pub fn bucket_arn(name: &str) -> String {
    format!("arn:aws:s3:::{}", name)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSpec {
    pub name: String,

    /// Region the bucket is created in
    pub region: String,
}

impl BucketSpec {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
        }
    }
}

impl ResourceSpec for BucketSpec {
    const KIND: ResourceKind = ResourceKind::Bucket;

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketHandle {
    pub name: String,
    pub arn: String,
}

impl BucketHandle {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            arn: bucket_arn(&name),
            name,
        }
    }

    /// ARN pattern matching every object in the bucket
    pub fn objects_arn(&self) -> String {
        format!("{}/*", self.arn)
    }
}

/// Versioning state of a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersioningStatus {
    Enabled,
    Suspended,
    /// Versioning was never configured
    Unset,
}

impl std::fmt::Display for VersioningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersioningStatus::Enabled => write!(f, "Enabled"),
            VersioningStatus::Suspended => write!(f, "Suspended"),
            VersioningStatus::Unset => write!(f, "Unset"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub name: String,

    /// Document stating who may assume the role
    pub trust_policy: serde_json::Value,

    pub description: String,
}

impl ResourceSpec for RoleSpec {
    const KIND: ResourceKind = ResourceKind::Role;

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleHandle {
    pub name: String,
    pub arn: String,
}

/// Permission document embedded in a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlinePolicy {
    pub name: String,
    pub document: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleStatus {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationRule {
    pub id: String,
    pub status: RuleStatus,

    /// Key prefix the rule applies to; empty means every object
    pub prefix: String,

    pub destination_bucket_arn: String,
}

/// Full replication configuration of a source bucket.
///
/// Applying it replaces whatever configuration the bucket had before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    pub role_arn: String,
    pub rules: Vec<ReplicationRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailSpec {
    pub name: String,

    /// Bucket the trail delivers its log files to
    pub bucket: String,

    pub multi_region: bool,
    pub include_global_service_events: bool,
}

impl ResourceSpec for TrailSpec {
    const KIND: ResourceKind = ResourceKind::Trail;

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailHandle {
    pub name: String,
    pub arn: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadWriteType {
    ReadOnly,
    WriteOnly,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataResource {
    /// e.g. `AWS::S3::Object`
    pub resource_type: String,
    pub values: Vec<String>,
}

/// Scope filter of an audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSelector {
    pub read_write_type: ReadWriteType,
    pub include_management_events: bool,
    pub data_resources: Vec<DataResource>,
}

impl EventSelector {
    /// Record object writes (put/delete) on one bucket, nothing else
    pub fn object_writes(bucket: &BucketHandle) -> Self {
        Self {
            read_write_type: ReadWriteType::WriteOnly,
            include_management_events: false,
            data_resources: vec![DataResource {
                resource_type: "AWS::S3::Object".to_string(),
                values: vec![format!("{}/", bucket.arn)],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_handle_arns() {
        let bucket = BucketHandle::new("media-primary");
        assert_eq!(bucket.arn, "arn:aws:s3:::media-primary");
        assert_eq!(bucket.objects_arn(), "arn:aws:s3:::media-primary/*");
    }

    #[test]
    fn test_object_write_selector() {
        let selector = EventSelector::object_writes(&BucketHandle::new("media-primary"));
        assert_eq!(selector.read_write_type, ReadWriteType::WriteOnly);
        assert!(!selector.include_management_events);
        assert_eq!(
            selector.data_resources[0].values,
            vec!["arn:aws:s3:::media-primary/".to_string()]
        );
    }

    #[test]
    fn test_spec_kinds() {
        assert_eq!(BucketSpec::KIND, ResourceKind::Bucket);
        assert_eq!(RoleSpec::KIND, ResourceKind::Role);
        assert_eq!(TrailSpec::KIND, ResourceKind::Trail);
        assert_eq!(BucketSpec::new("a", "us-east-1").name(), "a");
    }
}
