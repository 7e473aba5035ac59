//! IAM and bucket policy documents

use crate::resource::{AccountId, BucketHandle};
use serde_json::{Value, json};

const POLICY_VERSION: &str = "2012-10-17";
const S3_SERVICE: &str = "s3.amazonaws.com";
const CLOUDTRAIL_SERVICE: &str = "cloudtrail.amazonaws.com";

/// Trust policy letting S3 assume the replication role on behalf of `account`
pub fn replication_trust_policy(account: &AccountId) -> Value {
    json!({
        "Version": POLICY_VERSION,
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": { "Service": S3_SERVICE },
                "Action": "sts:AssumeRole",
                "Condition": {
                    "StringEquals": { "aws:SourceAccount": account.as_str() }
                }
            }
        ]
    })
}

/// Permissions needed to replicate objects from `source` into `destination`
pub fn replication_permissions(source: &BucketHandle, destination: &BucketHandle) -> Value {
    json!({
        "Version": POLICY_VERSION,
        "Statement": [
            {
                "Sid": "AllowS3ReplicationSourceActions",
                "Effect": "Allow",
                "Action": [
                    "s3:GetReplicationConfiguration",
                    "s3:ListBucket",
                    "s3:GetObjectVersion",
                    "s3:GetObjectVersionAcl",
                    "s3:GetObjectVersionTagging"
                ],
                "Resource": [source.arn, source.objects_arn()]
            },
            {
                "Sid": "AllowS3ReplicationDestinationActions",
                "Effect": "Allow",
                "Action": [
                    "s3:ReplicateObject",
                    "s3:ReplicateDelete",
                    "s3:ReplicateTags",
                    "s3:GetObjectVersionTagging",
                    "s3:PutObjectAcl"
                ],
                "Resource": [destination.objects_arn()]
            }
        ]
    })
}

/// Bucket policy allowing CloudTrail to check the ACL and deliver log files
/// under `AWSLogs/<account>/`
pub fn audit_delivery_policy(bucket: &BucketHandle, account: &AccountId) -> Value {
    json!({
        "Version": POLICY_VERSION,
        "Statement": [
            {
                "Sid": "AWSCloudTrailAclCheck20150319",
                "Effect": "Allow",
                "Principal": { "Service": CLOUDTRAIL_SERVICE },
                "Action": "s3:GetBucketAcl",
                "Resource": bucket.arn
            },
            {
                "Sid": "AWSCloudTrailWrite20150319",
                "Effect": "Allow",
                "Principal": { "Service": CLOUDTRAIL_SERVICE },
                "Action": "s3:PutObject",
                "Resource": format!("{}/AWSLogs/{}/*", bucket.arn, account),
                "Condition": {
                    "StringEquals": { "s3:x-amz-acl": "bucket-owner-full-control" }
                }
            }
        ]
    })
}
