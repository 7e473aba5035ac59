//! IAM role client

use crate::error::Classify;
use async_trait::async_trait;
use vaultline_cloud::ensure::require;
use vaultline_cloud::{
    InlinePolicy, ResourceClient, ResourceKind, Result, RoleHandle, RoleService, RoleSpec,
};

pub struct IamRoles {
    client: aws_sdk_iam::Client,
}

impl IamRoles {
    pub fn new(client: aws_sdk_iam::Client) -> Self {
        Self { client }
    }
}

fn handle(role: &aws_sdk_iam::types::Role) -> RoleHandle {
    RoleHandle {
        name: role.role_name().to_string(),
        arn: role.arn().to_string(),
    }
}

#[async_trait]
impl ResourceClient for IamRoles {
    type Spec = RoleSpec;
    type Handle = RoleHandle;

    async fn describe(&self, name: &str) -> Result<RoleHandle> {
        let output = self
            .client
            .get_role()
            .role_name(name)
            .send()
            .await
            .classify(ResourceKind::Role, name)?;

        let role = require(output.role(), ResourceKind::Role, name, "Role")?;
        Ok(handle(role))
    }

    async fn create(&self, spec: &RoleSpec) -> Result<RoleHandle> {
        let output = self
            .client
            .create_role()
            .role_name(&spec.name)
            .assume_role_policy_document(serde_json::to_string(&spec.trust_policy)?)
            .description(&spec.description)
            .send()
            .await
            .classify(ResourceKind::Role, &spec.name)?;

        let role = require(output.role(), ResourceKind::Role, &spec.name, "Role")?;
        tracing::info!("Created role {} ({})", role.role_name(), role.arn());
        Ok(handle(role))
    }
}

#[async_trait]
impl RoleService for IamRoles {
    async fn put_inline_policy(&self, role: &RoleHandle, policy: &InlinePolicy) -> Result<()> {
        self.client
            .put_role_policy()
            .role_name(&role.name)
            .policy_name(&policy.name)
            .policy_document(serde_json::to_string(&policy.document)?)
            .send()
            .await
            .classify(ResourceKind::Role, &role.name)?;
        Ok(())
    }
}
