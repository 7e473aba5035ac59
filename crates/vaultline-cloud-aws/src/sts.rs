use crate::error::Classify;
use async_trait::async_trait;
use vaultline_cloud::ensure::require;
use vaultline_cloud::{AccountId, AccountService, ResourceKind, Result};

/// Caller identity lookup
pub struct StsAccount {
    client: aws_sdk_sts::Client,
}

impl StsAccount {
    pub fn new(client: aws_sdk_sts::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AccountService for StsAccount {
    async fn resolve_account(&self) -> Result<AccountId> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .classify(ResourceKind::Account, "caller")?;

        let account = require(output.account(), ResourceKind::Account, "caller", "Account")?;
        tracing::debug!("Caller identity: {}", output.arn().unwrap_or("-"));
        Ok(AccountId::new(account))
    }
}
