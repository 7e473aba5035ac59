//! CloudTrail client

use crate::error::Classify;
use async_trait::async_trait;
use aws_sdk_cloudtrail::types as ct;
use vaultline_cloud::ensure::require;
use vaultline_cloud::resource::ReadWriteType;
use vaultline_cloud::{
    EventSelector, ResourceClient, ResourceKind, Result, TrailHandle, TrailService, TrailSpec,
};

pub struct CloudTrails {
    client: aws_sdk_cloudtrail::Client,
}

impl CloudTrails {
    pub fn new(client: aws_sdk_cloudtrail::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceClient for CloudTrails {
    type Spec = TrailSpec;
    type Handle = TrailHandle;

    async fn describe(&self, name: &str) -> Result<TrailHandle> {
        let output = self
            .client
            .get_trail()
            .name(name)
            .send()
            .await
            .classify(ResourceKind::Trail, name)?;

        let trail = require(output.trail(), ResourceKind::Trail, name, "Trail")?;
        let arn = require(trail.trail_arn(), ResourceKind::Trail, name, "TrailARN")?;
        Ok(TrailHandle {
            name: name.to_string(),
            arn: arn.to_string(),
        })
    }

    async fn create(&self, spec: &TrailSpec) -> Result<TrailHandle> {
        let output = self
            .client
            .create_trail()
            .name(&spec.name)
            .s3_bucket_name(&spec.bucket)
            .is_multi_region_trail(spec.multi_region)
            .include_global_service_events(spec.include_global_service_events)
            .send()
            .await
            .classify(ResourceKind::Trail, &spec.name)?;

        let arn = require(output.trail_arn(), ResourceKind::Trail, &spec.name, "TrailARN")?;
        tracing::info!("Created trail {} delivering to {}", spec.name, spec.bucket);
        Ok(TrailHandle {
            name: spec.name.clone(),
            arn: arn.to_string(),
        })
    }
}

#[async_trait]
impl TrailService for CloudTrails {
    async fn put_event_selectors(
        &self,
        trail: &TrailHandle,
        selectors: &[EventSelector],
    ) -> Result<()> {
        self.client
            .put_event_selectors()
            .trail_name(&trail.arn)
            .set_event_selectors(Some(selectors.iter().map(event_selector).collect()))
            .send()
            .await
            .classify(ResourceKind::Trail, &trail.name)?;
        Ok(())
    }

    async fn start_logging(&self, trail: &TrailHandle) -> Result<()> {
        self.client
            .start_logging()
            .name(&trail.arn)
            .send()
            .await
            .classify(ResourceKind::Trail, &trail.name)?;
        Ok(())
    }
}

fn event_selector(selector: &EventSelector) -> ct::EventSelector {
    let read_write_type = match selector.read_write_type {
        ReadWriteType::ReadOnly => ct::ReadWriteType::ReadOnly,
        ReadWriteType::WriteOnly => ct::ReadWriteType::WriteOnly,
        ReadWriteType::All => ct::ReadWriteType::All,
    };
    let data_resources = selector
        .data_resources
        .iter()
        .map(|resource| {
            ct::DataResource::builder()
                .r#type(&resource.resource_type)
                .set_values(Some(resource.values.clone()))
                .build()
        })
        .collect();

    ct::EventSelector::builder()
        .read_write_type(read_write_type)
        .include_management_events(selector.include_management_events)
        .set_data_resources(Some(data_resources))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultline_cloud::BucketHandle;

    #[test]
    fn test_event_selector_conversion() {
        let selector = EventSelector::object_writes(&BucketHandle::new("media-primary"));

        let converted = event_selector(&selector);
        assert_eq!(converted.read_write_type(), Some(&ct::ReadWriteType::WriteOnly));
        assert_eq!(converted.include_management_events(), Some(false));

        let resources = converted.data_resources();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].r#type(), Some("AWS::S3::Object"));
        assert_eq!(resources[0].values(), &["arn:aws:s3:::media-primary/".to_string()]);
    }
}
