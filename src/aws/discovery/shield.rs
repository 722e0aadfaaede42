//! Shield protection discovery.
//!
//! Protections cover resources in other services; the protected resource's
//! ARN becomes the resource ARN and the protection ARN rides along as a
//! tag.

use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_config::SdkConfig;
use tokio::sync::Semaphore;

use crate::aws::discovery::{matches_search_tags, ResourceFilter};
use crate::config::api_concurrency;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{DiscoveryJob, Resource};

pub struct ShieldApi {
    client: aws_sdk_shield::Client,
    limit: Semaphore,
}

impl ShieldApi {
    pub fn new(conf: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_shield::Client::new(conf),
            limit: Semaphore::new(api_concurrency("SHIELD_API_CONCURRENCY", 5)),
        }
    }
}

#[async_trait]
impl ResourceFilter for ShieldApi {
    async fn discover_or_filter(
        &self,
        _resources: Vec<Resource>,
        job: &DiscoveryJob,
    ) -> ScrapeResult<Vec<Resource>> {
        let mut pages = self.client.list_protections().into_paginator().send();

        let mut resources = Vec::new();
        loop {
            let page = {
                let _permit = self.limit.acquire().await.expect("semaphore closed");
                pages.next().await
            };
            let Some(page) = page else { break };
            let page = page.map_err(|e| ScrapeError::aws("list_protections", e))?;

            for protection in page.protections() {
                let (Some(resource_arn), Some(protection_arn)) =
                    (protection.resource_arn(), protection.protection_arn())
                else {
                    continue;
                };
                let tags = BTreeMap::from([(
                    "ProtectionArn".to_string(),
                    protection_arn.to_string(),
                )]);
                if !matches_search_tags(&tags, &job.search_tags) {
                    continue;
                }
                resources.push(Resource::new(&job.namespace, resource_arn, tags));
            }
        }

        Ok(resources)
    }
}
