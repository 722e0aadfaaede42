//! Auto Scaling group discovery.
//!
//! ASGs are not covered by the tagging API; discovery enumerates the groups
//! and builds resources from their ARNs and inline tags.

use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_config::SdkConfig;
use tokio::sync::Semaphore;

use crate::aws::discovery::{matches_search_tags, ResourceFilter};
use crate::config::api_concurrency;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{DiscoveryJob, Resource};

pub struct AutoScalingApi {
    client: aws_sdk_autoscaling::Client,
    limit: Semaphore,
}

impl AutoScalingApi {
    pub fn new(conf: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_autoscaling::Client::new(conf),
            limit: Semaphore::new(api_concurrency("AUTOSCALING_API_CONCURRENCY", 5)),
        }
    }
}

#[async_trait]
impl ResourceFilter for AutoScalingApi {
    async fn discover_or_filter(
        &self,
        _resources: Vec<Resource>,
        job: &DiscoveryJob,
    ) -> ScrapeResult<Vec<Resource>> {
        let mut pages = self
            .client
            .describe_auto_scaling_groups()
            .into_paginator()
            .send();

        let mut resources = Vec::new();
        loop {
            let page = {
                let _permit = self.limit.acquire().await.expect("semaphore closed");
                pages.next().await
            };
            let Some(page) = page else { break };
            let page = page.map_err(|e| ScrapeError::aws("describe_auto_scaling_groups", e))?;

            for group in page.auto_scaling_groups() {
                let tags: BTreeMap<String, String> = group
                    .tags()
                    .iter()
                    .filter_map(|t| Some((t.key()?.to_string(), t.value()?.to_string())))
                    .collect();
                if !matches_search_tags(&tags, &job.search_tags) {
                    continue;
                }
                let Some(arn) = group.auto_scaling_group_arn() else {
                    continue;
                };
                resources.push(Resource::new(&job.namespace, arn, tags));
            }
        }

        Ok(resources)
    }
}
