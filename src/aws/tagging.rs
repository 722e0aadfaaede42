//! Default resource discovery through the Resource Groups Tagging API.

use std::collections::BTreeMap;

use aws_config::SdkConfig;
use aws_sdk_resourcegroupstagging::types::TagFilter;
use aws_sdk_resourcegroupstagging::Client;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::aws::discovery::matches_search_tags;
use crate::config::api_concurrency;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{DiscoveryJob, Resource};

pub struct TaggingApi {
    client: Client,
    limit: Semaphore,
}

impl TaggingApi {
    pub fn new(conf: &SdkConfig) -> Self {
        Self {
            client: Client::new(conf),
            limit: Semaphore::new(api_concurrency("TAGGING_API_CONCURRENCY", 5)),
        }
    }

    /// Discover resources matching the job's resource-type filters.
    ///
    /// Search-tag keys narrow the server-side query; the value regexes are
    /// applied client side with a missing tag read as the empty string.
    pub async fn resources(&self, job: &DiscoveryJob) -> ScrapeResult<Vec<Resource>> {
        let mut request = self.client.get_resources();
        for filter in &job.resource_type_filters {
            request = request.resource_type_filters(filter);
        }
        for key in job.search_tags.keys() {
            request = request.tag_filters(TagFilter::builder().key(key).build());
        }

        let mut pages = request.into_paginator().send();
        let mut resources = Vec::new();
        loop {
            let page = {
                let _permit = self.limit.acquire().await.expect("semaphore closed");
                pages.next().await
            };
            let Some(page) = page else { break };
            let page = page.map_err(|e| ScrapeError::aws("get_resources", e))?;

            for mapping in page.resource_tag_mapping_list() {
                let Some(arn) = mapping.resource_arn() else {
                    continue;
                };
                let tags: BTreeMap<String, String> = mapping
                    .tags()
                    .iter()
                    .map(|t| (t.key().to_string(), t.value().to_string()))
                    .collect();
                if !matches_search_tags(&tags, &job.search_tags) {
                    continue;
                }
                resources.push(Resource::new(&job.namespace, arn, tags));
            }
        }

        debug!(
            namespace = %job.namespace,
            count = resources.len(),
            "discovered tagged resources"
        );
        Ok(resources)
    }
}
