//! Amazon Managed Prometheus workspace discovery.

use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_config::SdkConfig;
use tokio::sync::Semaphore;

use crate::aws::discovery::{matches_search_tags, ResourceFilter};
use crate::config::api_concurrency;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{DiscoveryJob, Resource};

pub struct PrometheusApi {
    client: aws_sdk_amp::Client,
    limit: Semaphore,
}

impl PrometheusApi {
    pub fn new(conf: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_amp::Client::new(conf),
            limit: Semaphore::new(api_concurrency("PROMETHEUS_API_CONCURRENCY", 5)),
        }
    }
}

#[async_trait]
impl ResourceFilter for PrometheusApi {
    async fn discover_or_filter(
        &self,
        _resources: Vec<Resource>,
        job: &DiscoveryJob,
    ) -> ScrapeResult<Vec<Resource>> {
        let mut pages = self.client.list_workspaces().into_paginator().send();

        let mut resources = Vec::new();
        loop {
            let page = {
                let _permit = self.limit.acquire().await.expect("semaphore closed");
                pages.next().await
            };
            let Some(page) = page else { break };
            let page = page.map_err(|e| ScrapeError::aws("list_workspaces", e))?;

            for workspace in page.workspaces() {
                let tags: BTreeMap<String, String> = workspace
                    .tags()
                    .map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default();
                if !matches_search_tags(&tags, &job.search_tags) {
                    continue;
                }
                resources.push(Resource::new(&job.namespace, workspace.arn(), tags));
            }
        }

        Ok(resources)
    }
}
