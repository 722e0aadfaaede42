//! Storage Gateway discovery.
//!
//! CloudWatch identifies gateways by `{GatewayId}/{GatewayName}` rather
//! than ARN; tags are fetched per gateway since the listing carries none.

use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_config::SdkConfig;
use tokio::sync::Semaphore;

use crate::aws::discovery::{matches_search_tags, ResourceFilter};
use crate::config::api_concurrency;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{DiscoveryJob, Resource};

pub struct StorageGatewayApi {
    client: aws_sdk_storagegateway::Client,
    limit: Semaphore,
}

impl StorageGatewayApi {
    pub fn new(conf: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_storagegateway::Client::new(conf),
            limit: Semaphore::new(api_concurrency("STORAGEGATEWAY_API_CONCURRENCY", 5)),
        }
    }

    async fn gateway_tags(&self, arn: &str) -> ScrapeResult<BTreeMap<String, String>> {
        let response = {
            let _permit = self.limit.acquire().await.expect("semaphore closed");
            self.client
                .list_tags_for_resource()
                .resource_arn(arn)
                .send()
                .await
        }
        .map_err(|e| ScrapeError::aws("list_tags_for_resource", e))?;

        Ok(response
            .tags()
            .iter()
            .map(|t| (t.key().to_string(), t.value().to_string()))
            .collect())
    }
}

#[async_trait]
impl ResourceFilter for StorageGatewayApi {
    async fn discover_or_filter(
        &self,
        _resources: Vec<Resource>,
        job: &DiscoveryJob,
    ) -> ScrapeResult<Vec<Resource>> {
        let mut pages = self.client.list_gateways().into_paginator().send();

        let mut resources = Vec::new();
        loop {
            let page = {
                let _permit = self.limit.acquire().await.expect("semaphore closed");
                pages.next().await
            };
            let Some(page) = page else { break };
            let page = page.map_err(|e| ScrapeError::aws("list_gateways", e))?;

            for gateway in page.gateways() {
                let (Some(arn), Some(id), Some(name)) = (
                    gateway.gateway_arn(),
                    gateway.gateway_id(),
                    gateway.gateway_name(),
                ) else {
                    continue;
                };

                let tags = self.gateway_tags(arn).await?;
                if !matches_search_tags(&tags, &job.search_tags) {
                    continue;
                }
                resources.push(Resource::new(&job.namespace, &format!("{id}/{name}"), tags));
            }
        }

        Ok(resources)
    }
}
