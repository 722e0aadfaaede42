//! EC2-backed discovery for spot fleets and transit gateways.
//!
//! Neither has usable ARNs through the tagging API: spot fleet metrics are
//! keyed by the fleet request id, and transit gateway metrics by the
//! `{TransitGatewayId}/{TransitGatewayAttachmentId}` pair, so both are
//! enumerated directly and the ids stand in for ARNs.

use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_config::SdkConfig;
use tokio::sync::Semaphore;

use crate::aws::discovery::{matches_search_tags, ResourceFilter};
use crate::config::api_concurrency;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{DiscoveryJob, Resource};

pub struct Ec2Api {
    client: aws_sdk_ec2::Client,
    limit: Semaphore,
}

impl Ec2Api {
    pub fn new(conf: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_ec2::Client::new(conf),
            limit: Semaphore::new(api_concurrency("EC2_API_CONCURRENCY", 5)),
        }
    }

    async fn spot_fleet_resources(&self, job: &DiscoveryJob) -> ScrapeResult<Vec<Resource>> {
        let mut pages = self
            .client
            .describe_spot_fleet_requests()
            .into_paginator()
            .send();

        let mut resources = Vec::new();
        loop {
            let page = {
                let _permit = self.limit.acquire().await.expect("semaphore closed");
                pages.next().await
            };
            let Some(page) = page else { break };
            let page = page.map_err(|e| ScrapeError::aws("describe_spot_fleet_requests", e))?;

            for config in page.spot_fleet_request_configs() {
                let tags: BTreeMap<String, String> = config
                    .tags()
                    .iter()
                    .filter_map(|t| Some((t.key()?.to_string(), t.value()?.to_string())))
                    .collect();
                if !matches_search_tags(&tags, &job.search_tags) {
                    continue;
                }
                let Some(id) = config.spot_fleet_request_id() else {
                    continue;
                };
                resources.push(Resource::new(&job.namespace, id, tags));
            }
        }

        Ok(resources)
    }

    async fn transit_gateway_resources(&self, job: &DiscoveryJob) -> ScrapeResult<Vec<Resource>> {
        let mut pages = self
            .client
            .describe_transit_gateway_attachments()
            .into_paginator()
            .send();

        let mut resources = Vec::new();
        loop {
            let page = {
                let _permit = self.limit.acquire().await.expect("semaphore closed");
                pages.next().await
            };
            let Some(page) = page else { break };
            let page =
                page.map_err(|e| ScrapeError::aws("describe_transit_gateway_attachments", e))?;

            for attachment in page.transit_gateway_attachments() {
                let tags: BTreeMap<String, String> = attachment
                    .tags()
                    .iter()
                    .filter_map(|t| Some((t.key()?.to_string(), t.value()?.to_string())))
                    .collect();
                if !matches_search_tags(&tags, &job.search_tags) {
                    continue;
                }
                let (Some(gateway), Some(attachment_id)) = (
                    attachment.transit_gateway_id(),
                    attachment.transit_gateway_attachment_id(),
                ) else {
                    continue;
                };
                resources.push(Resource::new(
                    &job.namespace,
                    &format!("{gateway}/{attachment_id}"),
                    tags,
                ));
            }
        }

        Ok(resources)
    }
}

#[async_trait]
impl ResourceFilter for Ec2Api {
    async fn discover_or_filter(
        &self,
        resources: Vec<Resource>,
        job: &DiscoveryJob,
    ) -> ScrapeResult<Vec<Resource>> {
        match job.namespace.as_str() {
            "AWS/EC2Spot" => self.spot_fleet_resources(job).await,
            "AWS/TransitGateway" => self.transit_gateway_resources(job).await,
            _ => Ok(resources),
        }
    }
}
