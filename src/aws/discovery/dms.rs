//! DMS resource filter.
//!
//! CloudWatch dimensions for DMS carry the replication instance identifier,
//! which does not appear in the tagged ARNs. The filter maps every
//! replication instance and task ARN to its instance identifier, then
//! rewrites each input resource's ARN by appending `/<instance-id>`.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::SdkConfig;
use tokio::sync::Semaphore;

use crate::aws::discovery::ResourceFilter;
use crate::config::api_concurrency;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{DiscoveryJob, Resource};

pub struct DmsApi {
    client: aws_sdk_databasemigration::Client,
    limit: Semaphore,
}

impl DmsApi {
    pub fn new(conf: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_databasemigration::Client::new(conf),
            limit: Semaphore::new(api_concurrency("DMS_API_CONCURRENCY", 5)),
        }
    }

    async fn instance_ids_by_arn(&self) -> ScrapeResult<HashMap<String, String>> {
        let mut instance_ids = HashMap::new();

        let mut pages = self
            .client
            .describe_replication_instances()
            .into_paginator()
            .send();
        loop {
            let page = {
                let _permit = self.limit.acquire().await.expect("semaphore closed");
                pages.next().await
            };
            let Some(page) = page else { break };
            let page = page.map_err(|e| ScrapeError::aws("describe_replication_instances", e))?;
            for instance in page.replication_instances() {
                if let (Some(arn), Some(id)) = (
                    instance.replication_instance_arn(),
                    instance.replication_instance_identifier(),
                ) {
                    instance_ids.insert(arn.to_string(), id.to_string());
                }
            }
        }

        let mut pages = self
            .client
            .describe_replication_tasks()
            .into_paginator()
            .send();
        loop {
            let page = {
                let _permit = self.limit.acquire().await.expect("semaphore closed");
                pages.next().await
            };
            let Some(page) = page else { break };
            let page = page.map_err(|e| ScrapeError::aws("describe_replication_tasks", e))?;
            for task in page.replication_tasks() {
                let instance_id = task
                    .replication_instance_arn()
                    .and_then(|arn| instance_ids.get(arn))
                    .filter(|id| !id.is_empty())
                    .cloned();
                if let (Some(task_arn), Some(id)) = (task.replication_task_arn(), instance_id) {
                    instance_ids.insert(task_arn.to_string(), id);
                }
            }
        }

        Ok(instance_ids)
    }
}

#[async_trait]
impl ResourceFilter for DmsApi {
    async fn discover_or_filter(
        &self,
        resources: Vec<Resource>,
        _job: &DiscoveryJob,
    ) -> ScrapeResult<Vec<Resource>> {
        if resources.is_empty() {
            return Ok(Vec::new());
        }

        let instance_ids = self.instance_ids_by_arn().await?;

        let mut resources = resources;
        for resource in resources.iter_mut() {
            if let Some(id) = instance_ids.get(&resource.arn).filter(|id| !id.is_empty()) {
                resource.arn = format!("{}/{}", resource.arn, id);
            }
        }

        Ok(resources)
    }
}
