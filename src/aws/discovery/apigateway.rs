//! API Gateway resource filter.
//!
//! Tagged REST API ARNs end in an opaque id, but the `ApiName` dimension
//! carries the API's display name; the filter rewrites the trailing id
//! segment accordingly. v2 HTTP/WebSocket API ARNs already use the id
//! CloudWatch reports and pass through unchanged. Tagged resources matching
//! neither shape are dropped.

use async_trait::async_trait;
use aws_config::SdkConfig;
use tokio::sync::Semaphore;

use crate::aws::discovery::ResourceFilter;
use crate::config::api_concurrency;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{DiscoveryJob, Resource};

pub struct ApiGatewayFilter {
    v1: aws_sdk_apigateway::Client,
    v2: aws_sdk_apigatewayv2::Client,
    v1_limit: Semaphore,
    v2_limit: Semaphore,
}

impl ApiGatewayFilter {
    pub fn new(conf: &SdkConfig) -> Self {
        Self {
            v1: aws_sdk_apigateway::Client::new(conf),
            v2: aws_sdk_apigatewayv2::Client::new(conf),
            v1_limit: Semaphore::new(api_concurrency("APIGATEWAY_API_CONCURRENCY", 5)),
            v2_limit: Semaphore::new(api_concurrency("APIGATEWAYV2_API_CONCURRENCY", 5)),
        }
    }

    /// REST APIs as (id, name) pairs.
    async fn rest_apis(&self) -> ScrapeResult<Vec<(String, String)>> {
        let mut pages = self.v1.get_rest_apis().into_paginator().send();
        let mut apis = Vec::new();
        loop {
            let page = {
                let _permit = self.v1_limit.acquire().await.expect("semaphore closed");
                pages.next().await
            };
            let Some(page) = page else { break };
            let page = page.map_err(|e| ScrapeError::aws("get_rest_apis", e))?;
            for item in page.items() {
                if let (Some(id), Some(name)) = (item.id(), item.name()) {
                    apis.push((id.to_string(), name.to_string()));
                }
            }
        }
        Ok(apis)
    }

    /// v2 HTTP/WebSocket API ids.
    async fn http_api_ids(&self) -> ScrapeResult<Vec<String>> {
        let mut pages = self.v2.get_apis().into_paginator().send();
        let mut ids = Vec::new();
        loop {
            let page = {
                let _permit = self.v2_limit.acquire().await.expect("semaphore closed");
                pages.next().await
            };
            let Some(page) = page else { break };
            let page = page.map_err(|e| ScrapeError::aws("get_apis", e))?;
            for item in page.items() {
                if let Some(id) = item.api_id() {
                    ids.push(id.to_string());
                }
            }
        }
        Ok(ids)
    }
}

#[async_trait]
impl ResourceFilter for ApiGatewayFilter {
    async fn discover_or_filter(
        &self,
        resources: Vec<Resource>,
        _job: &DiscoveryJob,
    ) -> ScrapeResult<Vec<Resource>> {
        if resources.is_empty() {
            return Ok(resources);
        }

        let rest_apis = self.rest_apis().await?;
        let http_api_ids = self.http_api_ids().await?;

        let mut out = Vec::with_capacity(resources.len());
        for mut resource in resources {
            let mut keep = false;

            for (id, name) in &rest_apis {
                if !resource.arn.ends_with(&format!("/restapis/{id}")) {
                    continue;
                }
                // Replace only the trailing id segment; the id may occur
                // elsewhere in the ARN.
                let prefix = resource.arn.len() - id.len();
                resource.arn = format!("{}{}", &resource.arn[..prefix], name);
                keep = true;
                break;
            }

            if !keep {
                keep = http_api_ids
                    .iter()
                    .any(|id| resource.arn.ends_with(&format!("/apis/{id}")));
            }

            if keep {
                out.push(resource);
            }
        }

        Ok(out)
    }
}
