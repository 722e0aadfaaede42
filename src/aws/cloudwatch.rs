//! CloudWatch API wrapper.
//!
//! Wraps `ListMetrics`, `GetMetricData` and `GetMetricStatistics`. Every
//! paginated call acquires the client's concurrency semaphore around each
//! page fetch.

use std::collections::BTreeMap;

use aws_config::SdkConfig;
use aws_sdk_cloudwatch::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudwatch::types::{
    Datapoint, Dimension, Metric, MetricDataQuery, MetricStat, RecentlyActive, Statistic,
};
use aws_sdk_cloudwatch::Client;
use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::config::api_concurrency;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{
    CloudwatchMetric, CloudwatchMetricResult, CloudwatchMetricTask, DiscoveryJob, MetricRequest,
    StaticJob,
};
use crate::utils::time::scrape_window;

/// CloudWatch caps a GetMetricData call at 500 queries; scale back to 300.
const MAX_DATA_QUERIES: usize = 300;

const STANDARD_STATS: &[&str] = &["SampleCount", "Average", "Sum", "Minimum", "Maximum"];

pub struct CloudWatchApi {
    client: Client,
    limit: Semaphore,
}

impl CloudWatchApi {
    pub fn new(conf: &SdkConfig) -> Self {
        Self {
            client: Client::new(conf),
            limit: Semaphore::new(api_concurrency("METRICS_API_CONCURRENCY", 5)),
        }
    }

    /// Page `ListMetrics` for one metric name under a job's namespace.
    pub async fn list_metrics(
        &self,
        metric_name: &str,
        job: &DiscoveryJob,
    ) -> ScrapeResult<Vec<CloudwatchMetric>> {
        let mut request = self
            .client
            .list_metrics()
            .namespace(&job.namespace)
            .metric_name(metric_name)
            .include_linked_accounts(job.linked_accounts);
        if job.recently_active_only {
            request = request.recently_active(RecentlyActive::from("PT3H"));
        }

        let mut pages = request.into_paginator().send();
        let mut metrics = Vec::new();
        loop {
            let page = {
                let _permit = self.limit.acquire().await.expect("semaphore closed");
                pages.next().await
            };
            let Some(page) = page else { break };
            let page = page.map_err(|e| ScrapeError::aws("list_metrics", e))?;

            for metric in page.metrics() {
                let dimensions: BTreeMap<String, String> = metric
                    .dimensions()
                    .iter()
                    .filter_map(|d| Some((d.name()?.to_string(), d.value()?.to_string())))
                    .collect();
                metrics.push(CloudwatchMetric {
                    namespace: metric.namespace().unwrap_or(&job.namespace).to_string(),
                    name: metric.metric_name().unwrap_or(metric_name).to_string(),
                    dimensions,
                });
            }
        }

        debug!(
            namespace = %job.namespace,
            metric_name = %metric_name,
            count = metrics.len(),
            "listed metrics"
        );
        Ok(metrics)
    }

    /// Fetch values for a bucket of tasks sharing one period and window.
    ///
    /// Tasks are split into near-equal batches of at most 300 queries; the
    /// per-batch query id `m<index>` is a pure index into the batch. Paged
    /// results append to a task's existing result so CloudWatch's own value
    /// ordering is preserved.
    pub async fn get_metric_data(
        &self,
        period: i64,
        start: i64,
        end: i64,
        tasks: Vec<CloudwatchMetricTask>,
    ) -> ScrapeResult<Vec<CloudwatchMetricTask>> {
        let size = batch_size(tasks.len());
        let mut remaining = tasks;
        let mut done = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let rest = remaining.split_off(remaining.len().min(size));
            let mut batch = remaining;
            remaining = rest;

            let mut queries = Vec::with_capacity(batch.len());
            for (ix, task) in batch.iter().enumerate() {
                let mut metric = Metric::builder()
                    .namespace(&task.namespace)
                    .metric_name(&task.metric_name);
                for (name, value) in &task.dimensions {
                    metric = metric.dimensions(Dimension::builder().name(name).value(value).build());
                }
                let stat = MetricStat::builder()
                    .metric(metric.build())
                    .period(period as i32)
                    .stat(&task.statistic)
                    .build();
                queries.push(
                    MetricDataQuery::builder()
                        .id(format!("m{ix}"))
                        .metric_stat(stat)
                        .return_data(true)
                        .build(),
                );
            }

            let request = self
                .client
                .get_metric_data()
                .start_time(AwsDateTime::from_secs(start))
                .end_time(AwsDateTime::from_secs(end))
                .set_metric_data_queries(Some(queries));

            let mut pages = request.into_paginator().send();
            loop {
                let page = {
                    let _permit = self.limit.acquire().await.expect("semaphore closed");
                    pages.next().await
                };
                let Some(page) = page else { break };
                let page = page.map_err(|e| ScrapeError::aws("get_metric_data", e))?;

                for result in page.metric_data_results() {
                    let Some(ix) = result
                        .id()
                        .and_then(|id| id.strip_prefix('m'))
                        .and_then(|ix| ix.parse::<usize>().ok())
                    else {
                        continue;
                    };
                    let Some(task) = batch.get_mut(ix) else {
                        continue;
                    };

                    let timestamps = result.timestamps().iter().map(to_utc);
                    match task.result.as_mut() {
                        Some(existing) => {
                            existing.timestamps.extend(timestamps);
                            existing.values.extend_from_slice(result.values());
                        }
                        None => {
                            task.result = Some(CloudwatchMetricResult {
                                timestamps: timestamps.collect(),
                                values: result.values().to_vec(),
                                status_code: result.status_code().map(|s| s.as_str().to_string()),
                                messages: result
                                    .messages()
                                    .iter()
                                    .filter_map(|m| m.value().map(str::to_string))
                                    .collect(),
                            });
                        }
                    }
                }
            }

            done.append(&mut batch);
        }

        Ok(done)
    }

    /// The static-job path: one `GetMetricStatistics` call per metric,
    /// collapsed into one task per requested statistic.
    pub async fn get_metric_statistics(
        &self,
        request: &MetricRequest,
        job: &StaticJob,
    ) -> ScrapeResult<Vec<CloudwatchMetricTask>> {
        let (start, end) = scrape_window(request.period, request.length, request.delay);

        let mut call = self
            .client
            .get_metric_statistics()
            .namespace(&job.namespace)
            .metric_name(&request.name)
            .start_time(AwsDateTime::from_secs(start))
            .end_time(AwsDateTime::from_secs(end))
            .period(request.period as i32);
        for (name, value) in &job.dimensions {
            call = call.dimensions(Dimension::builder().name(name).value(value).build());
        }
        for stat in &request.stats {
            if STANDARD_STATS.contains(&stat.as_str()) {
                call = call.statistics(Statistic::from(stat.as_str()));
            } else {
                call = call.extended_statistics(stat);
            }
        }

        let response = {
            let _permit = self.limit.acquire().await.expect("semaphore closed");
            call.send().await
        }
        .map_err(|e| ScrapeError::aws("get_metric_statistics", e))?;

        let mut tasks: Vec<CloudwatchMetricTask> = request
            .stats
            .iter()
            .map(|stat| CloudwatchMetricTask {
                namespace: job.namespace.clone(),
                metric_name: request.name.clone(),
                resource_name: "static".to_string(),
                dimensions: job.dimensions.clone(),
                statistic: stat.clone(),
                nil_to_zero: request.nil_to_zero,
                add_cw_timestamp: request.add_cw_timestamp,
                unit: request.unit.clone(),
                tags: BTreeMap::new(),
                result: Some(CloudwatchMetricResult::default()),
            })
            .collect();

        for datapoint in response.datapoints() {
            let unit = datapoint.unit().map(|u| u.as_str().to_string());
            let Some(timestamp) = datapoint.timestamp().map(to_utc) else {
                continue;
            };

            for (ix, stat) in request.stats.iter().enumerate() {
                let Some(value) = datapoint_value(datapoint, stat) else {
                    continue;
                };
                let task = &mut tasks[ix];
                if let Some(unit) = &unit {
                    // CloudWatch's reported unit wins over the config hint.
                    if task.unit.as_deref() != Some(unit) {
                        task.unit = Some(unit.clone());
                    }
                }
                if let Some(result) = task.result.as_mut() {
                    result.values.push(value);
                    result.timestamps.push(timestamp);
                }
            }
        }

        Ok(tasks)
    }
}

fn to_utc(ts: &AwsDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos()).unwrap_or_default()
}

fn datapoint_value(datapoint: &Datapoint, stat: &str) -> Option<f64> {
    match stat {
        "SampleCount" => datapoint.sample_count(),
        "Average" => datapoint.average(),
        "Sum" => datapoint.sum(),
        "Minimum" => datapoint.minimum(),
        "Maximum" => datapoint.maximum(),
        _ => datapoint
            .extended_statistics()
            .and_then(|stats| stats.get(stat).copied()),
    }
}

/// Batch size for GetMetricData: at most 300 queries per call, with all
/// batches of a bucket sized near-equally.
pub(crate) fn batch_size(total: usize) -> usize {
    if total <= MAX_DATA_QUERIES {
        return MAX_DATA_QUERIES;
    }
    let batches = (total + MAX_DATA_QUERIES - 1) / MAX_DATA_QUERIES;
    (total + batches - 1) / batches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_counts(total: usize) -> Vec<usize> {
        let size = batch_size(total);
        let mut counts = Vec::new();
        let mut left = total;
        while left > 0 {
            let take = left.min(size);
            counts.push(take);
            left -= take;
        }
        counts
    }

    #[test]
    fn up_to_300_tasks_fit_one_batch() {
        assert_eq!(chunk_counts(1), vec![1]);
        assert_eq!(chunk_counts(300), vec![300]);
    }

    #[test]
    fn overflow_splits_into_near_equal_batches() {
        assert_eq!(chunk_counts(301), vec![151, 150]);
        assert_eq!(chunk_counts(650), vec![217, 217, 216]);
        assert_eq!(chunk_counts(900), vec![300, 300, 300]);
    }

    #[test]
    fn every_batch_stays_within_the_cap() {
        for total in [301, 599, 600, 601, 1234, 5000] {
            for count in chunk_counts(total) {
                assert!(count <= MAX_DATA_QUERIES);
            }
            assert_eq!(chunk_counts(total).iter().sum::<usize>(), total);
        }
    }
}
