//! Shard scheduling and the per-shard scrape pipeline.
//!
//! Jobs fan out over the cartesian product of their regions and roles; one
//! `RegionRoleExecutor` runs per distinct (region, role) pair. Shards run
//! fully in parallel with join-all semantics: every shard is awaited, the
//! first error surfaces afterwards.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::join_all;
use regex::Regex;
use tracing::{error, info};

use crate::associator::{Association, Associator};
use crate::aws::discovery::{match_at_start, ResourceFilter};
use crate::aws::factory::{ClientFactory, ClientKind};
use crate::aws::queue::QueueSender;
use crate::aws::{CloudWatchApi, StsApi, SupportAppApi, TaggingApi};
use crate::config::ScrapeConfig;
use crate::emitter::{build_message, group_by_signature, ContextLabels, MetricMessage};
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{
    CloudwatchMetric, CloudwatchMetricTask, DiscoveryJob, MetricRequest, MetricStats, Resource,
    StaticJob,
};
use crate::utils::time::scrape_window;

/// A (region, role) execution context.
pub type ShardKey = (String, Option<String>);

/// Buckets of tasks keyed by (period, delay, length).
pub type TaskBuckets = HashMap<(i64, i64, i64), Vec<CloudwatchMetricTask>>;

/// Top-level scheduler owning one executor per shard.
pub struct Executor {
    shards: Vec<RegionRoleExecutor>,
}

impl Executor {
    pub fn new(
        config: Arc<ScrapeConfig>,
        factory: Arc<ClientFactory>,
        queue: Arc<QueueSender>,
    ) -> Self {
        let mut discovery: HashMap<ShardKey, Vec<DiscoveryJob>> = HashMap::new();
        for job in &config.discovery_jobs {
            for key in job.shard_pairs(&config.default_region) {
                discovery.entry(key).or_default().push(job.clone());
            }
        }

        let mut statics: HashMap<ShardKey, Vec<StaticJob>> = HashMap::new();
        for job in &config.static_jobs {
            for key in job.shard_pairs(&config.default_region) {
                statics.entry(key).or_default().push(job.clone());
            }
        }

        let keys: BTreeSet<ShardKey> = discovery.keys().chain(statics.keys()).cloned().collect();
        let shards = keys
            .into_iter()
            .map(|key| {
                let discovery_jobs = discovery.remove(&key).unwrap_or_default();
                let static_jobs = statics.remove(&key).unwrap_or_default();
                let (region, role) = key;
                RegionRoleExecutor {
                    region,
                    role,
                    discovery_jobs,
                    static_jobs,
                    factory: factory.clone(),
                    queue: queue.clone(),
                }
            })
            .collect();

        Self { shards }
    }

    /// Run the full pipeline on every shard. All shards are awaited; the
    /// first error is returned after the others complete.
    pub async fn scrape_and_emit(&self) -> ScrapeResult<HashMap<ShardKey, Vec<MetricStats>>> {
        let results = join_all(self.shards.iter().map(|shard| async move {
            let stats = shard.scrape_and_emit().await;
            ((shard.region.clone(), shard.role.clone()), stats)
        }))
        .await;

        let mut out = HashMap::with_capacity(results.len());
        let mut first_error = None;
        for (key, result) in results {
            match result {
                Ok(stats) => {
                    out.insert(key, stats);
                }
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(out),
        }
    }

    /// Discovery-only entry point: enumerate tasks without fetching values
    /// or emitting messages. Useful for dry runs.
    pub async fn discover_metrics(&self) -> ScrapeResult<HashMap<ShardKey, TaskBuckets>> {
        let results = join_all(self.shards.iter().map(|shard| async move {
            let buckets = shard.discover_metrics().await;
            ((shard.region.clone(), shard.role.clone()), buckets)
        }))
        .await;

        let mut out = HashMap::with_capacity(results.len());
        for (key, result) in results {
            let shard_buckets = result?;
            let mut merged: TaskBuckets = HashMap::new();
            for buckets in shard_buckets {
                for (bucket_key, tasks) in buckets {
                    merged.entry(bucket_key).or_default().extend(tasks);
                }
            }
            out.insert(key, merged);
        }
        Ok(out)
    }
}

/// Clients resolved for one shard.
struct ShardClients {
    cloudwatch: Arc<CloudWatchApi>,
    sts: Arc<StsApi>,
    support: Arc<SupportAppApi>,
    tagging: Option<Arc<TaggingApi>>,
    filters: HashMap<ClientKind, Arc<dyn ResourceFilter>>,
}

/// Runs discovery, fetch and emission for one (region, role) pair.
pub struct RegionRoleExecutor {
    pub region: String,
    pub role: Option<String>,
    discovery_jobs: Vec<DiscoveryJob>,
    static_jobs: Vec<StaticJob>,
    factory: Arc<ClientFactory>,
    queue: Arc<QueueSender>,
}

impl RegionRoleExecutor {
    async fn ensure_clients(&self) -> ScrapeResult<ShardClients> {
        let role = self.role.as_deref();
        let cloudwatch = self.factory.cloudwatch(&self.region, role).await?;
        let sts = self.factory.sts(&self.region, role).await?;
        let support = self.factory.support_app(&self.region, role).await?;

        let mut tagging = None;
        let mut filters = HashMap::new();
        for kind in ClientFactory::required_discovery_clients(&self.discovery_jobs) {
            if kind == ClientKind::Tagging {
                tagging = Some(self.factory.tagging(&self.region, role).await?);
            } else {
                filters.insert(
                    kind,
                    self.factory.resource_filter(kind, &self.region, role).await?,
                );
            }
        }

        Ok(ShardClients {
            cloudwatch,
            sts,
            support,
            tagging,
            filters,
        })
    }

    pub async fn scrape_and_emit(&self) -> ScrapeResult<Vec<MetricStats>> {
        info!(region = %self.region, role = ?self.role, "scraping shard");
        let result = self.scrape_inner().await;
        if let Err(e) = &result {
            error!(
                region = %self.region,
                role = ?self.role,
                category = e.category(),
                error = %e,
                "shard scrape failed"
            );
        }
        result
    }

    async fn scrape_inner(&self) -> ScrapeResult<Vec<MetricStats>> {
        let clients = self.ensure_clients().await?;

        let account_id = clients.sts.account_id().await;
        let account_alias = clients.support.account_alias().await;
        let labels = ContextLabels::new(self.region.clone(), account_id, account_alias);

        let mut stats: HashMap<(String, String), usize> = HashMap::new();

        let batched = self.batched_discovery_metrics(&clients).await?;
        let passes = join_all(batched.into_iter().map(
            |((period, delay), (length, tasks))| {
                let clients = &clients;
                let labels = &labels;
                async move {
                    self.fetch_and_emit(clients, labels, period, delay, length, tasks)
                        .await
                }
            },
        ))
        .await;
        for pass in passes {
            for stat in pass? {
                *stats.entry((stat.namespace, stat.name)).or_default() += stat.count;
            }
        }

        if !self.static_jobs.is_empty() {
            for stat in self.static_metrics_emit(&clients, &labels).await? {
                *stats.entry((stat.namespace, stat.name)).or_default() += stat.count;
            }
        }

        Ok(stats
            .into_iter()
            .map(|((namespace, name), count)| MetricStats {
                namespace,
                name,
                count,
            })
            .collect())
    }

    /// Run all discovery jobs concurrently and merge their (period, delay,
    /// length) buckets into (period, delay) buckets, keeping the longest
    /// length per key.
    async fn batched_discovery_metrics(
        &self,
        clients: &ShardClients,
    ) -> ScrapeResult<HashMap<(i64, i64), (i64, Vec<CloudwatchMetricTask>)>> {
        let mut merged: HashMap<(i64, i64), (i64, Vec<CloudwatchMetricTask>)> = HashMap::new();
        if self.discovery_jobs.is_empty() {
            return Ok(merged);
        }

        let results = join_all(
            self.discovery_jobs
                .iter()
                .map(|job| self.run_discovery_job(clients, job)),
        )
        .await;

        for result in results {
            for ((period, delay, length), tasks) in result? {
                let entry = merged
                    .entry((period, delay))
                    .or_insert_with(|| (length, Vec::new()));
                entry.1.extend(tasks);
                if entry.0 < length {
                    entry.0 = length;
                }
            }
        }
        Ok(merged)
    }

    pub async fn discover_metrics(&self) -> ScrapeResult<Vec<TaskBuckets>> {
        if self.discovery_jobs.is_empty() {
            return Ok(Vec::new());
        }
        let clients = self.ensure_clients().await?;
        join_all(
            self.discovery_jobs
                .iter()
                .map(|job| self.run_discovery_job(&clients, job)),
        )
        .await
        .into_iter()
        .collect()
    }

    /// Discover a job's resources, enumerate its metrics and schedule one
    /// task per (metric, statistic).
    async fn run_discovery_job(
        &self,
        clients: &ShardClients,
        job: &DiscoveryJob,
    ) -> ScrapeResult<TaskBuckets> {
        let mut resources = Vec::new();
        if !job.resource_type_filters.is_empty() {
            let tagging = clients.tagging.as_ref().ok_or_else(|| {
                ScrapeError::config(format!("tagging client missing for {}", job.namespace))
            })?;
            resources = tagging.resources(job).await?;
        }

        if let Some(kind) = ClientKind::discovery_filter(&job.namespace) {
            let filter = clients.filters.get(&kind).ok_or_else(|| {
                ScrapeError::config(format!("discovery client missing for {}", job.namespace))
            })?;
            resources = filter.discover_or_filter(resources, job).await?;
        }

        let associator = if !resources.is_empty() && !job.dimension_regexps.is_empty() {
            Associator::new(&job.dimension_regexps, resources)
        } else {
            Associator::noop()
        };

        let mut buckets: TaskBuckets = HashMap::new();
        for request in &job.metrics {
            let metrics = clients.cloudwatch.list_metrics(&request.name, job).await?;
            for metric in &metrics {
                let Some(tasks) = tasks_for_metric(job, request, metric, &associator) else {
                    continue;
                };
                buckets
                    .entry((request.period, request.delay, request.length))
                    .or_default()
                    .extend(tasks);
            }
        }

        Ok(buckets)
    }

    /// One fetch/emit pass over a (period, delay) bucket.
    async fn fetch_and_emit(
        &self,
        clients: &ShardClients,
        labels: &ContextLabels,
        period: i64,
        delay: i64,
        length: i64,
        tasks: Vec<CloudwatchMetricTask>,
    ) -> ScrapeResult<Vec<MetricStats>> {
        let (start, end) = scrape_window(period, length, delay);
        let tasks = clients
            .cloudwatch
            .get_metric_data(period, start, end, tasks)
            .await?;

        let mut stats: HashMap<(String, String), usize> = HashMap::new();
        let populated: Vec<CloudwatchMetricTask> = tasks
            .into_iter()
            .filter(|task| {
                task.result
                    .as_ref()
                    .is_some_and(|result| !result.values.is_empty())
            })
            .collect();
        for task in &populated {
            *stats
                .entry((task.namespace.clone(), task.metric_name.clone()))
                .or_default() += 1;
        }

        let messages: Vec<MetricMessage> = group_by_signature(populated)
            .iter()
            .map(|group| build_message(labels, group))
            .collect::<ScrapeResult<_>>()?;
        if !messages.is_empty() {
            self.queue.send_messages(&messages).await?;
        }

        Ok(into_metric_stats(stats))
    }

    /// Fetch and emit all static jobs; one message per (job, metric).
    async fn static_metrics_emit(
        &self,
        clients: &ShardClients,
        labels: &ContextLabels,
    ) -> ScrapeResult<Vec<MetricStats>> {
        let fetches = self.static_jobs.iter().flat_map(|job| {
            job.metrics
                .iter()
                .map(move |metric| clients.cloudwatch.get_metric_statistics(metric, job))
        });
        let results = join_all(fetches).await;

        let mut stats: HashMap<(String, String), usize> = HashMap::new();
        let mut messages = Vec::with_capacity(results.len());
        for result in results {
            let tasks = result?;
            for task in &tasks {
                *stats
                    .entry((task.namespace.clone(), task.metric_name.clone()))
                    .or_default() += 1;
            }
            messages.push(build_message(labels, &tasks)?);
        }

        if !messages.is_empty() {
            self.queue.send_messages(&messages).await?;
        }

        Ok(into_metric_stats(stats))
    }
}

fn into_metric_stats(stats: HashMap<(String, String), usize>) -> Vec<MetricStats> {
    stats
        .into_iter()
        .map(|((namespace, name), count)| MetricStats {
            namespace,
            name,
            count,
        })
        .collect()
}

/// Decide whether a listed metric is scraped and, if so, produce its tasks.
///
/// Filters apply in order: effective exact/search dimension settings with
/// metric-level overrides, the dimension regex predicates (missing value =
/// empty string), then the associator. An unbindable metric is dropped; an
/// unmatched one binds to the synthetic `global` resource. Tags are the
/// job's exported tag keys projected from the resource, overlaid with the
/// job's custom tags.
pub(crate) fn tasks_for_metric(
    job: &DiscoveryJob,
    request: &MetricRequest,
    metric: &CloudwatchMetric,
    associator: &Associator,
) -> Option<Vec<CloudwatchMetricTask>> {
    let exact_dimensions = request.dimensions_exact.unwrap_or(job.dimensions_exact);

    let mut search_dimensions: HashMap<&str, &Regex> = job
        .search_dimensions
        .iter()
        .map(|(name, pattern)| (name.as_str(), pattern))
        .collect();
    if !request.search_dimensions.is_empty() {
        if !request.merge_dimensions {
            search_dimensions.clear();
        }
        for (name, pattern) in &request.search_dimensions {
            search_dimensions.insert(name, pattern);
        }
    }

    if exact_dimensions {
        let search_names: BTreeSet<&str> = search_dimensions.keys().copied().collect();
        if search_names != metric.dimension_names() {
            return None;
        }
    }

    let matches_all = search_dimensions.iter().all(|(name, pattern)| {
        let value = metric.dimensions.get(*name).map(String::as_str).unwrap_or("");
        match_at_start(pattern, value)
    });
    if !matches_all {
        return None;
    }

    let resource = match associator.associate(metric) {
        Association::Unbindable => return None,
        Association::Bound(resource) => resource,
        Association::Unmatched => Resource::global(&job.namespace),
    };

    let mut tags: std::collections::BTreeMap<String, String> = job
        .exported_tags
        .iter()
        .map(|key| {
            (
                key.clone(),
                resource.tags.get(key).cloned().unwrap_or_default(),
            )
        })
        .collect();
    for (key, value) in &job.custom_tags {
        tags.insert(key.clone(), value.clone());
    }

    Some(
        request
            .stats
            .iter()
            .map(|stat| CloudwatchMetricTask {
                namespace: job.namespace.clone(),
                metric_name: request.name.clone(),
                resource_name: resource.arn.clone(),
                dimensions: metric.dimensions.clone(),
                statistic: stat.clone(),
                nil_to_zero: request.nil_to_zero,
                add_cw_timestamp: request.add_cw_timestamp,
                unit: request.unit.clone(),
                tags: tags.clone(),
                result: None,
            })
            .collect(),
    )
}
