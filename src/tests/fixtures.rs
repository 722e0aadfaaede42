//! Shared fixture builders for scenario tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::DateTime;

use crate::catalog;
use crate::models::{
    CloudwatchMetric, CloudwatchMetricResult, CloudwatchMetricTask, DiscoveryJob, MetricRequest,
    Resource,
};

/// A discovery job for a catalogue service with everything else defaulted.
pub fn discovery_job(service: &str) -> DiscoveryJob {
    let entry = catalog::lookup(service).unwrap();
    DiscoveryJob {
        namespace: entry.namespace.clone(),
        metrics: Vec::new(),
        regions: Vec::new(),
        roles: Vec::new(),
        custom_tags: BTreeMap::new(),
        search_tags: HashMap::new(),
        search_dimensions: HashMap::new(),
        dimensions_exact: false,
        recently_active_only: true,
        linked_accounts: false,
        dimension_regexps: entry.dimension_regexps.clone(),
        resource_type_filters: entry.resource_type_filters.clone(),
        exported_tags: BTreeSet::new(),
    }
}

pub fn metric_request(name: &str, stats: &[&str]) -> MetricRequest {
    MetricRequest {
        name: name.to_string(),
        stats: stats.iter().map(|s| s.to_string()).collect(),
        period: 60,
        length: 60,
        delay: 0,
        nil_to_zero: false,
        add_cw_timestamp: true,
        unit: None,
        search_dimensions: HashMap::new(),
        merge_dimensions: true,
        dimensions_exact: None,
    }
}

pub fn resource(namespace: &str, arn: &str, tags: &[(&str, &str)]) -> Resource {
    Resource::new(
        namespace,
        arn,
        tags.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

pub fn metric(namespace: &str, name: &str, dimensions: &[(&str, &str)]) -> CloudwatchMetric {
    CloudwatchMetric {
        namespace: namespace.to_string(),
        name: name.to_string(),
        dimensions: dimensions
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

/// Attach a fetched result to a task, as the fetcher would.
pub fn with_result(
    mut task: CloudwatchMetricTask,
    values: &[f64],
    timestamps: &[i64],
) -> CloudwatchMetricTask {
    task.result = Some(CloudwatchMetricResult {
        values: values.to_vec(),
        timestamps: timestamps
            .iter()
            .map(|secs| DateTime::from_timestamp(*secs, 0).unwrap())
            .collect(),
        status_code: Some("Complete".to_string()),
        messages: Vec::new(),
    });
    task
}
