//! Resources, metrics and scheduled fetch tasks.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

/// A discovered AWS resource.
///
/// `mapped` is written exactly once, during associator construction, to
/// guarantee each resource binds to at most one regex bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub namespace: String,
    pub arn: String,
    pub tags: BTreeMap<String, String>,
    pub mapped: bool,
}

impl Resource {
    pub fn new(namespace: &str, arn: &str, tags: BTreeMap<String, String>) -> Self {
        Self {
            namespace: namespace.to_string(),
            arn: arn.to_string(),
            tags,
            mapped: false,
        }
    }

    /// The synthetic resource a metric binds to when nothing else matches.
    pub fn global(namespace: &str) -> Self {
        Self::new(namespace, "global", BTreeMap::new())
    }
}

/// One metric as returned by `ListMetrics`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudwatchMetric {
    pub namespace: String,
    pub name: String,
    pub dimensions: BTreeMap<String, String>,
}

impl CloudwatchMetric {
    pub fn dimension_names(&self) -> BTreeSet<&str> {
        self.dimensions.keys().map(String::as_str).collect()
    }
}

/// Values fetched for one task; `timestamps` and `values` are parallel
/// lists in the order CloudWatch returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloudwatchMetricResult {
    pub timestamps: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
    pub status_code: Option<String>,
    pub messages: Vec<String>,
}

/// Canonical identity of a task, used to de-duplicate and group all
/// statistics of the same logical metric into one message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskSignature {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<(String, String)>,
    pub tags: Vec<(String, String)>,
}

/// A scheduled metric fetch: one (metric, statistic) pair bound to a
/// resource, later populated with its result by the fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudwatchMetricTask {
    pub namespace: String,
    pub metric_name: String,
    pub resource_name: String,
    pub dimensions: BTreeMap<String, String>,
    pub statistic: String,
    pub nil_to_zero: bool,
    pub add_cw_timestamp: bool,
    pub unit: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub result: Option<CloudwatchMetricResult>,
}

impl CloudwatchMetricTask {
    /// The grouping key: sorted dimension and tag pairs under the metric
    /// identity. BTreeMap iteration yields the canonical sort order.
    pub fn signature(&self) -> TaskSignature {
        TaskSignature {
            namespace: self.namespace.clone(),
            metric_name: self.metric_name.clone(),
            dimensions: self
                .dimensions
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            tags: self.tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    /// The key used for this statistic inside the emitted `value` map.
    pub fn stat_shortname(&self) -> String {
        let stat = self.statistic.to_lowercase();
        match stat.as_str() {
            "samplecount" => "count".to_string(),
            "average" => "avg".to_string(),
            "sum" => "sum".to_string(),
            "minimum" => "min".to_string(),
            "maximum" => "max".to_string(),
            _ => stat,
        }
    }

    /// First-returned timestamp as float epoch seconds, if requested and
    /// available.
    pub fn timestamp(&self) -> Option<f64> {
        if !self.add_cw_timestamp {
            return None;
        }
        let first = self.result.as_ref()?.timestamps.first()?;
        Some(first.timestamp_micros() as f64 / 1e6)
    }

    /// Collapse the fetched values into a single number.
    ///
    /// Multiple values only occur when a window spans several periods; Sum
    /// and SampleCount accumulate, Minimum/Maximum take the extreme, and
    /// everything else keeps the first (most recent) value.
    pub fn value(&self) -> Option<f64> {
        let values: &[f64] = self
            .result
            .as_ref()
            .map(|r| r.values.as_slice())
            .unwrap_or(&[]);

        if values.is_empty() {
            return if self.nil_to_zero { Some(0.0) } else { None };
        }

        if values.len() == 1
            || !matches!(
                self.statistic.as_str(),
                "Sum" | "Minimum" | "Maximum" | "SampleCount"
            )
        {
            return Some(values[0]);
        }

        Some(match self.statistic.as_str() {
            "Sum" | "SampleCount" => values.iter().sum(),
            "Minimum" => values.iter().copied().fold(f64::INFINITY, f64::min),
            _ => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// Per (namespace, metric name) scrape counts, aggregated by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricStats {
    pub namespace: String,
    pub name: String,
    pub count: usize,
}
