//! Message grouping and construction.
//!
//! Tasks sharing a signature are all the statistics of one logical metric;
//! they collapse into a single message whose `value` map is keyed by stat
//! shortname.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{CloudwatchMetricTask, TaskSignature};

/// Shard-level labels seeded into every message. Empty account lookups are
/// dropped rather than serialised as empty strings.
#[derive(Debug, Clone, Default)]
pub struct ContextLabels {
    pub region: String,
    pub account_id: Option<String>,
    pub account_alias: Option<String>,
}

impl ContextLabels {
    pub fn new(region: String, account_id: String, account_alias: String) -> Self {
        Self {
            region,
            account_id: Some(account_id).filter(|id| !id.is_empty()),
            account_alias: Some(account_alias).filter(|alias| !alias.is_empty()),
        }
    }
}

/// The JSON document sent to the queue, one per logical metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricMessage {
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_alias: Option<String>,
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub value: BTreeMap<String, Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

/// Group tasks by signature, preserving first-seen order.
pub fn group_by_signature(
    tasks: impl IntoIterator<Item = CloudwatchMetricTask>,
) -> Vec<Vec<CloudwatchMetricTask>> {
    let mut index: HashMap<TaskSignature, usize> = HashMap::new();
    let mut groups: Vec<Vec<CloudwatchMetricTask>> = Vec::new();
    for task in tasks {
        let slot = *index.entry(task.signature()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(task);
    }
    groups
}

/// Collapse one signature group into a message.
///
/// Identity fields are identical across the group by construction. The
/// message timestamp is the most recent of the group's first-returned
/// timestamps.
pub fn build_message(
    labels: &ContextLabels,
    tasks: &[CloudwatchMetricTask],
) -> ScrapeResult<MetricMessage> {
    let mut message = MetricMessage {
        region: labels.region.clone(),
        account_id: labels.account_id.clone(),
        account_alias: labels.account_alias.clone(),
        namespace: String::new(),
        metric_name: String::new(),
        dimensions: BTreeMap::new(),
        tags: BTreeMap::new(),
        value: BTreeMap::new(),
        timestamp: None,
    };

    for task in tasks {
        message.namespace = task.namespace.clone();
        message.metric_name = task.metric_name.clone();
        message.tags = task.tags.clone();
        message.dimensions = task.dimensions.clone();

        let stat = task.stat_shortname();
        if message.value.contains_key(&stat) {
            return Err(ScrapeError::DuplicateStat { stat });
        }
        message.value.insert(stat, task.value());

        let Some(timestamp) = task.timestamp() else {
            continue;
        };
        if message.timestamp.map_or(true, |existing| timestamp > existing) {
            message.timestamp = Some(timestamp);
        }
    }

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    use crate::models::CloudwatchMetricResult;

    fn labels() -> ContextLabels {
        ContextLabels::new(
            "eu-west-2".to_string(),
            "123456789012".to_string(),
            String::new(),
        )
    }

    fn task(statistic: &str, values: Vec<f64>, ts: Option<i64>) -> CloudwatchMetricTask {
        CloudwatchMetricTask {
            namespace: "AWS/ApplicationELB".to_string(),
            metric_name: "RequestCount".to_string(),
            resource_name: "arn:aws:elasticloadbalancing:::loadbalancer/app/lb/1".to_string(),
            dimensions: BTreeMap::from([(
                "LoadBalancer".to_string(),
                "app/lb/1".to_string(),
            )]),
            statistic: statistic.to_string(),
            nil_to_zero: false,
            add_cw_timestamp: true,
            unit: None,
            tags: BTreeMap::new(),
            result: Some(CloudwatchMetricResult {
                values,
                timestamps: ts
                    .map(|secs| vec![DateTime::from_timestamp(secs, 0).unwrap()])
                    .unwrap_or_default(),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn stats_of_one_metric_collapse_into_one_message() {
        let tasks = vec![
            task("Sum", vec![10.0], Some(1_700_000_000)),
            task("SampleCount", vec![1.0], Some(1_700_000_060)),
            task("Maximum", vec![10.0], Some(1_700_000_000)),
        ];
        let groups = group_by_signature(tasks);
        assert_eq!(groups.len(), 1);

        let message = build_message(&labels(), &groups[0]).unwrap();
        assert_eq!(message.metric_name, "RequestCount");
        assert_eq!(message.value.get("sum"), Some(&Some(10.0)));
        assert_eq!(message.value.get("count"), Some(&Some(1.0)));
        assert_eq!(message.value.get("max"), Some(&Some(10.0)));
        // most recent first-timestamp across the group
        assert_eq!(message.timestamp, Some(1_700_000_060.0));
        assert_eq!(message.account_id.as_deref(), Some("123456789012"));
        assert_eq!(message.account_alias, None);
    }

    #[test]
    fn duplicate_shortname_is_an_error() {
        let tasks = vec![
            task("Sum", vec![1.0], None),
            task("sum", vec![2.0], None),
        ];
        assert!(matches!(
            build_message(&labels(), &tasks),
            Err(ScrapeError::DuplicateStat { .. })
        ));
    }

    #[test]
    fn nil_to_zero_controls_empty_values() {
        let mut empty = task("Average", vec![], None);
        let message = build_message(&labels(), &[empty.clone()]).unwrap();
        assert_eq!(message.value.get("avg"), Some(&None));

        empty.nil_to_zero = true;
        let message = build_message(&labels(), &[empty]).unwrap();
        assert_eq!(message.value.get("avg"), Some(&Some(0.0)));
    }

    #[test]
    fn different_dimensions_group_separately() {
        let mut other = task("Sum", vec![5.0], None);
        other
            .dimensions
            .insert("LoadBalancer".to_string(), "app/lb/2".to_string());
        let groups = group_by_signature(vec![task("Sum", vec![1.0], None), other]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn serialised_message_drops_absent_labels() {
        let message = build_message(
            &ContextLabels::new("eu-west-2".to_string(), String::new(), String::new()),
            &[task("Sum", vec![1.0], None)],
        )
        .unwrap();
        let json = serde_json::to_value(&message).unwrap();
        assert!(json.get("account_id").is_none());
        assert!(json.get("account_alias").is_none());
        assert!(json.get("timestamp").is_none());
        assert_eq!(json["region"], "eu-west-2");
        assert_eq!(json["value"]["sum"], 1.0);
    }
}
