//! Metric to resource association.
//!
//! The associator indexes discovered resources by the dimension values a
//! service's ARN regexes extract, then answers lookups for each enumerated
//! metric. Buckets are ordered most-specific first and each resource binds
//! to at most one bucket.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{CloudwatchMetric, Resource};

static MQ_BROKER_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-[0-9]+$").expect("invalid broker suffix pattern"));

/// Outcome of a metric lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Association {
    /// The metric's dimension values identify this resource.
    Bound(Resource),
    /// A bucket covered the metric's dimension names but no resource keyed
    /// to its values; the metric is known but unbindable and must be
    /// skipped.
    Unbindable,
    /// No bucket covers the metric; callers fall back to the synthetic
    /// `global` resource.
    Unmatched,
}

struct Bucket {
    dimension_names: BTreeSet<String>,
    by_signature: HashMap<Vec<(String, String)>, Resource>,
}

/// Lookup engine from dimension signatures to resources.
pub struct Associator {
    buckets: Vec<Bucket>,
    resources: Vec<Resource>,
}

impl Associator {
    /// Index `resources` under the ordered ARN regexes.
    ///
    /// For each regex in turn, every not-yet-mapped resource whose ARN the
    /// regex matches is inserted into that regex's bucket under its sorted
    /// capture pairs. Buckets are then sorted by descending dimension-name
    /// arity so lookups prefer the most specific match.
    pub fn new(dimension_regexps: &[Regex], resources: Vec<Resource>) -> Self {
        let mut resources = resources;
        let mut buckets: Vec<Bucket> = Vec::new();

        for regexp in dimension_regexps {
            let mut dimension_names: Option<BTreeSet<String>> = None;
            let mut by_signature = HashMap::new();

            for resource in resources.iter_mut() {
                if resource.mapped {
                    continue;
                }
                let Some(captures) = regexp.captures(&resource.arn) else {
                    continue;
                };
                let mut signature: Vec<(String, String)> = regexp
                    .capture_names()
                    .flatten()
                    .map(|name| {
                        let value = captures
                            .name(name)
                            .map(|m| m.as_str().to_string())
                            .unwrap_or_default();
                        (name.to_string(), value)
                    })
                    .collect();
                signature.sort();

                resource.mapped = true;
                if dimension_names.is_none() {
                    dimension_names = Some(signature.iter().map(|(k, _)| k.clone()).collect());
                }
                // Duplicate signatures are last-write-wins.
                by_signature.insert(signature, resource.clone());
            }

            match dimension_names {
                Some(names) if !names.is_empty() => buckets.push(Bucket {
                    dimension_names: names,
                    by_signature,
                }),
                _ => {}
            }
        }

        buckets.sort_by(|a, b| b.dimension_names.len().cmp(&a.dimension_names.len()));

        Self { buckets, resources }
    }

    /// An associator that never binds; every metric falls back to the
    /// synthetic `global` resource.
    pub fn noop() -> Self {
        Self {
            buckets: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// The resources this associator was built from, with their `mapped`
    /// flags settled.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Look up the resource a metric belongs to.
    ///
    /// A bucket is considered when its dimension names are a subset of the
    /// metric's. Within a bucket the lookup first applies the fix-up rules
    /// to the signature; when nothing was actually fixed a miss is final,
    /// otherwise the raw signature is retried once.
    pub fn associate(&self, metric: &CloudwatchMetric) -> Association {
        if metric.dimensions.is_empty() {
            return Association::Unmatched;
        }

        let metric_names = metric.dimension_names();
        let mut skip = false;

        for bucket in &self.buckets {
            if !bucket
                .dimension_names
                .iter()
                .all(|name| metric_names.contains(name.as_str()))
            {
                continue;
            }
            skip = true;

            for try_fix in [true, false] {
                let (signature, fixed) = lookup_signature(
                    &metric.namespace,
                    &metric.dimensions,
                    &bucket.dimension_names,
                    try_fix,
                );
                if let Some(resource) = bucket.by_signature.get(&signature) {
                    return Association::Bound(resource.clone());
                }
                if !fixed {
                    return Association::Unbindable;
                }
            }
        }

        if skip {
            Association::Unbindable
        } else {
            Association::Unmatched
        }
    }
}

/// Build the signature used for a bucket lookup, optionally applying the
/// namespace fix-up rules. Returns whether any value was actually changed.
fn lookup_signature(
    namespace: &str,
    dimensions: &BTreeMap<String, String>,
    keys: &BTreeSet<String>,
    try_fix: bool,
) -> (Vec<(String, String)>, bool) {
    let raw_value = |key: &String| dimensions.get(key).cloned().unwrap_or_default();

    if !try_fix || !matches!(namespace, "AWS/AmazonMQ" | "AWS/SageMaker") {
        let signature = keys.iter().map(|k| (k.clone(), raw_value(k))).collect();
        return (signature, false);
    }

    let mut was_fixed = false;
    let mut signature = Vec::with_capacity(keys.len());
    for key in keys {
        let (value, fixed) = fix_dimension(namespace, key, &raw_value(key));
        was_fixed = was_fixed || fixed;
        signature.push((key.clone(), value));
    }
    (signature, was_fixed)
}

/// Namespace-specific dimension value normalisation.
///
/// Fix-ups apply only to lookup signatures; indexed keys keep the raw
/// regex-captured values.
fn fix_dimension(namespace: &str, dimension: &str, value: &str) -> (String, bool) {
    if namespace == "AWS/AmazonMQ" && dimension == "Broker" {
        let fixed = MQ_BROKER_SUFFIX.replace(value, "").into_owned();
        let changed = fixed != value;
        return (fixed, changed);
    }

    if namespace == "AWS/SageMaker"
        && matches!(dimension, "EndpointName" | "InferenceComponentName")
    {
        return (value.to_lowercase(), true);
    }

    (value.to_string(), false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(namespace: &str, arn: &str) -> Resource {
        Resource::new(namespace, arn, BTreeMap::new())
    }

    fn metric(namespace: &str, name: &str, dims: &[(&str, &str)]) -> CloudwatchMetric {
        CloudwatchMetric {
            namespace: namespace.to_string(),
            name: name.to_string(),
            dimensions: dims
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn regexes(patterns: &[&str]) -> Vec<Regex> {
        patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
    }

    #[test]
    fn binds_each_resource_once() {
        // Both patterns match the ALB ARN; only the first in order binds.
        let rex = regexes(&[
            ":loadbalancer/(?P<LoadBalancer>.+)$",
            "(?P<LoadBalancer>app/.+)$",
        ]);
        let associator = Associator::new(
            &rex,
            vec![resource(
                "AWS/ApplicationELB",
                "arn:aws:elasticloadbalancing:eu-west-2:123:loadbalancer/app/my-lb/50dc6c",
            )],
        );

        assert!(associator.resources().iter().all(|r| r.mapped));
        let found = associator.associate(&metric(
            "AWS/ApplicationELB",
            "RequestCount",
            &[("LoadBalancer", "app/my-lb/50dc6c")],
        ));
        assert!(matches!(found, Association::Bound(r) if r.arn.ends_with("app/my-lb/50dc6c")));
    }

    #[test]
    fn unmatched_resources_stay_unmapped() {
        let rex = regexes(&[":loadbalancer/(?P<LoadBalancer>.+)$"]);
        let associator = Associator::new(
            &rex,
            vec![
                resource("AWS/ApplicationELB", "arn:aws:ec2:eu-west-2:123:instance/i-1"),
                resource(
                    "AWS/ApplicationELB",
                    "arn:aws:elasticloadbalancing:eu-west-2:123:loadbalancer/app/lb/1",
                ),
            ],
        );
        let mapped: Vec<bool> = associator.resources().iter().map(|r| r.mapped).collect();
        assert_eq!(mapped, vec![false, true]);
    }

    #[test]
    fn prefers_more_specific_buckets() {
        // The service/cluster regex captures two names, the cluster one
        // captures one; the two-dimension metric must hit the former.
        let rex = regexes(&[
            ":cluster/(?P<ClusterName>[^/]+)$",
            ":service/(?P<ClusterName>[^/]+)/(?P<ServiceName>[^/]+)$",
        ]);
        let associator = Associator::new(
            &rex,
            vec![
                resource("AWS/ECS", "arn:aws:ecs:eu-west-2:123:cluster/prod"),
                resource("AWS/ECS", "arn:aws:ecs:eu-west-2:123:service/prod/web"),
            ],
        );

        let found = associator.associate(&metric(
            "AWS/ECS",
            "CPUUtilization",
            &[("ClusterName", "prod"), ("ServiceName", "web")],
        ));
        assert!(matches!(found, Association::Bound(r) if r.arn.ends_with("service/prod/web")));
    }

    #[test]
    fn metric_without_dimensions_is_unmatched() {
        let associator = Associator::noop();
        assert_eq!(
            associator.associate(&metric("AWS/S3", "NumberOfObjects", &[])),
            Association::Unmatched
        );
    }

    #[test]
    fn known_but_unbindable_metric_is_skipped() {
        let rex = regexes(&["(?P<BucketName>[^:]+)$"]);
        let associator = Associator::new(
            &rex,
            vec![resource("AWS/S3", "arn:aws:s3:::bucket-a")],
        );
        let found = associator.associate(&metric(
            "AWS/S3",
            "NumberOfObjects",
            &[("BucketName", "bucket-b"), ("StorageType", "AllStorageTypes")],
        ));
        assert_eq!(found, Association::Unbindable);
    }

    #[test]
    fn mq_broker_suffix_is_stripped_for_lookup() {
        let rex = regexes(&["broker:(?P<Broker>[^:]+)"]);
        let associator = Associator::new(
            &rex,
            vec![resource("AWS/AmazonMQ", "arn:aws:mq:eu-west-2:123:broker:foo:b-1234")],
        );
        let found = associator.associate(&metric(
            "AWS/AmazonMQ",
            "CpuUtilization",
            &[("Broker", "foo-2")],
        ));
        assert!(matches!(found, Association::Bound(r) if r.arn.contains("broker:foo")));
    }

    #[test]
    fn sagemaker_endpoint_binds_case_insensitively() {
        // The resource captures the raw name; CloudWatch reports it
        // lowercased. The indexed key must stay raw for the second, raw
        // lookup phase to work against raw metric values too.
        let rex = regexes(&[":endpoint/(?P<EndpointName>[^/]+)$"]);
        let associator = Associator::new(
            &rex,
            vec![resource(
                "AWS/SageMaker",
                "arn:aws:sagemaker:eu-west-2:123:endpoint/myep",
            )],
        );
        let found = associator.associate(&metric(
            "AWS/SageMaker",
            "Invocations",
            &[("EndpointName", "MyEP")],
        ));
        assert!(matches!(found, Association::Bound(_)));
    }

    #[test]
    fn sagemaker_raw_retry_finds_mixed_case_resources() {
        let rex = regexes(&[":endpoint/(?P<EndpointName>[^/]+)$"]);
        let associator = Associator::new(
            &rex,
            vec![resource(
                "AWS/SageMaker",
                "arn:aws:sagemaker:eu-west-2:123:endpoint/MyEP",
            )],
        );
        // Fixed (lowercased) lookup misses, raw lookup hits.
        let found = associator.associate(&metric(
            "AWS/SageMaker",
            "Invocations",
            &[("EndpointName", "MyEP")],
        ));
        assert!(matches!(found, Association::Bound(_)));
    }
}
