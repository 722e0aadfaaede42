//! Namespace-specific resource discovery.
//!
//! Most namespaces discover through the tagging API alone; the namespaces
//! registered in `ClientKind::discovery_filter` additionally run (or wholly
//! replace) discovery with a service-specific enumerator. Every enumerator
//! applies the same search-tag predicate as the tagging path.

mod apigateway;
mod autoscaling;
mod dms;
mod ec2;
mod prometheus;
mod shield;
mod storagegateway;

use std::collections::BTreeMap;
use std::collections::HashMap;

use async_trait::async_trait;
use regex::Regex;

use crate::error::ScrapeResult;
use crate::models::{DiscoveryJob, Resource};

pub use apigateway::ApiGatewayFilter;
pub use autoscaling::AutoScalingApi;
pub use dms::DmsApi;
pub use ec2::Ec2Api;
pub use prometheus::PrometheusApi;
pub use shield::ShieldApi;
pub use storagegateway::StorageGatewayApi;

/// A namespace-specific discovery strategy: given the resources the tagging
/// API found (possibly none), produce the job's final resource list.
#[async_trait]
pub trait ResourceFilter: Send + Sync {
    async fn discover_or_filter(
        &self,
        resources: Vec<Resource>,
        job: &DiscoveryJob,
    ) -> ScrapeResult<Vec<Resource>>;
}

/// True when every search-tag regex matches its resource tag value, with a
/// missing tag read as the empty string.
pub(crate) fn matches_search_tags(
    tags: &BTreeMap<String, String>,
    search_tags: &HashMap<String, Regex>,
) -> bool {
    search_tags.iter().all(|(key, pattern)| {
        let value = tags.get(key).map(String::as_str).unwrap_or("");
        match_at_start(pattern, value)
    })
}

/// Match anchored at the start of the value, like Python's `re.match`.
pub(crate) fn match_at_start(pattern: &Regex, value: &str) -> bool {
    pattern.find(value).is_some_and(|m| m.start() == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn search(pairs: &[(&str, &str)]) -> HashMap<String, Regex> {
        pairs
            .iter()
            .map(|(k, p)| (k.to_string(), Regex::new(p).unwrap()))
            .collect()
    }

    #[test]
    fn empty_search_tags_accept_everything() {
        assert!(matches_search_tags(&tags(&[]), &search(&[])));
    }

    #[test]
    fn prefix_pattern_accepts_matching_project() {
        let search_tags = search(&[("project", "^od.*")]);
        assert!(matches_search_tags(&tags(&[("project", "odin")]), &search_tags));
        assert!(!matches_search_tags(&tags(&[("project", "thor")]), &search_tags));
    }

    #[test]
    fn missing_tag_matches_as_empty_string() {
        assert!(!matches_search_tags(&tags(&[]), &search(&[("project", "another")])));
        assert!(matches_search_tags(&tags(&[]), &search(&[("project", ".*")])));
    }

    #[test]
    fn match_is_anchored_at_the_start() {
        let pattern = Regex::new("din").unwrap();
        assert!(!match_at_start(&pattern, "odin"));
        assert!(match_at_start(&pattern, "dinner"));
    }
}
