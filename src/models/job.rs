//! Scrape job definitions.
//!
//! A `DiscoveryJob` finds resources and their metrics dynamically; a
//! `StaticJob` scrapes a fixed dimension set. Both fan out over the
//! cartesian product of their regions and roles.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use regex::Regex;

/// Catalogue entry for one AWS service.
///
/// The dimension regexes are ordered: the associator binds resources to the
/// first regex whose search over the ARN succeeds, and the named capture
/// groups become CloudWatch dimension names.
#[derive(Debug, Clone)]
pub struct Service {
    pub alias: String,
    pub namespace: String,
    pub resource_type_filters: Vec<String>,
    pub dimension_regexps: Vec<Regex>,
}

/// One requested metric within a job.
#[derive(Debug, Clone)]
pub struct MetricRequest {
    pub name: String,
    pub stats: Vec<String>,
    pub period: i64,
    pub length: i64,
    pub delay: i64,
    pub nil_to_zero: bool,
    pub add_cw_timestamp: bool,
    pub unit: Option<String>,
    pub search_dimensions: HashMap<String, Regex>,
    pub merge_dimensions: bool,
    pub dimensions_exact: Option<bool>,
}

/// A scrape unit combining a catalogue entry with the user's settings.
#[derive(Debug, Clone)]
pub struct DiscoveryJob {
    pub namespace: String,
    pub metrics: Vec<MetricRequest>,
    pub regions: Vec<String>,
    pub roles: Vec<String>,
    pub custom_tags: BTreeMap<String, String>,
    pub search_tags: HashMap<String, Regex>,
    pub search_dimensions: HashMap<String, Regex>,
    pub dimensions_exact: bool,
    pub recently_active_only: bool,
    pub linked_accounts: bool,
    // from the service catalogue
    pub dimension_regexps: Vec<Regex>,
    pub resource_type_filters: Vec<String>,
    // from the global config
    pub exported_tags: BTreeSet<String>,
}

impl DiscoveryJob {
    /// The (region, role) shards this job participates in.
    pub fn shard_pairs(&self, default_region: &str) -> Vec<(String, Option<String>)> {
        shard_pairs(&self.regions, &self.roles, default_region)
    }
}

/// A fixed `{namespace, dimensions}` scrape target.
#[derive(Debug, Clone)]
pub struct StaticJob {
    pub namespace: String,
    pub metrics: Vec<MetricRequest>,
    pub regions: Vec<String>,
    pub roles: Vec<String>,
    pub custom_tags: BTreeMap<String, String>,
    pub dimensions: BTreeMap<String, String>,
}

impl StaticJob {
    pub fn shard_pairs(&self, default_region: &str) -> Vec<(String, Option<String>)> {
        shard_pairs(&self.regions, &self.roles, default_region)
    }
}

/// Cartesian product of regions and roles, defaulting a missing region to
/// `default_region` and a missing role to `None`.
pub fn shard_pairs(
    regions: &[String],
    roles: &[String],
    default_region: &str,
) -> Vec<(String, Option<String>)> {
    let regions: Vec<&str> = if regions.is_empty() {
        vec![default_region]
    } else {
        regions.iter().map(String::as_str).collect()
    };
    let roles: Vec<Option<&str>> = if roles.is_empty() {
        vec![None]
    } else {
        roles.iter().map(|r| Some(r.as_str())).collect()
    };

    let mut pairs = Vec::with_capacity(regions.len() * roles.len());
    for region in &regions {
        for role in &roles {
            pairs.push((region.to_string(), role.map(str::to_string)));
        }
    }
    pairs
}
